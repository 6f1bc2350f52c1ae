//! Validation modules

pub mod media;
pub mod registration;

pub use media::{content_type_for_path, MediaValidationError, MediaValidator};
pub use registration::{RegistrationError, RegistrationForm, MIN_PASSWORD_LENGTH};
