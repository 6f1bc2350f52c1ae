use std::path::Path;

/// Reasons a picked file is refused before it reaches the capture
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Not an image: {0}")]
    NotAnImage(String),

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Content type {content_type} does not match extension '{extension}'")]
    ExtensionMismatch {
        extension: String,
        content_type: String,
    },

    #[error("Empty file")]
    EmptyFile,
}

/// Content types expected for a known image extension
fn expected_content_types(extension: &str) -> Option<&'static [&'static str]> {
    let types: &'static [&'static str] = match extension {
        "jpg" | "jpeg" => &["image/jpeg"],
        "png" => &["image/png"],
        "gif" => &["image/gif"],
        "webp" => &["image/webp"],
        "heic" => &["image/heic", "image/heif"],
        "heif" => &["image/heif", "image/heic"],
        "avif" => &["image/avif"],
        "bmp" => &["image/bmp"],
        _ => return None,
    };
    Some(types)
}

/// Guess the declared type of a file from its extension
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    expected_content_types(&extension).map(|types| types[0])
}

/// Validator for images offered by the media picker.
pub struct MediaValidator {
    max_file_size: u64,
    allowed_content_types: Vec<String>,
}

impl MediaValidator {
    pub fn new(max_file_size: u64, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.trim().to_lowercase())
                .collect(),
        }
    }

    pub fn validate_file_size(&self, size: u64) -> Result<(), MediaValidationError> {
        if size == 0 {
            return Err(MediaValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(MediaValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    pub fn validate_content_type(&self, content_type: &str) -> Result<(), MediaValidationError> {
        let normalized = content_type.to_lowercase();

        if !normalized.starts_with("image/") {
            return Err(MediaValidationError::NotAnImage(content_type.to_string()));
        }

        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(MediaValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Reject files whose declared type contradicts their extension.
    /// Unknown or missing extensions are left to the content-type check.
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), MediaValidationError> {
        let Some(extension) = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
        else {
            return Ok(());
        };

        let Some(expected) = expected_content_types(&extension) else {
            tracing::debug!(
                extension = %extension,
                content_type = %content_type,
                "Unknown image extension, skipping Content-Type/extension cross-validation"
            );
            return Ok(());
        };

        let normalized = content_type.to_lowercase();
        if !expected.iter().any(|ct| *ct == normalized) {
            return Err(MediaValidationError::ExtensionMismatch {
                extension,
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    pub fn validate_all(
        &self,
        filename: &str,
        content_type: &str,
        file_size: u64,
    ) -> Result<(), MediaValidationError> {
        self.validate_file_size(file_size)?;
        self.validate_content_type(content_type)?;
        self.validate_extension_content_type_match(filename, content_type)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> MediaValidator {
        MediaValidator::new(
            1024,
            vec!["image/jpeg".to_string(), "IMAGE/PNG".to_string()],
        )
    }

    #[test]
    fn test_accepts_allowed_image() {
        assert!(validator().validate_all("oak.jpg", "image/jpeg", 10).is_ok());
        assert!(validator().validate_all("oak.png", "image/png", 10).is_ok());
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert_eq!(
            validator().validate_all("oak.jpg", "image/jpeg", 0),
            Err(MediaValidationError::EmptyFile)
        );
        assert_eq!(
            validator().validate_all("oak.jpg", "image/jpeg", 2048),
            Err(MediaValidationError::FileTooLarge {
                size: 2048,
                max: 1024
            })
        );
    }

    #[test]
    fn test_rejects_non_image() {
        assert!(matches!(
            validator().validate_all("notes.pdf", "application/pdf", 10),
            Err(MediaValidationError::NotAnImage(_))
        ));
    }

    #[test]
    fn test_rejects_disallowed_image_type() {
        assert!(matches!(
            validator().validate_all("oak.gif", "image/gif", 10),
            Err(MediaValidationError::InvalidContentType { .. })
        ));
    }

    #[test]
    fn test_rejects_extension_mismatch() {
        assert!(matches!(
            validator().validate_all("oak.png", "image/jpeg", 10),
            Err(MediaValidationError::ExtensionMismatch { .. })
        ));
        // camera captures often arrive without an extension
        assert!(validator().validate_all("capture", "image/jpeg", 10).is_ok());
    }

    #[test]
    fn test_content_type_for_path() {
        assert_eq!(
            content_type_for_path(Path::new("/tmp/Oak.JPEG")),
            Some("image/jpeg")
        );
        assert_eq!(
            content_type_for_path(Path::new("photo.heic")),
            Some("image/heic")
        );
        assert_eq!(content_type_for_path(Path::new("notes.txt")), None);
    }
}
