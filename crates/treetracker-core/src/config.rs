//! Configuration module
//!
//! Capture, media, and identity settings loaded from the environment (with
//! `.env` support).

use std::env;
use std::time::Duration;

use crate::models::PositionOptions;
use crate::validation::MediaValidator;

const LOCATION_TIMEOUT_MS: u64 = 10_000;
const LOCATION_MAX_AGE_MS: u64 = 0;
const MAX_IMAGE_SIZE_MB: u64 = 10;
const DEFAULT_IMAGE_CONTENT_TYPES: &str = "image/jpeg,image/png,image/gif,image/webp,image/heic";
const DEFAULT_REGISTRATION_API_URL: &str = "http://localhost:4000";

/// Identity provider endpoints
#[derive(Clone, Debug, Default)]
pub struct IdentityConfig {
    pub keycloak_base_url: Option<String>,
    pub keycloak_realm: Option<String>,
    pub keycloak_client_id: Option<String>,
    pub registration_api_url: String,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub environment: String,
    pub location_timeout_ms: u64,
    pub location_high_accuracy: bool,
    pub location_max_age_ms: u64,
    pub max_image_size_bytes: u64,
    pub allowed_image_content_types: Vec<String>,
    pub identity: IdentityConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            location_timeout_ms: LOCATION_TIMEOUT_MS,
            location_high_accuracy: true,
            location_max_age_ms: LOCATION_MAX_AGE_MS,
            max_image_size_bytes: MAX_IMAGE_SIZE_MB * 1024 * 1024,
            allowed_image_content_types: split_list(DEFAULT_IMAGE_CONTENT_TYPES),
            identity: IdentityConfig {
                registration_api_url: DEFAULT_REGISTRATION_API_URL.to_string(),
                ..IdentityConfig::default()
            },
        }
    }
}

impl IdentityConfig {
    /// OpenID Connect token endpoint for the configured realm
    pub fn token_endpoint(&self) -> Option<String> {
        let base = self.keycloak_base_url.as_deref()?;
        let realm = self.keycloak_realm.as_deref()?;
        Some(format!(
            "{}/realms/{}/protocol/openid-connect/token",
            base.trim_end_matches('/'),
            realm
        ))
    }

    /// Sign-up endpoint of the registration service
    pub fn registration_endpoint(&self) -> String {
        format!(
            "{}/api/register",
            self.registration_api_url.trim_end_matches('/')
        )
    }
}

/// Convert a `MAX_IMAGE_SIZE_MB` value to bytes.
fn image_size_bytes(raw: &str) -> Result<u64, anyhow::Error> {
    let megabytes: u64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("MAX_IMAGE_SIZE_MB must be a valid number"))?;
    megabytes
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("MAX_IMAGE_SIZE_MB is too large"))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl CaptureConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let max_image_size_bytes = image_size_bytes(
            &env::var("MAX_IMAGE_SIZE_MB").unwrap_or_else(|_| MAX_IMAGE_SIZE_MB.to_string()),
        )?;

        let config = CaptureConfig {
            environment,
            location_timeout_ms: env::var("LOCATION_TIMEOUT_MS")
                .unwrap_or_else(|_| LOCATION_TIMEOUT_MS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("LOCATION_TIMEOUT_MS must be a valid number"))?,
            location_high_accuracy: env::var("LOCATION_HIGH_ACCURACY")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            location_max_age_ms: env::var("LOCATION_MAX_AGE_MS")
                .unwrap_or_else(|_| LOCATION_MAX_AGE_MS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("LOCATION_MAX_AGE_MS must be a valid number"))?,
            max_image_size_bytes,
            allowed_image_content_types: split_list(
                &env::var("ALLOWED_IMAGE_CONTENT_TYPES")
                    .unwrap_or_else(|_| DEFAULT_IMAGE_CONTENT_TYPES.to_string()),
            ),
            identity: IdentityConfig {
                keycloak_base_url: env::var("KEYCLOAK_BASE_URL").ok().filter(|s| !s.is_empty()),
                keycloak_realm: env::var("KEYCLOAK_REALM").ok().filter(|s| !s.is_empty()),
                keycloak_client_id: env::var("KEYCLOAK_CLIENT_ID")
                    .ok()
                    .filter(|s| !s.is_empty()),
                registration_api_url: env::var("REGISTRATION_API_URL")
                    .unwrap_or_else(|_| DEFAULT_REGISTRATION_API_URL.to_string()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.location_timeout_ms == 0 {
            return Err(anyhow::anyhow!("LOCATION_TIMEOUT_MS must be greater than zero"));
        }

        if self.location_max_age_ms != 0 {
            return Err(anyhow::anyhow!(
                "LOCATION_MAX_AGE_MS must be 0; cached location fixes are never accepted"
            ));
        }

        if self.allowed_image_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_IMAGE_CONTENT_TYPES must list at least one image type"
            ));
        }

        if let Some(bad) = self
            .allowed_image_content_types
            .iter()
            .find(|ct| !ct.starts_with("image/"))
        {
            return Err(anyhow::anyhow!(
                "ALLOWED_IMAGE_CONTENT_TYPES may only contain image types, found {}",
                bad
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: self.location_high_accuracy,
            timeout: Duration::from_millis(self.location_timeout_ms),
            maximum_age: Duration::from_millis(self.location_max_age_ms),
        }
    }

    pub fn media_validator(&self) -> MediaValidator {
        MediaValidator::new(
            self.max_image_size_bytes,
            self.allowed_image_content_types.clone(),
        )
    }

    pub fn token_endpoint(&self) -> Option<String> {
        self.identity.token_endpoint()
    }
}
