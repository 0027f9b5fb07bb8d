//! Run configuration.

use crate::error::MapperError;

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "PROXMOX_API_URL";
/// Environment variable holding the API token id (`user@realm!token`).
pub const ENV_TOKEN_ID: &str = "PROXMOX_TOKEN_ID";
/// Environment variable holding the API token secret.
pub const ENV_TOKEN_VALUE: &str = "PROXMOX_TOKEN_VALUE";
/// Environment variable enabling TLS verification when set to `true`.
pub const ENV_VERIFY_SSL: &str = "PROXMOX_VERIFY_SSL";

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for one scan-and-map run, built once at startup.
#[derive(Clone)]
pub struct MapperConfig {
    /// API base URL (e.g., `https://pve1:8006/api2/json`).
    pub api_url: String,
    /// API token id.
    pub token_id: String,
    /// API token secret.
    pub token_value: String,
    /// Verify the server's TLS certificate.
    pub verify_ssl: bool,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Log the mappings that would be written without touching them.
    pub dry_run: bool,
}

impl std::fmt::Debug for MapperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperConfig")
            .field("api_url", &self.api_url)
            .field("token_id", &self.token_id)
            .field("token_value", &"<redacted>")
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout_secs", &self.timeout_secs)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl MapperConfig {
    /// Validate raw settings and build a config.
    ///
    /// `verify_ssl` is the raw flag text: only `true` (any case) enables
    /// verification.
    ///
    /// # Errors
    /// Returns [`MapperError::Config`] naming every required setting that is
    /// missing or blank.
    pub fn from_parts(
        api_url: &str,
        token_id: &str,
        token_value: &str,
        verify_ssl: &str,
    ) -> Result<Self, MapperError> {
        let api_url = api_url.trim();
        let token_id = token_id.trim();
        let token_value = token_value.trim();

        let missing: Vec<&str> = [
            (ENV_API_URL, api_url),
            (ENV_TOKEN_ID, token_id),
            (ENV_TOKEN_VALUE, token_value),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(MapperError::Config(format!(
                "required environment variables are not set: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            api_url: api_url.to_string(),
            token_id: token_id.to_string(),
            token_value: token_value.to_string(),
            verify_ssl: parse_verify_ssl(verify_ssl),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            dry_run: false,
        })
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

fn parse_verify_ssl(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_valid() {
        let config = MapperConfig::from_parts(
            " https://pve1:8006/api2/json ",
            "root@pam!mapper",
            "secret",
            "TRUE",
        )
        .unwrap();

        assert_eq!(config.api_url, "https://pve1:8006/api2/json");
        assert!(config.verify_ssl);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_verify_ssl_defaults_off() {
        for raw in ["", "false", "yes", "1"] {
            let config = MapperConfig::from_parts("https://pve", "id", "secret", raw).unwrap();
            assert!(!config.verify_ssl, "{raw:?} should not enable verification");
        }
    }

    #[test]
    fn test_missing_settings_are_all_reported() {
        let err = MapperConfig::from_parts("", "id", "  ", "false").unwrap_err();
        let message = err.to_string();

        assert!(message.contains(ENV_API_URL));
        assert!(message.contains(ENV_TOKEN_VALUE));
        assert!(!message.contains(ENV_TOKEN_ID));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = MapperConfig::from_parts("https://pve", "id", "hunter2", "").unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
