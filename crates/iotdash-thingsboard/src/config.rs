use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured token.
pub const TOKEN_ENV: &str = "THINGSBOARD_TOKEN";
pub const DEFAULT_BASE_URL: &str = "https://thingsboard.cloud/api";

/// Connection settings for a ThingsBoard tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThingsBoardConfig {
    /// REST root, including the `/api` suffix
    pub base_url: String,
    /// JWT sent as `X-Authorization: Bearer <token>`
    pub token: String,
    pub timeout_ms: u64,
}

impl Default for ThingsBoardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            token: String::new(),
            timeout_ms: 10_000,
        }
    }
}

impl ThingsBoardConfig {
    /// Replace the token with `THINGSBOARD_TOKEN` when that variable is set
    /// and non-empty.
    pub fn with_env_token(mut self) -> Self {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.token = token.trim().to_string();
            }
        }
        self
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ThingsBoardConfig = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_ms, 10_000);
        assert!(config.has_token());
    }

    #[test]
    fn test_default_has_no_token() {
        assert!(!ThingsBoardConfig::default().has_token());
    }
}
