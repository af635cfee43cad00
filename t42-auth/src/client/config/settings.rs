use super::paths;
use crate::error::AuthError;
use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    /// 0 lets the OS pick the callback port
    #[serde(default)]
    pub redirect_port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_api_base_url() -> String {
    "https://api.intra.42.fr".to_string()
}

fn default_scope() -> String {
    "public".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_base_url: default_api_base_url(),
            scope: default_scope(),
            redirect_port: 0,
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: None,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[redacted]"))
            .field("api_base_url", &self.api_base_url)
            .field("scope", &self.scope)
            .field("redirect_port", &self.redirect_port)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Settings {
    /// Layers `<config_dir>/t42/config.toml`, the file named by `T42_CONFIG`, then `T42_*` env vars.
    pub fn new() -> Result<Self, ConfigError> {
        let default_file = paths::settings_path().ok();
        let override_file = std::env::var("T42_CONFIG").ok();

        let mut builder = Config::builder();

        // Plain CLIENT_ID / CLIENT_SECRET from a .env file sit below everything else
        for key in ["client_id", "client_secret"] {
            if let Ok(value) = std::env::var(key.to_uppercase()) {
                builder = builder.set_default(key, value)?;
            }
        }
        if let Some(path) = default_file {
            builder = builder.add_source(File::from(path).required(false));
        }
        if let Some(path) = override_file {
            builder = builder.add_source(File::with_name(&path).required(false));
        }

        builder
            .add_source(
                config::Environment::with_prefix("T42")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Reads a single settings file, without environment layering.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.api_base_url.starts_with("http") {
            return Err("api_base_url must be a valid HTTP(S) URL".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Client id and secret, or a configuration error explaining where to put them.
    pub fn client_credentials(&self) -> Result<(&str, &str), AuthError> {
        match (
            self.client_id.as_deref().filter(|s| !s.is_empty()),
            self.client_secret.as_deref().filter(|s| !s.is_empty()),
        ) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(AuthError::Configuration(
                "client_id and client_secret are required. Set T42_CLIENT_ID and \
                 T42_CLIENT_SECRET (or CLIENT_ID/CLIENT_SECRET in secret/.env), or add them \
                 to config.toml in the t42 config directory"
                    .to_string(),
            )),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/oauth/authorize", self.api_base_url.trim_end_matches('/'))
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.api_base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "client_id = \"u-s4t2ud-abc\"\nclient_secret = \"s-s4t2ud-xyz\"\nredirect_port = 8765"
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();

        assert_eq!(settings.client_id.as_deref(), Some("u-s4t2ud-abc"));
        assert_eq!(settings.redirect_port, 8765);
        assert_eq!(settings.scope, "public");
        assert_eq!(settings.api_base_url, "https://api.intra.42.fr");
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.client_credentials().unwrap(),
            ("u-s4t2ud-abc", "s-s4t2ud-xyz")
        );
    }

    #[test]
    fn missing_secret_is_a_configuration_error() {
        let settings = Settings {
            client_id: Some("id".into()),
            ..Settings::default()
        };

        let err = settings.client_credentials().unwrap_err();
        assert!(matches!(err, AuthError::Configuration(msg) if msg.contains("T42_CLIENT_SECRET")));
    }

    #[test]
    fn oauth_urls_derive_from_base() {
        let settings = Settings {
            api_base_url: "http://127.0.0.1:9999/".into(),
            ..Settings::default()
        };

        assert_eq!(settings.authorize_url(), "http://127.0.0.1:9999/oauth/authorize");
        assert_eq!(settings.token_url(), "http://127.0.0.1:9999/oauth/token");
    }

    #[test]
    fn debug_redacts_secret() {
        let settings = Settings {
            client_secret: Some("s-s4t2ud-xyz".into()),
            ..Settings::default()
        };
        assert!(!format!("{settings:?}").contains("xyz"));
    }
}
