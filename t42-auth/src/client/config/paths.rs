use crate::error::AuthError;
use std::path::PathBuf;

const APP_NAME: &str = "t42";
const SECRET_DIR: &str = "secret";

/// `./secret` when `T42_ENV=development`, otherwise `<config_dir>/t42`.
pub fn config_dir() -> Result<PathBuf, AuthError> {
    if is_development() {
        return Ok(PathBuf::from(SECRET_DIR));
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_NAME))
        .ok_or_else(|| AuthError::Configuration("no user config directory on this platform".into()))
}

pub fn credentials_path() -> Result<PathBuf, AuthError> {
    Ok(config_dir()?.join("credentials.json"))
}

pub fn settings_path() -> Result<PathBuf, AuthError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Development `.env`, loaded before settings are read.
pub fn dotenv_path() -> PathBuf {
    PathBuf::from(SECRET_DIR).join(".env")
}

fn is_development() -> bool {
    std::env::var("T42_ENV").is_ok_and(|v| v == "development")
}
