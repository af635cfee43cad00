use super::config::credentials_path;
use crate::common::Credentials;
use crate::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Proactive refresh kicks in this long before expiry.
pub const EXPIRY_BUFFER: Duration = Duration::minutes(5);

pub struct TokenStore {
    token_path: PathBuf,
}

impl TokenStore {
    /// Store at the default credentials path for this environment.
    pub fn new() -> Result<Self, AuthError> {
        Ok(Self::at(credentials_path()?))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            token_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.token_path
    }

    pub fn save(&self, credentials: &Credentials) -> Result<(), AuthError> {
        if let Some(dir) = self.token_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                AuthError::TokenStorage(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(credentials)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // Owner read/write only, from the moment the file exists
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.token_path)
            .map_err(|e| AuthError::TokenStorage(format!("Failed to save credentials: {}", e)))?;

        // `mode` only applies on creation; tighten a file left by an older version
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| {
                    AuthError::TokenStorage(format!("Failed to set file permissions: {}", e))
                })?;
        }

        file.write_all(json.as_bytes())
            .map_err(|e| AuthError::TokenStorage(format!("Failed to save credentials: {}", e)))?;

        tracing::debug!(path = %self.token_path.display(), "Saved credentials");
        Ok(())
    }

    pub fn load(&self) -> Result<Credentials, AuthError> {
        let json = match fs::read_to_string(&self.token_path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(AuthError::NotLoggedIn),
            Err(e) => {
                return Err(AuthError::TokenStorage(format!(
                    "Failed to read credentials: {}",
                    e
                )));
            }
        };

        serde_json::from_str(&json).map_err(|e| {
            AuthError::TokenStorage(format!(
                "Credentials file {} is invalid: {}",
                self.token_path.display(),
                e
            ))
        })
    }

    /// Removes the credentials file; a missing file is not an error.
    pub fn delete(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.token_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::TokenStorage(format!(
                "Failed to delete credentials: {}",
                e
            ))),
        }
    }

    pub fn needs_refresh(&self, credentials: &Credentials) -> bool {
        needs_refresh_at(credentials, Utc::now())
    }
}

pub fn needs_refresh_at(credentials: &Credentials, now: DateTime<Utc>) -> bool {
    credentials.expires_at <= now + EXPIRY_BUFFER
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(expires_at: DateTime<Utc>) -> Credentials {
        Credentials {
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
            token_type: "bearer".into(),
            scope: "public".into(),
            created_at: expires_at - Duration::hours(2),
            expires_at,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("nested").join("credentials.json"));
        let creds = credentials(now());

        store.save(&creds).unwrap();

        assert_eq!(store.load().unwrap(), creds);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("credentials.json"));
        store.save(&credentials(now())).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn save_tightens_existing_readable_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = TokenStore::at(&path);
        store.save(&credentials(now())).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap(), credentials(now()));
    }

    #[test]
    fn missing_file_means_not_logged_in() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("credentials.json"));

        assert!(matches!(store.load(), Err(AuthError::NotLoggedIn)));
    }

    #[test]
    fn legacy_file_is_converted_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(
            &path,
            r#"{"access_token":"a","refresh_token":"r","expires_in":7200,"created_at":1700000000,"token_type":"bearer","scope":"public"}"#,
        )
        .unwrap();

        let creds = TokenStore::at(&path).load().unwrap();

        assert_eq!(creds.expires_at.timestamp(), 1_700_007_200);
        assert_eq!(creds.expires_in(), 7200);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            TokenStore::at(&path).load(),
            Err(AuthError::TokenStorage(_))
        ));
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("credentials.json"));

        store.delete().unwrap();
        store.save(&credentials(now())).unwrap();
        store.delete().unwrap();

        assert!(!store.path().exists());
        assert!(matches!(store.load(), Err(AuthError::NotLoggedIn)));
    }

    #[test]
    fn refresh_is_needed_inside_buffer() {
        assert!(needs_refresh_at(&credentials(now()), now()));
        assert!(needs_refresh_at(
            &credentials(now() + Duration::minutes(4)),
            now()
        ));
        assert!(!needs_refresh_at(
            &credentials(now() + Duration::minutes(10)),
            now()
        ));
    }
}
