pub mod callback;
mod client;
pub mod common;
mod error;
pub mod pkce;

pub use callback::{CALLBACK_TIMEOUT, CallbackServer, code_from_pasted};
pub use client::{
    Browser, EXPIRY_BUFFER, FlowState, LoginFlow, NoBrowser, OAuthClient, Settings,
    SystemBrowser, TokenStore, config_dir, credentials_path, dotenv_path,
    ensure_fresh_credentials, needs_refresh_at, refresh_stored, settings_path,
};
pub use common::Credentials;
pub use error::AuthError;
pub use pkce::PkceParams;
