mod paths;
mod settings;

pub use paths::{config_dir, credentials_path, dotenv_path, settings_path};
pub use settings::Settings;
