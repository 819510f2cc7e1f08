pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod onboard;
pub mod tokens;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use palaver_config::AppConfig;
use palaver_session::SessionManager;

/// Resolve the config file: the `--config` override or the default path.
pub fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path)
}

/// Load config from `path` (or the default location) with env overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        None => AppConfig::load(),
        Some(path) => AppConfig::load_from(path).and_then(|mut config| {
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config.validate()?;
            Ok(config)
        }),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

/// Build the provider and a session from config, with a readable error when
/// no API key is available.
pub fn build_session(config: &AppConfig) -> Result<SessionManager, Box<dyn std::error::Error>> {
    let provider = match palaver_providers::build_from_config(&config.provider) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!();
            eprintln!("  ERROR: {e}");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    PALAVER_API_KEY   (generic)");
            eprintln!("    TOGETHER_API_KEY  (Together AI, the default endpoint)");
            eprintln!("    OPENAI_API_KEY    (OpenAI-compatible endpoints)");
            eprintln!();
            eprintln!("  Or add `api_key` under [provider] in:");
            eprintln!("    {}", AppConfig::config_path().display());
            eprintln!();
            return Err(e.into());
        }
    };

    let session = SessionManager::from_config(config, Arc::new(provider))?;
    Ok(session)
}
