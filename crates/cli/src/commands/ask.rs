//! `palaver ask` — One-shot prompt or document submission.

use std::path::{Path, PathBuf};

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
    file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let mut session = super::build_session(&config)?;

    let outcome = match (message, file) {
        (Some(message), _) => session.submit(&message).await?,
        (None, Some(file)) => {
            let text = std::fs::read_to_string(&file)
                .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
            session.submit_document(&text).await?
        }
        (None, None) => return Err("Nothing to ask: pass --message TEXT or --file PATH".into()),
    };

    if outcome.is_refused() {
        tracing::info!("Prompt was outside the allowed topics");
    }
    println!("{}", outcome.text());
    Ok(())
}
