//! `palaver tokens` — Count tokens as the budget enforcer sees them.

use std::path::Path;

use palaver_core::TokenCounter;
use palaver_session::TiktokenCounter;

pub async fn run(
    config_path: Option<&Path>,
    text: String,
    model: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let model = match model {
        Some(model) => model,
        None => super::load_config(config_path)?.session.model,
    };

    let counter = TiktokenCounter::new();
    let count = counter.count(&model, &text);
    println!("{count} tokens ({model}, {})", counter.name());
    Ok(())
}
