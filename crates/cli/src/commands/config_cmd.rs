//! `palaver config` — Configuration management commands.

use std::path::Path;

pub async fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    let config = match super::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ {e}");
            return Err(e);
        }
    };
    println!("   ✅ Config parsed and validated");

    let mut warnings = Vec::new();

    if !config.has_api_key() {
        warnings.push("No API key set (set PALAVER_API_KEY, TOGETHER_API_KEY or OPENAI_API_KEY)");
    }

    let counter = palaver_session::TiktokenCounter::new();
    let system_cost = palaver_core::TokenCounter::count(
        &counter,
        &config.session.model,
        &config.session.system_prompt,
    );
    if system_cost > config.session.token_budget {
        warnings.push("System prompt alone exceeds token_budget; every turn will be evicted");
    }

    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Provider:      {} ({})", config.provider.name, config.provider.base_url);
    println!("   Model:         {}", config.session.model);
    println!(
        "   Sampling:      temperature={} top_p={} max_tokens={}",
        config.session.temperature, config.session.top_p, config.session.max_tokens
    );
    println!(
        "   Token budget:  {} (system prompt uses {system_cost})",
        config.session.token_budget
    );
    let languages: Vec<&str> = config.relevance.keywords.keys().map(String::as_str).collect();
    println!(
        "   Relevance:     {} [{}]",
        if config.relevance.enabled { "enabled" } else { "disabled" },
        languages.join(", ")
    );

    Ok(())
}

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;
    if config.provider.api_key.is_some() {
        config.provider.api_key = Some("[REDACTED]".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", super::config_file(config_path).display());
    Ok(())
}
