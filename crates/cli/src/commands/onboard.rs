//! `palaver onboard` — First-time setup.

use std::path::Path;

use palaver_config::AppConfig;

pub async fn run(config_path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = super::config_file(config_path);

    println!("Palaver — First-Time Setup");
    println!("==========================\n");

    if config_path.exists() && !force {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or re-run with --force to overwrite.\n");
        return Ok(());
    }

    AppConfig::default().save_to(&config_path)?;
    println!("✅ Created config.toml at: {}", config_path.display());

    println!("\n📝 Next steps:");
    println!("   1. Set your API key:  export TOGETHER_API_KEY=...");
    println!("      (or PALAVER_API_KEY / OPENAI_API_KEY, or `api_key` under [provider])");
    println!("   2. Adjust [session] model, sampling and token_budget if needed");
    println!("   3. Enable [relevance] to restrict prompts to career topics");
    println!("   4. Run: palaver chat\n");

    Ok(())
}
