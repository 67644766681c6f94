//! `ace status` — Show the effective configuration.

use std::path::PathBuf;

use ace_config::AceConfig;

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.unwrap_or_else(AceConfig::config_path);
    let config = AceConfig::load_with_env(&path).map_err(|e| format!("Failed to load config: {e}"))?;
    let engine = &config.engine;
    let roles = &config.roles;

    println!("ACE Status");
    println!("==========");
    println!("  Config file:      {}", path.display());
    println!("  Refine threshold: {} (floor {})", engine.refine_threshold, engine.refine_floor);
    println!("  Learning rate:    {}", engine.learning_rate);
    println!("  Max strategies:   {}", engine.max_strategies);
    match engine.context_limit {
        Some(limit) => println!("  Context limit:    {limit} items"),
        None => println!("  Context limit:    all items"),
    }
    println!("  Event log:        {} entries", engine.event_log_capacity);
    println!("  Model:            {}", roles.model);
    println!(
        "  Role retries:     {} attempts, {}s timeout",
        roles.max_attempts, roles.timeout_secs
    );
    println!(
        "  API key:          {}",
        if config.api_key.is_some() { "set" } else { "not set" }
    );

    if path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `ace onboard` first");
    }

    Ok(())
}
