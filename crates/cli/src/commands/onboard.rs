//! `ace onboard` — First-time setup.

use std::path::{Path, PathBuf};

use ace_config::AceConfig;

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path.unwrap_or_else(AceConfig::config_path);

    println!("ACE — First-Time Setup");
    println!("======================\n");

    if !write_default_config(&config_path)? {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    println!("✅ Created config at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Adjust [engine] refine_threshold / learning_rate if needed");
    println!("   2. Run: ace replay --traces traces.json --baseline\n");

    Ok(())
}

/// Write the default config to `path`, creating parent directories.
/// Returns `false` without touching anything if the file already exists.
fn write_default_config(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, AceConfig::default_toml())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_to_the_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("custom.toml");

        assert!(write_default_config(&path).unwrap());
        let config = AceConfig::load_from(&path).unwrap();
        assert_eq!(config.engine.refine_threshold, 20);
        assert!(!dir.path().join("config.toml").exists());
    }

    #[test]
    fn leaves_an_existing_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# mine\n").unwrap();

        assert!(!write_default_config(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");
    }
}
