//! Write a starter configuration file.

use anyhow::{Context, Result};
use picochat_client::ClientConfig;
use std::path::Path;

/// Run the init command.
pub fn run(path: &Path, homeserver: &str, room: &str, token: &str, force: bool) -> Result<()> {
    // Check if already initialized
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Pass --force to overwrite.",
            path.display()
        );
    }

    let config = ClientConfig::new(homeserver, room, token);
    config.validate()?;

    let content = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Configuration written to {}", path.display());
    println!();
    println!("  Homeserver: {}", config.homeserver.url);
    println!("  Room:       {}", config.homeserver.room_id);
    println!("  Interval:   {}s", config.sync.interval_secs);
    println!();
    println!("Next steps:");
    println!("  1. Check the connection: picochat sync");
    println!("  2. Start chatting:       picochat run");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_writes_loadable_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("picochat.toml");

        run(&path, "https://hs.local", "!r:hs.local", "syt_tok", false).unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.homeserver.url, "https://hs.local");
        assert_eq!(config.homeserver.access_token, "syt_tok");
        assert_eq!(config.history.capacity, 10);
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("picochat.toml");

        run(&path, "https://hs", "!r:hs", "a", false).unwrap();
        assert!(run(&path, "https://hs", "!r:hs", "b", false).is_err());
        assert!(run(&path, "https://hs", "!r:hs", "b", true).is_ok());

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.homeserver.access_token, "b");
    }

    #[test]
    fn init_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("picochat.toml");

        assert!(run(&path, "not-a-url", "!r:hs", "tok", false).is_err());
        assert!(!path.exists());
    }
}
