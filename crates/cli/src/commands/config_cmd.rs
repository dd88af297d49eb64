//! `mcremote config`: configuration management commands.

use mcremote_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();
            if config.search.villager_range > config.search.entity_range {
                warnings.push("search.villager_range is larger than search.entity_range");
            }
            if config.timeouts.dig_secs > config.timeouts.move_secs {
                warnings.push("timeouts.dig_secs is longer than timeouts.move_secs");
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
            println!("   Server:    {} {}", config.server.name, config.server.version);
            println!("   Backend:   {}", config.backend.kind);
            println!("   Port:      {}", config.connection.default_port);
            println!(
                "   Timeouts:  connect {}s, move {}s, dig {}s",
                config.connection.connect_timeout_secs,
                config.timeouts.move_secs,
                config.timeouts.dig_secs
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = mcremote_config::AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().ends_with(".mcremote/config.toml"));
    }

    #[test]
    fn default_config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&mcremote_config::AppConfig::default()).unwrap();
        assert!(rendered.contains("[backend]"));
        assert!(rendered.contains("kind = \"sim\""));
    }
}
