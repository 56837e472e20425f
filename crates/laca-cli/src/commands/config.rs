//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use laca_core::Config;

use crate::output::{Output, OutputFormat};

const VALID_KEYS: &str = "data_dir, export_dir, save_delay_ms, saved_display_ms, auto_migrate, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "export_dir": config.export_dir,
                    "save_delay_ms": config.save_delay_ms,
                    "saved_display_ms": config.saved_display_ms,
                    "auto_migrate": config.auto_migrate,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:         {}", config.data_dir.display());
            println!("  export_dir:       {}", display_optional(&config.export_dir));
            println!("  save_delay_ms:    {}", config.save_delay_ms);
            println!("  saved_display_ms: {}", config.saved_display_ms);
            println!("  auto_migrate:     {}", config.auto_migrate);
            println!("  log_file:         {}", display_optional(&config.log_file));
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "export_dir" => {
            config.export_dir = optional_path(value);
        }
        "save_delay_ms" => {
            config.save_delay_ms = value
                .parse()
                .context("Invalid value for save_delay_ms. Use a whole number of milliseconds.")?;
        }
        "saved_display_ms" => {
            config.saved_display_ms = value
                .parse()
                .context("Invalid value for saved_display_ms. Use a whole number of milliseconds.")?;
        }
        "auto_migrate" => {
            config.auto_migrate = value
                .parse()
                .context("Invalid value for auto_migrate. Use 'true' or 'false'.")?;
        }
        "log_file" => {
            config.log_file = optional_path(value);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }
    Ok(())
}

/// Empty or "none" clears an optional path
fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.into())
    }
}

fn display_optional(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "save_delay_ms", "250").unwrap();
        apply(&mut config, "auto_migrate", "false").unwrap();
        apply(&mut config, "export_dir", "/tmp/laca-exports").unwrap();

        assert_eq!(config.save_delay_ms, 250);
        assert!(!config.auto_migrate);
        assert_eq!(config.export_dir, Some(PathBuf::from("/tmp/laca-exports")));

        apply(&mut config, "export_dir", "none").unwrap();
        assert_eq!(config.export_dir, None);
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let mut config = Config::default();

        assert!(apply(&mut config, "save_delay_ms", "soon").is_err());
        assert!(apply(&mut config, "auto_migrate", "maybe").is_err());
        assert!(apply(&mut config, "sync_url", "ws://x").is_err());
        assert_eq!(config.save_delay_ms, 500);
    }
}
