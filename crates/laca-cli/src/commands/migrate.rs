//! Legacy import command handler

use anyhow::{Context, Result};

use laca_core::{migrate_legacy, Config, FileLegacyStorage, MigrationOutcome, RecordStore};

use crate::output::{Output, OutputFormat};

/// Import the legacy blob (if any) into the store
pub async fn migrate(store: &dyn RecordStore, config: &Config, output: &Output) -> Result<()> {
    let legacy = FileLegacyStorage::new(config.legacy_dir());
    let outcome = migrate_legacy(&legacy, store)
        .await
        .context("Legacy import failed; the legacy data was left in place")?;

    match output.format {
        OutputFormat::Json => {
            let imported = match outcome {
                MigrationOutcome::Skipped => 0,
                MigrationOutcome::Imported(n) => n,
            };
            println!(
                "{}",
                serde_json::json!({
                    "migrated": matches!(outcome, MigrationOutcome::Imported(_)),
                    "imported": imported
                })
            );
        }
        _ => match outcome {
            MigrationOutcome::Skipped => output.message("No legacy data to import."),
            MigrationOutcome::Imported(n) => {
                output.success(&format!("Imported {} book(s) from legacy storage", n))
            }
        },
    }

    Ok(())
}

/// Import at startup; failures are reported but never stop the command
pub async fn auto_migrate(store: &dyn RecordStore, config: &Config, output: &Output) {
    let legacy = FileLegacyStorage::new(config.legacy_dir());
    match migrate_legacy(&legacy, store).await {
        Ok(MigrationOutcome::Imported(n)) => {
            output.warn(&format!("Imported {} book(s) from legacy storage", n));
        }
        Ok(MigrationOutcome::Skipped) => {}
        Err(e) => {
            output.warn(&format!("Legacy import failed: {}", e));
            output.warn("The legacy data was kept; run `laca migrate` to retry.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laca_core::migrate::LEGACY_KEY;
    use laca_core::{Book, MemoryStore};
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_migrate_imports_legacy_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        let legacy = FileLegacyStorage::new(config.legacy_dir());
        let books = vec![Book::with_id("b1", "Dune", "Herbert")];
        std::fs::write(
            legacy.path_for(LEGACY_KEY),
            serde_json::to_string(&books).unwrap(),
        )
        .unwrap();

        let store = MemoryStore::new();
        migrate(&store, &config, &Output::new(OutputFormat::Quiet))
            .await
            .unwrap();

        assert_eq!(store.get_all().await.unwrap(), books);
        assert!(!legacy.path_for(LEGACY_KEY).exists());
    }

    #[tokio::test]
    async fn test_auto_migrate_keeps_broken_blob() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        let legacy = FileLegacyStorage::new(config.legacy_dir());
        std::fs::write(legacy.path_for(LEGACY_KEY), "not json").unwrap();

        let store = MemoryStore::new();
        auto_migrate(&store, &config, &Output::new(OutputFormat::Quiet)).await;

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(legacy.path_for(LEGACY_KEY).exists());
    }
}
