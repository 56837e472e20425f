//! Clear command handler

use anyhow::{bail, Context, Result};

use laca_core::RecordStore;

use crate::editor::confirm;
use crate::output::Output;

/// Delete every book
pub async fn clear(store: &dyn RecordStore, yes: bool, output: &Output) -> Result<()> {
    let count = store.count().await.context("Failed to count books")?;

    if !yes {
        if !output.should_prompt() {
            bail!("Refusing to delete {} book(s) without --yes", count);
        }
        println!("This deletes all {} book(s) and their sessions.", count);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.clear().await.context("Failed to clear books")?;

    output.success(&format!("Deleted {} book(s)", count));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use laca_core::{Book, MemoryStore};

    use crate::output::OutputFormat;

    #[tokio::test]
    async fn test_clear_requires_yes_when_not_interactive() {
        let store = MemoryStore::with_books([Book::with_id("b1", "Dune", "Herbert")]);
        let output = Output::new(OutputFormat::Json);

        assert!(clear(&store, false, &output).await.is_err());
        assert_eq!(store.count().await.unwrap(), 1);

        clear(&store, true, &output).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
