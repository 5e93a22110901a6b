mod config;
mod shell;
mod show;

pub use config::{cmd_config_path, cmd_config_show};
pub use shell::{ShellCommand, cmd_shell};
pub use show::cmd_show;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::controller::RelatedLists;
use crate::error::{RelatedListsError, Result};
use crate::gateway::{Dataset, MemoryStore};
use crate::types::ParentId;

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Load a dataset and build the controller for one of its parents.
pub(crate) fn open_lists(data: &Path, parent: &str, config: &Config) -> Result<RelatedLists> {
    let dataset = Dataset::load(data)?;
    let store = Arc::new(MemoryStore::from_config(dataset, config));

    let parent = ParentId::from(parent);
    if !store.has_parent(&parent) {
        return Err(RelatedListsError::ParentNotFound(parent));
    }

    tracing::debug!(data = %data.display(), parent = %parent, "opened dataset");
    Ok(RelatedLists::from_store(parent, store, config))
}
