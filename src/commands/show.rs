use std::path::Path;

use serde_json::json;

use super::{open_lists, print_json};
use crate::config::Config;
use crate::display::render_view;
use crate::error::{RelatedListsError, Result};
use crate::types::CollectionKind;

/// Load both collections once and print them
pub async fn cmd_show(config: &Config, data: &Path, parent: &str, output_json: bool) -> Result<()> {
    let lists = open_lists(data, parent, config)?;

    let events = lists.initial_load().await;
    if let Some(failure) = events.iter().find(|e| e.is_failure()) {
        return Err(RelatedListsError::Gateway(failure.message()));
    }

    if output_json {
        return print_json(&json!({
            "parent": lists.parent(),
            "contacts": lists.view(CollectionKind::Contacts),
            "opportunities": lists.view(CollectionKind::Opportunities),
        }));
    }

    for (i, kind) in CollectionKind::ALL.into_iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", render_view(&lists.view(kind), &[]));
    }
    Ok(())
}
