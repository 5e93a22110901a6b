//! Configuration commands.
//!
//! - `config show`: Display the effective configuration
//! - `config path`: Print where the config file is read from

use std::path::Path;

use owo_colors::OwoColorize;

use super::print_json;
use crate::config::{Config, DEBOUNCE_ENV, PAGE_SIZE_ENV};
use crate::error::{RelatedListsError, Result};

/// Show the configuration after file loading and env overrides
pub fn cmd_config_show(config: &Config, output_json: bool) -> Result<()> {
    if output_json {
        return print_json(config);
    }

    println!("{}", "Configuration:".bold());
    println!("  page_size: {}", config.page_size);
    println!("  search_debounce_ms: {}", config.search_debounce_ms);
    println!("  link_prefix: {}", config.link_prefix);
    println!("  simulated_latency_ms: {}", config.simulated_latency_ms);
    for (key, collection) in [("contacts", &config.contacts), ("opportunities", &config.opportunities)] {
        println!("  {}:", key);
        println!("    label: {}", collection.label);
        println!("    search_fields: {}", collection.search_fields.join(", "));
    }
    println!();
    println!(
        "{}",
        format!("Environment overrides: {PAGE_SIZE_ENV}, {DEBOUNCE_ENV}").dimmed()
    );
    Ok(())
}

/// Print the config file location: `explicit` if given, else the default
pub fn cmd_config_path(explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => Config::default_path().ok_or_else(|| {
            RelatedListsError::Config("could not determine config directory".to_string())
        })?,
    };
    println!("{}", path.display());
    Ok(())
}
