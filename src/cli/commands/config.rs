//! Config Command
//!
//! Show the resolved configuration (defaults → secrets file → environment).
//! Secrets are never printed.
//!
//! Usage:
//!   lograg config show [--variant batch|chat] [-f json] [--secrets FILE]

use std::path::Path;

use crate::cli::ui::output::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show configuration
pub fn show(variant: &str, format: &str, secrets: Option<&Path>) -> Result<()> {
    let as_json = format == "json";

    let (info, validation) = match variant {
        "chat" => {
            let config = ConfigLoader::load_chat(secrets)?;
            (config.debug_info(), config.validate())
        }
        _ => {
            let config = ConfigLoader::load_batch()?;
            (config.debug_info(), config.validate())
        }
    };

    if !as_json {
        println!("# Resolved {} configuration\n", variant);
    }
    println!("{}", ConfigLoader::render(&info, as_json)?);

    if let Err(e) = validation {
        Output::new().warning(&e.to_string());
    }
    Ok(())
}
