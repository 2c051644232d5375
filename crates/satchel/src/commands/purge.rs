//! Purge command - reclaims expired session files.

use anyhow::Result;
use satchel_session::FileStorage;
use serde::Serialize;

use super::Context;

/// Purge result for JSON output.
#[derive(Debug, Serialize)]
struct PurgeOutput {
    removed: usize,
}

/// Run the purge command.
pub fn run(ctx: &Context) -> Result<()> {
    let removed = match ctx.file_storage_dir() {
        Some(dir) => FileStorage::open(dir)?.purge_expired()?,
        None => {
            tracing::info!("Memory storage holds nothing between runs; nothing to purge");
            0
        }
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&PurgeOutput { removed })?);
    } else {
        println!("Removed {removed} expired session(s)");
    }
    Ok(())
}
