//! Kill command - terminate the process listening on a port.

use anyhow::{bail, Result};
use serde_json::json;

use super::{print_json, Context};

pub async fn run(ctx: &Context, port: u16, force: bool) -> Result<()> {
    let engine = ctx.scanned_engine().await?;

    let Some(record) = engine.registry().active(port).cloned() else {
        bail!("No process is listening on port {}", port);
    };

    if force {
        engine.force_terminate(&record).await?;
    } else {
        engine.terminate(&record).await?;
    }

    if ctx.json {
        return print_json(&json!({
            "port": record.port,
            "pid": record.pid,
            "processName": record.process_name,
            "killed": true,
        }));
    }

    println!(
        "Killed {} (PID {}) on port {}",
        record.process_name, record.pid, record.port
    );
    Ok(())
}
