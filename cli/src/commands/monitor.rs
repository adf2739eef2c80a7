//! Monitor command - keep scanning and report watched-port transitions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use portwatch_core::{EngineEvent, Transition};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use super::Context;

fn report(transition: &Transition, json: bool) {
    let now = Local::now();
    if json {
        println!(
            "{}",
            json!({ "timestamp": now.to_rfc3339(), "transition": transition })
        );
    } else {
        println!("[{}] {}", now.format("%H:%M:%S"), transition);
    }
}

pub async fn run(ctx: &Context, interval: Option<u64>) -> Result<()> {
    let engine = Arc::new(ctx.engine().await?);
    if let Some(secs) = interval {
        engine.set_refresh_interval(Duration::from_secs(secs)).await?;
    }

    let mut events = engine.subscribe();
    let handle = Arc::clone(&engine).spawn_monitor();

    if !ctx.json {
        println!(
            "Monitoring {} watched ports every {}s. Press Ctrl-C to stop.",
            engine.watched_ports().len(),
            engine.refresh_interval().as_secs()
        );
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = events.recv() => match event {
                Ok(EngineEvent::RegistryUpdated { .. }) => {
                    for transition in engine.take_notifications() {
                        report(&transition, ctx.json);
                    }
                }
                Ok(EngineEvent::ScanFailed { message }) => {
                    eprintln!("[{}] scan failed: {}", Local::now().format("%H:%M:%S"), message);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Monitor fell behind on events");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.shutdown().await;
    Ok(())
}
