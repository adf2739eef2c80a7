//! Watch list commands.

use anyhow::{bail, Result};
use serde::Serialize;

use super::{print_json, truncate, Context};

/// A watched port with its current state, for listing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WatchStatus {
    port: u16,
    notify_on_start: bool,
    notify_on_stop: bool,
    active: bool,
    process_name: Option<String>,
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

pub async fn add(ctx: &Context, port: u16, on_start: bool, on_stop: bool) -> Result<()> {
    let engine = ctx.engine().await?;
    if engine.add_watched_port(port, on_start, on_stop).await? {
        println!(
            "Watching port {} (start: {}, stop: {})",
            port,
            on_off(on_start),
            on_off(on_stop)
        );
    } else {
        println!(
            "Port {} is already watched; use `watch update` to change notifications",
            port
        );
    }
    Ok(())
}

pub async fn remove(ctx: &Context, port: u16) -> Result<()> {
    let engine = ctx.engine().await?;
    if engine.remove_watched_port(port).await? {
        println!("Stopped watching port {}", port);
    } else {
        println!("Port {} is not watched", port);
    }
    Ok(())
}

pub async fn toggle(ctx: &Context, port: u16) -> Result<()> {
    let engine = ctx.engine().await?;
    if engine.toggle_watch(port).await? {
        println!("Watching port {}", port);
    } else {
        println!("Stopped watching port {}", port);
    }
    Ok(())
}

pub async fn update(ctx: &Context, port: u16, on_start: bool, on_stop: bool) -> Result<()> {
    let engine = ctx.engine().await?;
    if !engine.update_watched_port(port, on_start, on_stop).await? {
        bail!("Port {} is not watched", port);
    }
    println!(
        "Port {}: start notifications {}, stop notifications {}",
        port,
        on_off(on_start),
        on_off(on_stop)
    );
    Ok(())
}

pub async fn list(ctx: &Context) -> Result<()> {
    let engine = ctx.scanned_engine().await?;
    let registry = engine.registry();

    let mut watched = engine.watched_ports();
    watched.sort_by_key(|w| w.port);

    let statuses: Vec<WatchStatus> = watched
        .iter()
        .map(|w| {
            let live = registry.active(w.port);
            WatchStatus {
                port: w.port,
                notify_on_start: w.notify_on_start,
                notify_on_stop: w.notify_on_stop,
                active: live.is_some(),
                process_name: live.map(|p| p.process_name.clone()),
            }
        })
        .collect();

    if ctx.json {
        return print_json(&statuses);
    }

    if statuses.is_empty() {
        println!("No watched ports.");
        return Ok(());
    }

    println!(
        "{:<6} {:<6} {:<6} {:<12} PROCESS",
        "PORT", "START", "STOP", "STATUS"
    );
    println!("{}", "-".repeat(50));
    for s in &statuses {
        println!(
            "{:<6} {:<6} {:<6} {:<12} {}",
            s.port,
            on_off(s.notify_on_start),
            on_off(s.notify_on_stop),
            if s.active { "active" } else { "not running" },
            s.process_name
                .as_deref()
                .map(|name| truncate(name, 20))
                .unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}
