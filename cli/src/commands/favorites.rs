//! Favorites commands, plus `forget` which clears both overlays for a port.

use anyhow::Result;
use portwatch_core::{PortFilter, SortKey};

use super::{print_json, print_table, Context};

pub async fn add(ctx: &Context, port: u16) -> Result<()> {
    let engine = ctx.engine().await?;
    if engine.add_favorite(port).await? {
        println!("Added port {} to favorites", port);
    } else {
        println!("Port {} is already a favorite", port);
    }
    Ok(())
}

pub async fn remove(ctx: &Context, port: u16) -> Result<()> {
    let engine = ctx.engine().await?;
    if engine.remove_favorite(port).await? {
        println!("Removed port {} from favorites", port);
    } else {
        println!("Port {} is not a favorite", port);
    }
    Ok(())
}

pub async fn toggle(ctx: &Context, port: u16) -> Result<()> {
    let engine = ctx.engine().await?;
    if engine.toggle_favorite(port).await? {
        println!("Added port {} to favorites", port);
    } else {
        println!("Removed port {} from favorites", port);
    }
    Ok(())
}

pub async fn list(ctx: &Context) -> Result<()> {
    let engine = ctx.scanned_engine().await?;
    let ports = engine.present(
        &PortFilter::new().with_favorites_only(true),
        SortKey::Port,
        true,
    );

    if ctx.json {
        return print_json(&ports);
    }

    if ports.is_empty() {
        println!("No favorite ports.");
        return Ok(());
    }
    print_table(&ports, &engine);
    Ok(())
}

pub async fn forget(ctx: &Context, port: u16) -> Result<()> {
    let engine = ctx.engine().await?;
    if engine.remove_from_list(port).await? {
        println!("Port {} is no longer a favorite or watched", port);
    } else {
        println!("Port {} was neither a favorite nor watched", port);
    }
    Ok(())
}
