//! Config command - show the stored configuration.

use anyhow::Result;

use super::{print_json, Context};

pub async fn show(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let config = store.load().await?;

    if ctx.json {
        return print_json(&config);
    }

    let mut favorites = config.favorites.clone();
    favorites.sort_unstable();

    println!("Config file: {}", store.path().display());
    println!("Refresh interval: {}s", config.refresh_interval);
    println!(
        "Favorites: {}",
        if favorites.is_empty() {
            "none".to_string()
        } else {
            favorites
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }
    );
    println!("Watched ports:");
    if config.watched_ports.is_empty() {
        println!("  none");
    }
    for w in &config.watched_ports {
        println!("  {}", w);
    }
    Ok(())
}
