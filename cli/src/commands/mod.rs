//! Subcommand implementations.
//!
//! Each command builds a short-lived engine over the real scanner, killer
//! and config file, does its work and prints the result.

pub mod config;
pub mod favorites;
pub mod kill;
pub mod list;
pub mod monitor;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use portwatch_core::{ConfigStore, PortInfo, PortScanner, ProcessKiller, SystemEngine};
use serde::Serialize;

/// Global options shared by every subcommand.
pub struct Context {
    pub json: bool,
    pub config_path: Option<PathBuf>,
}

impl Context {
    pub fn store(&self) -> Result<ConfigStore> {
        match &self.config_path {
            Some(path) => Ok(ConfigStore::with_path(path.clone())),
            None => Ok(ConfigStore::new()?),
        }
    }

    pub async fn engine(&self) -> Result<SystemEngine> {
        Ok(SystemEngine::load(PortScanner::new(), ProcessKiller::new(), self.store()?).await?)
    }

    /// Engine that has completed one scan.
    pub async fn scanned_engine(&self) -> Result<SystemEngine> {
        let engine = self.engine().await?;
        engine.refresh().await?;
        Ok(engine)
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Table of records with favorite/watched markers in the first column.
pub fn print_table(ports: &[PortInfo], engine: &SystemEngine) {
    println!(
        "{:<3} {:<6} {:<8} {:<20} {:<15} {:<10} {:<12} COMMAND",
        "", "PORT", "PID", "PROCESS", "ADDRESS", "USER", "TYPE"
    );
    println!("{}", "-".repeat(96));

    for port in ports {
        let marks = format!(
            "{}{}",
            if engine.is_favorite(port.port) { "*" } else { " " },
            if engine.is_watching(port.port) { "w" } else { " " },
        );
        let pid = if port.is_active {
            port.pid.to_string()
        } else {
            "-".to_string()
        };

        println!(
            "{:<3} {:<6} {:<8} {:<20} {:<15} {:<10} {:<12} {}",
            marks,
            port.port,
            pid,
            truncate(&port.process_name, 20),
            truncate(&port.address, 15),
            truncate(&port.user, 10),
            port.process_type().display_name(),
            truncate(&port.command, 30)
        );
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}
