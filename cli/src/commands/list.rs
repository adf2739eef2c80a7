//! List command - show listening ports and favorite/watched placeholders.

use anyhow::Result;
use clap::Args;
use portwatch_core::{PortFilter, ProcessType, SortKey};

use super::{print_json, print_table, Context};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Case-insensitive text matched against process, port, PID, address, user and command
    #[arg(short, long)]
    pub search: Option<String>,

    /// Lowest port to show (inclusive)
    #[arg(long)]
    pub min_port: Option<u16>,

    /// Highest port to show (inclusive)
    #[arg(long)]
    pub max_port: Option<u16>,

    /// Only show these categories: web, database, development, system, other
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub types: Vec<ProcessType>,

    /// Only show favorite ports
    #[arg(long)]
    pub favorites: bool,

    /// Only show watched ports
    #[arg(long)]
    pub watched: bool,

    /// Sort column: port, process, pid, type, address, user, actions
    #[arg(long, default_value_t = SortKey::Port)]
    pub sort: SortKey,

    /// Reverse the sort order
    #[arg(long)]
    pub desc: bool,
}

impl ListArgs {
    fn filter(&self) -> PortFilter {
        let mut filter = PortFilter::new()
            .with_port_range(self.min_port, self.max_port)
            .with_favorites_only(self.favorites)
            .with_watched_only(self.watched);
        if let Some(search) = &self.search {
            filter = filter.with_search(search.as_str());
        }
        if !self.types.is_empty() {
            filter = filter.with_process_types(self.types.iter().copied());
        }
        filter
    }
}

pub async fn run(ctx: &Context, args: ListArgs) -> Result<()> {
    let engine = ctx.scanned_engine().await?;
    let ports = engine.present(&args.filter(), args.sort, !args.desc);

    if ctx.json {
        return print_json(&ports);
    }

    if ports.is_empty() {
        println!("No listening ports found.");
        return Ok(());
    }

    print_table(&ports, &engine);

    let active = ports.iter().filter(|p| p.is_active).count();
    println!(
        "\nTotal: {} ports ({} active, {} not running)",
        ports.len(),
        active,
        ports.len() - active
    );
    Ok(())
}
