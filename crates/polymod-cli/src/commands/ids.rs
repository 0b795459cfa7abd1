//! Source and destination listing commands.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use polymod_core::{DestinationId, RenderSource, SourceId};

use super::common::poly_label;

#[derive(Args)]
pub struct SourcesArgs {
    /// Only list per-voice sources
    #[arg(long, conflicts_with = "global")]
    poly: bool,

    /// Only list global sources
    #[arg(long)]
    global: bool,
}

#[derive(Args)]
pub struct DestinationsArgs {
    /// Only list per-voice destinations
    #[arg(long, conflicts_with = "global")]
    poly: bool,

    /// Only list global destinations
    #[arg(long)]
    global: bool,

    /// Only list destinations whose name starts with this prefix (e.g. "osc1", "delay")
    #[arg(long, value_name = "PREFIX")]
    group: Option<String>,
}

fn keep(poly_only: bool, global_only: bool, is_poly: bool) -> bool {
    (!poly_only || is_poly) && (!global_only || !is_poly)
}

pub fn run_sources(args: &SourcesArgs) -> anyhow::Result<()> {
    println!("Modulation Sources");
    println!("==================");
    println!();
    println!("  {:>4}  {:20}  {:4}  {}", "Id", "Name", "Kind", "Render");
    println!("  {:>4}  {:20}  {:4}  {}", "--", "----", "----", "------");

    for source in SourceId::iter().filter(|s| keep(args.poly, args.global, s.is_poly())) {
        let skippable = RenderSource::ALL
            .iter()
            .any(|render| render.source() == source);
        println!(
            "  {:>4}  {:20}  {:4}  {}",
            source.to_raw(),
            source.name(),
            poly_label(source.is_poly()),
            if skippable { "on demand" } else { "" }
        );
    }

    Ok(())
}

pub fn run_destinations(args: &DestinationsArgs) -> anyhow::Result<()> {
    let destinations: Vec<DestinationId> = DestinationId::iter()
        .filter(|d| keep(args.poly, args.global, d.is_poly()))
        .filter(|d| {
            args.group
                .as_deref()
                .is_none_or(|prefix| d.to_string().starts_with(prefix))
        })
        .collect();

    if destinations.is_empty() {
        anyhow::bail!("No destinations match the given filters");
    }

    println!("Modulation Destinations");
    println!("=======================");
    println!();
    println!("  {:>4}  {:28}  {}", "Id", "Name", "Kind");
    println!("  {:>4}  {:28}  {}", "--", "----", "----");

    for dest in destinations {
        let name = dest.to_string();
        println!(
            "  {:>4}  {:28}  {}",
            dest.to_raw(),
            name,
            poly_label(dest.is_poly())
        );
    }

    Ok(())
}
