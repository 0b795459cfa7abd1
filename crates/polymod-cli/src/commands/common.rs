//! Shared utilities for CLI commands.

use std::path::Path;

use polymod_config::RoutingConfig;
use polymod_core::SourceId;

/// A `--set` argument: a source value, optionally for a single voice.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceAssignment {
    pub source: SourceId,
    pub voice: Option<usize>,
    pub value: f32,
}

/// Parse `name=value` or `name@voice=value` for clap's `value_parser`.
///
/// Without `@voice`, a per-voice source is set in every voice.
pub fn parse_source_assignment(s: &str) -> Result<SourceAssignment, String> {
    let (target, value) = s.split_once('=').ok_or_else(|| {
        format!("Invalid assignment: '{s}' (expected name=value or name@voice=value)")
    })?;

    let (name, voice) = match target.split_once('@') {
        Some((name, voice)) => {
            let voice = voice
                .parse::<usize>()
                .map_err(|_| format!("Invalid voice index '{voice}' in '{s}'"))?;
            (name, Some(voice))
        }
        None => (target, None),
    };

    let source = name
        .parse::<SourceId>()
        .map_err(|_| format!("Unknown source '{name}' (see `polymod sources`)"))?;
    if source.is_none() {
        return Err(format!("Cannot assign a value to '{name}'"));
    }
    if voice.is_some() && !source.is_poly() {
        return Err(format!("Source '{name}' is global and has no voices"));
    }

    let value = value
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("Invalid value '{value}' in '{s}'"))?;

    Ok(SourceAssignment {
        source,
        voice,
        value,
    })
}

/// Load a routing file, naming the file in the error.
pub fn load_routing(path: &Path) -> anyhow::Result<RoutingConfig> {
    RoutingConfig::load(path)
        .map_err(|e| anyhow::anyhow!("Could not load routing '{}': {}", path.display(), e))
}

/// Label for the polyphony of a slot.
pub fn poly_label(poly: bool) -> &'static str {
    if poly { "poly" } else { "mono" }
}
