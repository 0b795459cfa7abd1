//! Offline matrix driver: apply a routing file to fixed source values.

use std::path::PathBuf;

use clap::Args;
use polymod_core::{DestinationId, MAX_VOICES, ModMatrix, SignalRegistry, VoiceRandom};

use super::common::{SourceAssignment, load_routing, parse_source_assignment};

#[derive(Args)]
pub struct RunArgs {
    /// Routing file (TOML)
    file: PathBuf,

    /// Source value (name=value, or name@voice=value for one voice)
    #[arg(
        short,
        long = "set",
        value_name = "SOURCE=VALUE",
        value_parser = parse_source_assignment
    )]
    sets: Vec<SourceAssignment>,

    /// Most recently triggered voice (feeds per-voice sources into global destinations)
    #[arg(long, default_value = "0")]
    voice: usize,

    /// Number of blocks to run
    #[arg(long, default_value = "1")]
    blocks: usize,

    /// Trigger the per-voice random source in every voice with this seed
    #[arg(long, value_name = "SEED")]
    random_seed: Option<u32>,
}

pub fn run(args: &RunArgs) -> anyhow::Result<()> {
    if args.voice >= MAX_VOICES {
        anyhow::bail!("Voice {} out of range (0..{})", args.voice, MAX_VOICES);
    }
    for set in &args.sets {
        if let Some(voice) = set.voice
            && voice >= MAX_VOICES
        {
            anyhow::bail!(
                "Voice {} for '{}' out of range (0..{})",
                voice,
                set.source,
                MAX_VOICES
            );
        }
    }

    let config = load_routing(&args.file)?;

    let mut registry: SignalRegistry = SignalRegistry::new();
    let mut matrix: ModMatrix = ModMatrix::new();
    matrix.bind(&registry);
    config
        .apply(&mut matrix)
        .map_err(|e| anyhow::anyhow!("Invalid routing '{}': {}", args.file.display(), e))?;
    matrix.set_most_recent_voice(args.voice);

    if let Some(seed) = args.random_seed {
        let mut random = VoiceRandom::new(seed);
        for voice in 0..MAX_VOICES {
            random.trigger(voice, registry.sources_mut());
        }
    }
    for set in &args.sets {
        match set.voice {
            Some(voice) => registry.sources_mut().set(set.source, voice, set.value),
            None => {
                for voice in 0..MAX_VOICES {
                    registry.sources_mut().set(set.source, voice, set.value);
                }
            }
        }
    }

    for _ in 0..args.blocks {
        matrix.apply_modulation(&mut registry);
    }
    tracing::info!(
        rows = matrix.active_row_count(),
        blocks = args.blocks,
        "modulation applied"
    );

    let selection = matrix.render_selection();
    let rendered: Vec<&str> = selection.iter().map(|source| source.name()).collect();
    println!(
        "render: {}",
        if rendered.is_empty() {
            "-".to_string()
        } else {
            rendered.join(", ")
        }
    );

    let mut printed = 0;
    for dest in DestinationId::iter() {
        if let Some(line) = format_destination(&registry, dest) {
            println!("{line}");
            printed += 1;
        }
    }
    if printed == 0 {
        println!("(all destinations at 0)");
    }

    Ok(())
}

/// One output line for a destination, or `None` if it is zero everywhere.
///
/// Per-voice destinations holding the same value in every voice collapse
/// to a single `all` line.
fn format_destination<const VOICES: usize>(
    registry: &SignalRegistry<VOICES>,
    dest: DestinationId,
) -> Option<String> {
    let name = dest.to_string();
    let destinations = registry.destinations();

    if !dest.is_poly() {
        let value = destinations.get(dest, 0);
        return (value != 0.0).then(|| format!("{name:28}  global  {value:+.6}"));
    }

    let values: Vec<f32> = (0..VOICES)
        .map(|voice| destinations.get(dest, voice))
        .collect();
    if values.iter().all(|&v| v == 0.0) {
        return None;
    }
    if values.iter().all(|&v| v == values[0]) {
        return Some(format!("{name:28}  all     {:+.6}", values[0]));
    }

    let per_voice: Vec<String> = values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v != 0.0)
        .map(|(voice, v)| format!("{voice}:{v:+.6}"))
        .collect();
    Some(format!("{name:28}  voices  {}", per_voice.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polymod_core::{GlobalDest, MiscParam, VoiceDest};

    #[test]
    fn zero_destination_prints_nothing() {
        let registry: SignalRegistry<2> = SignalRegistry::new();
        assert_eq!(
            format_destination(&registry, DestinationId::Voice(VoiceDest::PitchLinear)),
            None
        );
        assert_eq!(
            format_destination(
                &registry,
                DestinationId::Global(GlobalDest::Misc(MiscParam::Glide))
            ),
            None
        );
    }
}
