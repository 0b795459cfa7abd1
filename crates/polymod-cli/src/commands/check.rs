//! Routing file validation command.

use std::path::PathBuf;

use clap::Args;
use polymod_config::ValidationError;
use polymod_core::{MOD_MATRIX_ROWS, RowSettings};

use super::common::load_routing;

#[derive(Args)]
pub struct CheckArgs {
    /// Routing file (TOML)
    file: PathBuf,

    /// Number of rows in the target matrix
    #[arg(long, default_value_t = MOD_MATRIX_ROWS)]
    rows: usize,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,
}

pub fn run(args: &CheckArgs) -> anyhow::Result<()> {
    let config = load_routing(&args.file)?;

    let rows = match config.resolve(args.rows) {
        Ok(rows) => rows,
        Err(ValidationError::Multiple(errors)) => {
            for error in &errors {
                eprintln!("  {error}");
            }
            anyhow::bail!(
                "{} errors in routing '{}'",
                errors.len(),
                args.file.display()
            );
        }
        Err(error) => {
            anyhow::bail!("Invalid routing '{}': {}", args.file.display(), error);
        }
    };

    if args.quiet {
        return Ok(());
    }

    println!(
        "{}: {} routes, {} of {} rows active",
        args.file.display(),
        config.len(),
        rows.iter().filter(|row| row.is_active()).count(),
        args.rows
    );
    for (index, row) in rows.iter().enumerate().filter(|(_, row)| row.is_active()) {
        println!("  row {index}: {}", describe(row));
    }

    Ok(())
}

/// One-line summary of a row.
///
/// For example `lfo1 -> osc1.vol x 0.50, delay.time x 0.25 (scale mod_wheel x 1.00)`.
pub fn describe(row: &RowSettings) -> String {
    let mut out = format!("{} -> {} x {:.2}", row.source, row.destination_1, row.amount_1);
    if !row.destination_2.is_none() {
        out.push_str(&format!(
            ", {} x {:.2} (scale {} x {:.2})",
            row.destination_2, row.amount_2, row.scale, row.scale_amount
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use polymod_core::{DestinationId, GlobalSource, SourceId, VoiceDest, VoiceSource};

    #[test]
    fn describe_single_destination() {
        let row = RowSettings {
            source: SourceId::Voice(VoiceSource::Lfo1),
            destination_1: DestinationId::Voice(VoiceDest::PitchLinear),
            amount_1: 0.5,
            ..RowSettings::default()
        };
        assert_eq!(describe(&row), "lfo1 -> pitch_linear x 0.50");
    }

    #[test]
    fn describe_scaled_destination() {
        let row = RowSettings {
            source: SourceId::Global(GlobalSource::GlobalLfo),
            destination_2: DestinationId::Voice(VoiceDest::PitchExponential),
            amount_2: -0.25,
            scale: SourceId::Global(GlobalSource::ModWheel),
            ..RowSettings::default()
        };
        assert_eq!(
            describe(&row),
            "global_lfo -> none x 0.00, pitch_exponential x -0.25 (scale mod_wheel x 1.00)"
        );
    }
}
