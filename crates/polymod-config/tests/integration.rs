//! Integration tests for polymod-config.
//!
//! These tests load routing files from disk and drive a bound matrix with
//! them, directly and through the shared mirror.

use std::fs;

use polymod_config::{ConfigError, RoutingConfig, ValidationError};
use polymod_core::{
    DelayParam, DestinationId, FilterParam, FilterUnit, GlobalDest, GlobalSource, ModMatrix,
    OscParam, OscUnit, RenderSource, SharedRouting, SignalRegistry, SourceId, VoiceDest,
    VoiceSource,
};
use tempfile::TempDir;

const VOICES: usize = 4;

const PATCH: &str = r#"
# Vibrato on the wheel, envelope sweep scaled by velocity
[[route]]
row = 0
source = "global_lfo"
destination_1 = "osc1.pitch_linear"
amount_1 = 0.2

[[route]]
row = 3
source = "adsr2"
destination_1 = "filter1.freq"
amount_1 = 0.5
destination_2 = "delay.time"
amount_2 = 0.25
scale = "midi_velocity"
"#;

fn write_patch(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("should write routing file");
    path
}

#[test]
fn load_file_and_drive_matrix() {
    let dir = TempDir::new().unwrap();
    let path = write_patch(&dir, "patch.toml", PATCH);

    let config = RoutingConfig::load(&path).expect("should load routing file");
    assert_eq!(config.len(), 2);

    let mut registry: SignalRegistry<VOICES> = SignalRegistry::new();
    let mut matrix: ModMatrix = ModMatrix::new();
    matrix.bind(&registry);
    config.apply(&mut matrix).expect("routing should be valid");

    registry.sources_mut().set_global(GlobalSource::GlobalLfo, 0.5);
    registry.sources_mut().set_all_voices(VoiceSource::Adsr2, 1.0);
    registry.sources_mut().set_all_voices(VoiceSource::MidiVelocity, 0.5);
    matrix.set_most_recent_voice(2);
    matrix.apply_modulation(&mut registry);

    let pitch = DestinationId::Voice(VoiceDest::Osc(OscUnit::Osc1, OscParam::PitchLinear));
    let cutoff = DestinationId::Voice(VoiceDest::Filter(FilterUnit::Filter1, FilterParam::Freq));
    let time = DestinationId::Global(GlobalDest::Delay(DelayParam::Time));
    for voice in 0..VOICES {
        assert!((registry.destinations().get(pitch, voice) - 0.1).abs() < 1e-6);
        assert_eq!(registry.destinations().get(cutoff, voice), 0.5);
    }
    assert_eq!(registry.destinations().get(time, 0), 0.125);

    let selection = matrix.render_selection();
    assert!(selection.is_selected(RenderSource::GlobalLfo));
    assert!(!selection.is_selected(RenderSource::ModEnvelope));
}

#[test]
fn publish_reaches_matrix_through_sync() {
    let config = RoutingConfig::from_toml(PATCH).unwrap();
    let shared: SharedRouting = SharedRouting::new();
    config.publish(&shared).expect("routing should be valid");

    let mut matrix: ModMatrix = ModMatrix::new();
    assert!(matrix.sync(&shared));
    assert_eq!(matrix.active_row_count(), 2);
    assert_eq!(
        matrix.row(3).map(|row| row.scale()),
        Some(SourceId::Voice(VoiceSource::MidiVelocity))
    );

    // Nothing new to pull
    assert!(!matrix.sync(&shared));
}

#[test]
fn republishing_resets_dropped_routes() {
    let shared: SharedRouting = SharedRouting::new();
    RoutingConfig::from_toml(PATCH)
        .unwrap()
        .publish(&shared)
        .unwrap();

    let mut matrix: ModMatrix = ModMatrix::new();
    matrix.sync(&shared);
    assert_eq!(matrix.active_row_count(), 2);

    RoutingConfig::new().publish(&shared).unwrap();
    assert!(matrix.sync(&shared));
    assert_eq!(matrix.active_row_count(), 0);
}

#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.toml");

    let err = RoutingConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_patch(&dir, "broken.toml", "[[route]\nrow = 0\n");

    assert!(matches!(
        RoutingConfig::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

#[test]
fn invalid_routes_are_reported_together() {
    let dir = TempDir::new().unwrap();
    let path = write_patch(
        &dir,
        "invalid.toml",
        r#"
[[route]]
row = 0
source = "lfo4"
destination_1 = "osc1.pitch_linear"
amount_1 = 0.5

[[route]]
row = 9
source = "lfo1"
"#,
    );

    let config = RoutingConfig::load(&path).unwrap();
    let err = config.validate(9).unwrap_err();
    let ValidationError::Multiple(errors) = err else {
        panic!("expected multiple errors, got {err:?}");
    };
    assert_eq!(
        errors,
        vec![
            ValidationError::UnknownSource {
                row: 0,
                field: "source",
                id: "lfo4".to_string(),
            },
            ValidationError::RowOutOfRange { row: 9, rows: 9 },
        ]
    );

    let shared: SharedRouting = SharedRouting::new();
    assert!(config.publish(&shared).is_err());
    assert_eq!(shared.row(0).map(|row| row.sequence()), Some(0));
}
