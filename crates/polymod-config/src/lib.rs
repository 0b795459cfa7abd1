//! Routing descriptions for the polymod modulation matrix.
//!
//! This crate loads TOML routing files, validates them against a matrix,
//! and applies them either directly to a [`ModMatrix`](polymod_core::ModMatrix)
//! or through a [`SharedRouting`](polymod_core::SharedRouting) mirror for a
//! running audio thread.
//!
//! # Features
//!
//! - **Names or raw ids**: `"lfo1"` and `9` address the same source
//! - **Validation**: every problem in a file is reported at once
//! - **Clamping**: depths outside their nominal range are clamped with a warning
//!
//! # Example
//!
//! ```rust
//! use polymod_config::RoutingConfig;
//! use polymod_core::{GlobalSource, ModMatrix, SignalRegistry, VoiceDest};
//!
//! let config = RoutingConfig::from_toml(
//!     r#"
//!     [[route]]
//!     row = 0
//!     source = "mod_wheel"
//!     destination_1 = "pitch_linear"
//!     amount_1 = 0.5
//!     "#,
//! )
//! .unwrap();
//!
//! let mut registry: SignalRegistry<4> = SignalRegistry::new();
//! let mut matrix: ModMatrix = ModMatrix::new();
//! matrix.bind(&registry);
//! config.apply(&mut matrix).unwrap();
//!
//! registry.sources_mut().set_global(GlobalSource::ModWheel, 1.0);
//! matrix.apply_modulation(&mut registry);
//! assert_eq!(registry.destinations().voice(3, VoiceDest::PitchLinear), 0.5);
//! ```

mod error;
mod routing;

/// Routing validation and amount clamping.
pub mod validation;

pub use error::ConfigError;
pub use routing::{IdSpec, RouteConfig, RoutingConfig};
pub use validation::{ValidationError, ValidationResult};
