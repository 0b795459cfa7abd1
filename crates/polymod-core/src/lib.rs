//! Polymod Core - real-time modulation routing for polyphonic synthesizers
//!
//! This crate routes scalar modulation sources (envelopes, LFOs, oscillator
//! outputs, MIDI-derived values) onto the destination parameters of every
//! synthesis stage, once per audio block, with bounded, allocation-free,
//! lock-free cost on the audio thread.
//!
//! # Core Components
//!
//! ## Identifiers
//!
//! - [`SourceId`] / [`DestinationId`] - Tagged, range-checked slot identifiers
//! - [`VoiceSource`] / [`GlobalSource`] - Per-voice and shared sources
//! - [`VoiceDest`] / [`GlobalDest`] - Per-voice and shared destinations
//!
//! ## Storage
//!
//! - [`SignalRegistry`] - Flat storage for every source and destination slot
//!
//! ## Routing
//!
//! - [`ModRow`] - One source, two destinations, optional scale source
//! - [`ModMatrix`] - Fixed, ordered set of rows applied once per block
//! - [`RenderSelection`] - Which expensive shared sources are consumed
//! - [`SharedRouting`] - Lock-free configuration handoff to the audio thread
//!
//! ## Producers
//!
//! - [`VoiceRandom`] - Explicitly seeded per-voice random source
//!
//! # Example
//!
//! ```rust
//! use polymod_core::{
//!     DestinationId, FilterParam, FilterUnit, GlobalSource, ModMatrix, SignalRegistry, SourceId,
//!     VoiceDest, VoiceSource,
//! };
//!
//! let mut registry: SignalRegistry<4> = SignalRegistry::new();
//! let mut matrix: ModMatrix = ModMatrix::new();
//! matrix.bind(&registry);
//!
//! // Filter envelope opens the cutoff, scaled by the mod wheel.
//! let cutoff = DestinationId::Voice(VoiceDest::Filter(FilterUnit::Filter1, FilterParam::Freq));
//! matrix.set_source(0, SourceId::Voice(VoiceSource::Adsr2));
//! matrix.set_destination_2(0, cutoff);
//! matrix.set_amount_2(0, 0.8);
//! matrix.set_scale(0, SourceId::Global(GlobalSource::ModWheel));
//!
//! // Per block: producers write, the matrix routes, consumers read.
//! registry.sources_mut().set_all_voices(VoiceSource::Adsr2, 1.0);
//! registry.sources_mut().set_global(GlobalSource::ModWheel, 0.5);
//! matrix.apply_modulation(&mut registry);
//!
//! assert!((registry.destinations().get(cutoff, 3) - 0.4).abs() < 1e-6);
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc` for the render
//! observer). Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! polymod-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: `apply_modulation` never allocates, locks, or fails
//! - **Typed slots**: no raw integer indices past the configuration boundary
//! - **Non-owning**: rows hold resolved slot references, the engine owns storage

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod ids;
pub mod matrix;
pub mod random;
pub mod registry;
pub mod render;
pub mod row;
pub mod shared;

// Re-export main types at crate root
pub use ids::{
    AdsrParam, AmpParam, ArpParam, ChorusParam, DelayParam, DestinationId, DistortionParam,
    EnvelopeUnit, FilterParam, FilterUnit, FlangerParam, GlobalDest, GlobalSource, IdError,
    LfoUnit, MiscParam, OscParam, OscUnit, PhaserParam, SourceId, VoiceDest, VoiceSource,
    XyParam,
};
pub use matrix::{MOD_MATRIX_ROWS, ModMatrix};
pub use random::VoiceRandom;
pub use registry::{DestinationSlots, MAX_VOICES, RegistryHandle, SignalRegistry, SourceSlots};
pub use render::{AtomicRenderSelection, RenderSelection, RenderSelectionObserver, RenderSource};
pub use row::{ModRow, RowSettings};
pub use shared::{SharedRouting, SharedRow};
