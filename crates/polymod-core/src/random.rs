//! Per-voice random source producer.
//!
//! Draws one value per note-on into the voice's [`VoiceSource::Random`]
//! slot. The generator state lives in the producer and is seeded
//! explicitly, so two producers with the same seed emit identical values.

use crate::ids::VoiceSource;
use crate::registry::SourceSlots;

const DEFAULT_SEED: u32 = 0x1234_5678;

/// Seeded xorshift32 generator feeding [`VoiceSource::Random`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceRandom {
    state: u32,
}

impl Default for VoiceRandom {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl VoiceRandom {
    /// Create a generator. A zero seed (a fixed point of xorshift) is replaced
    /// by a non-zero default.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { DEFAULT_SEED } else { seed },
        }
    }

    /// Next value in [-1, 1].
    pub fn next_bipolar(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;

        (x as i32 as f32) / (i32::MAX as f32)
    }

    /// Draw a fresh value for `voice` and write it into the source slots.
    ///
    /// Returns the value written. Out-of-range voices still advance the
    /// generator but write nothing.
    pub fn trigger<const VOICES: usize>(
        &mut self,
        voice: usize,
        sources: &mut SourceSlots<VOICES>,
    ) -> f32 {
        let value = self.next_bipolar();
        sources.set_voice(voice, VoiceSource::Random, value);
        value
    }
}
