//! Signal registry: flat, pre-allocated storage for every modulation slot.
//!
//! The registry is owned by the surrounding synthesis engine. Producers
//! (oscillators, envelopes, LFOs, the MIDI decoder) write source slots,
//! the [`ModMatrix`](crate::ModMatrix) accumulates into destination slots,
//! and consumers (oscillators, filters, amp, effects) read destination slots
//! after the matrix has run for the block.
//!
//! Storage is fixed at construction: `VOICES` per-voice blocks plus one
//! global block, for sources and destinations alike. Nothing is ever
//! reallocated, so slot addresses stay valid for the registry's lifetime.

use crate::ids::{DestinationId, GlobalDest, GlobalSource, SourceId, VoiceDest, VoiceSource};

/// Maximum polyphony of the default registry.
pub const MAX_VOICES: usize = 24;

/// Non-owning binding token for a registry.
///
/// Rows and the matrix store a handle rather than a reference; the registry
/// itself is passed in when modulation is applied. A handle only matches a
/// registry with the same polyphony.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryHandle {
    voices: usize,
}

impl RegistryHandle {
    /// Polyphony of the bound registry.
    pub const fn voices(self) -> usize {
        self.voices
    }
}

/// Resolved reference to one slot group.
///
/// `Voice` addresses the same slot in every voice's block; `Global`
/// addresses a single shared slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum SlotRef {
    #[default]
    Off,
    Global(usize),
    Voice(usize),
}

impl SlotRef {
    pub(crate) const fn is_off(self) -> bool {
        matches!(self, Self::Off)
    }

    pub(crate) const fn is_poly(self) -> bool {
        matches!(self, Self::Voice(_))
    }
}

impl From<SourceId> for SlotRef {
    fn from(id: SourceId) -> Self {
        match id {
            SourceId::None => Self::Off,
            SourceId::Voice(source) => Self::Voice(source.index()),
            SourceId::Global(source) => Self::Global(source.index()),
        }
    }
}

impl From<DestinationId> for SlotRef {
    fn from(id: DestinationId) -> Self {
        match id {
            DestinationId::None => Self::Off,
            DestinationId::Voice(dest) => Self::Voice(dest.slot()),
            DestinationId::Global(dest) => Self::Global(dest.slot()),
        }
    }
}

/// Source slot storage.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceSlots<const VOICES: usize> {
    voice: [[f32; VoiceSource::COUNT]; VOICES],
    global: [f32; GlobalSource::COUNT],
}

impl<const VOICES: usize> Default for SourceSlots<VOICES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const VOICES: usize> SourceSlots<VOICES> {
    /// All sources at zero, except [`GlobalSource::Constant`] at 1.0.
    pub fn new() -> Self {
        let mut global = [0.0; GlobalSource::COUNT];
        global[GlobalSource::Constant.index()] = 1.0;
        Self {
            voice: [[0.0; VoiceSource::COUNT]; VOICES],
            global,
        }
    }

    /// Read a per-voice source. Out-of-range voices read as 0.
    #[inline]
    pub fn voice(&self, voice: usize, source: VoiceSource) -> f32 {
        self.voice.get(voice).map_or(0.0, |slots| slots[source.index()])
    }

    /// Write a per-voice source. Out-of-range voices are ignored.
    #[inline]
    pub fn set_voice(&mut self, voice: usize, source: VoiceSource, value: f32) {
        if let Some(slots) = self.voice.get_mut(voice) {
            slots[source.index()] = value;
        }
    }

    /// Write the same per-voice source in every voice.
    pub fn set_all_voices(&mut self, source: VoiceSource, value: f32) {
        for slots in &mut self.voice {
            slots[source.index()] = value;
        }
    }

    /// Read a global source.
    #[inline]
    pub fn global(&self, source: GlobalSource) -> f32 {
        self.global[source.index()]
    }

    /// Write a global source.
    #[inline]
    pub fn set_global(&mut self, source: GlobalSource, value: f32) {
        self.global[source.index()] = value;
    }

    /// Read any source as seen by `voice`. [`SourceId::None`] reads as 0.
    pub fn get(&self, id: SourceId, voice: usize) -> f32 {
        match id {
            SourceId::None => 0.0,
            SourceId::Voice(source) => self.voice(voice, source),
            SourceId::Global(source) => self.global(source),
        }
    }

    /// Write any source. Global sources ignore `voice`.
    pub fn set(&mut self, id: SourceId, voice: usize, value: f32) {
        match id {
            SourceId::None => {}
            SourceId::Voice(source) => self.set_voice(voice, source, value),
            SourceId::Global(source) => self.set_global(source, value),
        }
    }

    /// Reset every source slot except the constant to 0.
    pub fn zero_transient(&mut self) {
        for slots in &mut self.voice {
            slots.fill(0.0);
        }
        self.global.fill(0.0);
        self.global[GlobalSource::Constant.index()] = 1.0;
    }

    /// Reset one voice's per-voice sources (retrigger path).
    pub fn zero_voice(&mut self, voice: usize) {
        if let Some(slots) = self.voice.get_mut(voice) {
            slots.fill(0.0);
        }
    }

    #[inline]
    pub(crate) fn read(&self, slot: SlotRef, voice: usize) -> f32 {
        match slot {
            SlotRef::Off => 0.0,
            SlotRef::Global(index) => self.global[index],
            SlotRef::Voice(index) => self.voice[voice][index],
        }
    }
}

/// Destination slot storage.
#[derive(Clone, Debug, PartialEq)]
pub struct DestinationSlots<const VOICES: usize> {
    voice: [[f32; VoiceDest::COUNT]; VOICES],
    global: [f32; GlobalDest::COUNT],
}

impl<const VOICES: usize> Default for DestinationSlots<VOICES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const VOICES: usize> DestinationSlots<VOICES> {
    /// All destinations at 0.
    pub fn new() -> Self {
        Self {
            voice: [[0.0; VoiceDest::COUNT]; VOICES],
            global: [0.0; GlobalDest::COUNT],
        }
    }

    /// Read a per-voice destination. Out-of-range voices read as 0.
    #[inline]
    pub fn voice(&self, voice: usize, dest: VoiceDest) -> f32 {
        self.voice.get(voice).map_or(0.0, |slots| slots[dest.slot()])
    }

    /// Read a global destination.
    #[inline]
    pub fn global(&self, dest: GlobalDest) -> f32 {
        self.global[dest.slot()]
    }

    /// Read any destination as seen by `voice`. [`DestinationId::None`] reads as 0.
    pub fn get(&self, id: DestinationId, voice: usize) -> f32 {
        match id {
            DestinationId::None => 0.0,
            DestinationId::Voice(dest) => self.voice(voice, dest),
            DestinationId::Global(dest) => self.global(dest),
        }
    }

    /// All destination slots of one voice, in [`VoiceDest::slot`] order.
    pub fn voice_slots(&self, voice: usize) -> Option<&[f32; VoiceDest::COUNT]> {
        self.voice.get(voice)
    }

    /// All global destination slots, in [`GlobalDest::slot`] order.
    pub fn global_slots(&self) -> &[f32; GlobalDest::COUNT] {
        &self.global
    }

    /// Reset every destination slot to the neutral accumulation value.
    pub fn zero(&mut self) {
        for slots in &mut self.voice {
            slots.fill(0.0);
        }
        self.global.fill(0.0);
    }

    /// `true` if every slot holds exactly +0.0.
    pub fn is_zeroed(&self) -> bool {
        self.voice
            .iter()
            .flatten()
            .chain(self.global.iter())
            .all(|v| v.to_bits() == 0)
    }

    #[inline]
    pub(crate) fn add_voice(&mut self, voice: usize, slot: usize, value: f32) {
        self.voice[voice][slot] += value;
    }

    #[inline]
    pub(crate) fn add_global(&mut self, slot: usize, value: f32) {
        self.global[slot] += value;
    }
}

/// Every source and destination slot of the synthesis engine.
///
/// # Example
///
/// ```rust
/// use polymod_core::{GlobalSource, SignalRegistry, VoiceSource};
///
/// let mut registry: SignalRegistry<4> = SignalRegistry::new();
/// registry.sources_mut().set_global(GlobalSource::ModWheel, 0.25);
/// registry.sources_mut().set_voice(2, VoiceSource::Lfo1, -0.5);
///
/// assert_eq!(registry.sources().global(GlobalSource::Constant), 1.0);
/// assert_eq!(registry.sources().voice(2, VoiceSource::Lfo1), -0.5);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignalRegistry<const VOICES: usize = MAX_VOICES> {
    sources: SourceSlots<VOICES>,
    destinations: DestinationSlots<VOICES>,
}

impl<const VOICES: usize> SignalRegistry<VOICES> {
    /// Polyphony of this registry.
    pub const POLYPHONY: usize = VOICES;

    /// Create a registry with zeroed slots.
    pub fn new() -> Self {
        Self {
            sources: SourceSlots::new(),
            destinations: DestinationSlots::new(),
        }
    }

    /// Binding token for rows and matrices.
    pub const fn handle(&self) -> RegistryHandle {
        RegistryHandle { voices: VOICES }
    }

    /// Source slots (read side).
    pub fn sources(&self) -> &SourceSlots<VOICES> {
        &self.sources
    }

    /// Source slots, for producers.
    pub fn sources_mut(&mut self) -> &mut SourceSlots<VOICES> {
        &mut self.sources
    }

    /// Destination slots, for consumers.
    pub fn destinations(&self) -> &DestinationSlots<VOICES> {
        &self.destinations
    }

    /// Destination slots (write side).
    pub fn destinations_mut(&mut self) -> &mut DestinationSlots<VOICES> {
        &mut self.destinations
    }

    /// Borrow sources for reading and destinations for writing at once.
    pub fn split_mut(&mut self) -> (&SourceSlots<VOICES>, &mut DestinationSlots<VOICES>) {
        (&self.sources, &mut self.destinations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AmpParam, DelayParam};

    #[test]
    fn constant_source_starts_at_one() {
        let slots: SourceSlots<2> = SourceSlots::new();
        assert_eq!(slots.global(GlobalSource::Constant), 1.0);
        assert_eq!(slots.get(SourceId::Global(GlobalSource::Constant), 0), 1.0);
    }

    #[test]
    fn zero_transient_keeps_constant() {
        let mut slots: SourceSlots<2> = SourceSlots::new();
        slots.set_voice(1, VoiceSource::Random, 0.7);
        slots.set_global(GlobalSource::ModWheel, 0.3);

        slots.zero_transient();

        assert_eq!(slots.voice(1, VoiceSource::Random), 0.0);
        assert_eq!(slots.global(GlobalSource::ModWheel), 0.0);
        assert_eq!(slots.global(GlobalSource::Constant), 1.0);
    }

    #[test]
    fn zero_voice_only_touches_one_voice() {
        let mut slots: SourceSlots<3> = SourceSlots::new();
        slots.set_all_voices(VoiceSource::Random, 0.4);

        slots.zero_voice(1);

        assert_eq!(slots.voice(0, VoiceSource::Random), 0.4);
        assert_eq!(slots.voice(1, VoiceSource::Random), 0.0);
        assert_eq!(slots.voice(2, VoiceSource::Random), 0.4);
    }

    #[test]
    fn out_of_range_voice_is_harmless() {
        let mut slots: SourceSlots<2> = SourceSlots::new();
        slots.set_voice(7, VoiceSource::Lfo1, 1.0);
        assert_eq!(slots.voice(7, VoiceSource::Lfo1), 0.0);

        let dests: DestinationSlots<2> = DestinationSlots::new();
        assert_eq!(dests.voice(9, VoiceDest::PitchLinear), 0.0);
        assert!(dests.voice_slots(9).is_none());
    }

    #[test]
    fn destinations_accumulate_until_zeroed() {
        let mut dests: DestinationSlots<2> = DestinationSlots::new();
        let gain = VoiceDest::Amp(AmpParam::Gain);
        let time = GlobalDest::Delay(DelayParam::Time);

        dests.add_voice(1, gain.slot(), 0.25);
        dests.add_voice(1, gain.slot(), 0.25);
        dests.add_global(time.slot(), -0.5);

        assert_eq!(dests.voice(1, gain), 0.5);
        assert_eq!(dests.get(DestinationId::Global(time), 0), -0.5);
        assert!(!dests.is_zeroed());

        dests.zero();
        assert!(dests.is_zeroed());
    }

    #[test]
    fn handle_reports_polyphony() {
        let registry: SignalRegistry<6> = SignalRegistry::new();
        assert_eq!(registry.handle().voices(), 6);
        assert_eq!(SignalRegistry::<6>::POLYPHONY, 6);
    }

    #[test]
    fn slot_refs_classify_poly() {
        assert!(SlotRef::from(SourceId::Voice(VoiceSource::Lfo2)).is_poly());
        assert!(!SlotRef::from(SourceId::Global(GlobalSource::X)).is_poly());
        assert!(SlotRef::from(DestinationId::None).is_off());
    }
}
