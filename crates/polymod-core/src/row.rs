//! A single modulation row: one source, two destinations, one scale source.
//!
//! ```text
//!                 ┌── × amount_1 ────────────────────────────► destination_1
//!  source ────────┤
//!                 └── × amount_2 ── × scale factor ──────────► destination_2
//!                                          ▲
//!  scale source ──── × scale_amount ───────┘
//! ```
//!
//! All resolution (which slot, mono or poly) happens in the setters, on the
//! control side. [`ModRow::apply`] only reads resolved slot references and
//! adds into destination slots; it never allocates, locks, or fails.

use crate::ids::{DestinationId, GlobalSource, SourceId};
use crate::registry::{DestinationSlots, RegistryHandle, SignalRegistry, SlotRef, SourceSlots};
use crate::render::RenderSource;

/// The configurable part of a row, as plain values.
///
/// Used to move a complete row configuration across threads and through the
/// configuration boundary in one piece.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowSettings {
    /// Primary source.
    pub source: SourceId,
    /// First destination.
    pub destination_1: DestinationId,
    /// Second destination (scaled).
    pub destination_2: DestinationId,
    /// Scale source for the second destination; `None` reads the constant.
    pub scale: SourceId,
    /// Depth for the first destination, nominally -1.0 to 1.0.
    pub amount_1: f32,
    /// Depth for the second destination, nominally -1.0 to 1.0.
    pub amount_2: f32,
    /// How strongly the scale source gates the second destination, nominally 0.0 to 1.0.
    pub scale_amount: f32,
}

impl Default for RowSettings {
    fn default() -> Self {
        Self {
            source: SourceId::None,
            destination_1: DestinationId::None,
            destination_2: DestinationId::None,
            scale: SourceId::None,
            amount_1: 0.0,
            amount_2: 0.0,
            scale_amount: 1.0,
        }
    }
}

impl RowSettings {
    /// `true` if the first destination is set and its amount is non-zero.
    pub fn is_active_1(&self) -> bool {
        !self.destination_1.is_none() && self.amount_1 != 0.0
    }

    /// `true` if the second destination is set and its amount is non-zero.
    pub fn is_active_2(&self) -> bool {
        !self.destination_2.is_none() && self.amount_2 != 0.0
    }

    /// `true` if either destination slot would contribute.
    pub fn is_active(&self) -> bool {
        self.is_active_1() || self.is_active_2()
    }
}

/// One routing unit of the [`ModMatrix`](crate::ModMatrix).
///
/// The contribution of a row, per voice where it applies, is:
///
/// - destination 1: `source * amount_1`
/// - destination 2: `source * amount_2 * factor`, with
///   `factor = scale * scale_amount + (1 - scale_amount)`
///
/// With the default `scale_amount` of 1.0 the factor is exactly the live
/// scale value, so a scale source sitting at 0 silences destination 2.
///
/// # Broadcasting
///
/// | source | destination | behavior                                       |
/// |--------|-------------|------------------------------------------------|
/// | mono   | poly        | same value added to every voice                |
/// | poly   | poly        | voice `v` reads voice `v`                      |
/// | poly   | mono        | only the most-recent voice contributes         |
/// | mono   | mono        | single slot                                    |
#[derive(Clone, Debug, PartialEq)]
pub struct ModRow {
    handle: Option<RegistryHandle>,
    most_recent_voice: usize,

    source: SourceId,
    destination_1: DestinationId,
    destination_2: DestinationId,
    scale: SourceId,

    amount_1: f32,
    amount_2: f32,
    scale_amount: f32,

    active_1: bool,
    active_2: bool,

    source_ref: SlotRef,
    destination_1_ref: SlotRef,
    destination_2_ref: SlotRef,
    scale_ref: SlotRef,
}

impl Default for ModRow {
    fn default() -> Self {
        Self::new()
    }
}

impl ModRow {
    /// Create an unbound, inactive row.
    pub fn new() -> Self {
        Self {
            handle: None,
            most_recent_voice: 0,
            source: SourceId::None,
            destination_1: DestinationId::None,
            destination_2: DestinationId::None,
            scale: SourceId::None,
            amount_1: 0.0,
            amount_2: 0.0,
            scale_amount: 1.0,
            active_1: false,
            active_2: false,
            source_ref: SlotRef::Off,
            destination_1_ref: SlotRef::Off,
            destination_2_ref: SlotRef::Off,
            scale_ref: SlotRef::from(SourceId::Global(GlobalSource::Constant)),
        }
    }

    /// Bind the row to a registry. Idempotent.
    pub fn bind<const VOICES: usize>(&mut self, registry: &SignalRegistry<VOICES>) {
        self.bind_handle(registry.handle());
    }

    pub(crate) fn bind_handle(&mut self, handle: RegistryHandle) {
        self.handle = Some(handle);
    }

    /// Handle of the bound registry, if any.
    pub fn handle(&self) -> Option<RegistryHandle> {
        self.handle
    }

    /// Select the primary source. [`SourceId::None`] silences the row.
    pub fn set_source(&mut self, source: SourceId) {
        self.source = source;
        self.source_ref = SlotRef::from(source);
        self.recompute_active();
    }

    /// Select the first destination. [`DestinationId::None`] disables it.
    pub fn set_destination_1(&mut self, destination: DestinationId) {
        self.destination_1 = destination;
        self.destination_1_ref = SlotRef::from(destination);
        self.recompute_active();
    }

    /// Select the second destination. [`DestinationId::None`] disables it.
    pub fn set_destination_2(&mut self, destination: DestinationId) {
        self.destination_2 = destination;
        self.destination_2_ref = SlotRef::from(destination);
        self.recompute_active();
    }

    /// Select the scale source. [`SourceId::None`] falls back to the constant 1.0.
    pub fn set_scale(&mut self, scale: SourceId) {
        self.scale = scale;
        self.scale_ref = match scale {
            SourceId::None => SlotRef::from(SourceId::Global(GlobalSource::Constant)),
            id => SlotRef::from(id),
        };
        self.recompute_active();
    }

    /// Depth for the first destination. Not clamped.
    pub fn set_amount_1(&mut self, amount: f32) {
        self.amount_1 = amount;
        self.recompute_active();
    }

    /// Depth for the second destination. Not clamped.
    pub fn set_amount_2(&mut self, amount: f32) {
        self.amount_2 = amount;
        self.recompute_active();
    }

    /// Scale depth. Not clamped.
    pub fn set_scale_amount(&mut self, amount: f32) {
        self.scale_amount = amount;
        self.recompute_active();
    }

    /// Voice that stands in for per-voice sources routed to global destinations.
    pub fn set_most_recent_voice(&mut self, voice: usize) {
        self.most_recent_voice = voice;
    }

    /// Apply a full configuration at once.
    pub fn apply_settings(&mut self, settings: RowSettings) {
        self.source = settings.source;
        self.destination_1 = settings.destination_1;
        self.destination_2 = settings.destination_2;
        self.amount_1 = settings.amount_1;
        self.amount_2 = settings.amount_2;
        self.scale_amount = settings.scale_amount;
        self.source_ref = SlotRef::from(settings.source);
        self.destination_1_ref = SlotRef::from(settings.destination_1);
        self.destination_2_ref = SlotRef::from(settings.destination_2);
        // set_scale handles the constant fallback and recomputes activity.
        self.set_scale(settings.scale);
    }

    /// Current configuration.
    pub fn settings(&self) -> RowSettings {
        RowSettings {
            source: self.source,
            destination_1: self.destination_1,
            destination_2: self.destination_2,
            scale: self.scale,
            amount_1: self.amount_1,
            amount_2: self.amount_2,
            scale_amount: self.scale_amount,
        }
    }

    /// Derive the activity flags from the current configuration.
    ///
    /// Follows [`RowSettings::is_active_1`] and [`RowSettings::is_active_2`].
    /// Called by every setter; never needed per block.
    pub fn recompute_active(&mut self) {
        let settings = self.settings();
        self.active_1 = settings.is_active_1();
        self.active_2 = settings.is_active_2();
    }

    /// `true` if either destination slot is active.
    pub fn is_active(&self) -> bool {
        self.active_1 || self.active_2
    }

    /// `true` if the first destination slot is active.
    pub fn is_active_1(&self) -> bool {
        self.active_1
    }

    /// `true` if the second destination slot is active.
    pub fn is_active_2(&self) -> bool {
        self.active_2
    }

    /// Primary source.
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// First destination.
    pub fn destination_1(&self) -> DestinationId {
        self.destination_1
    }

    /// Second destination.
    pub fn destination_2(&self) -> DestinationId {
        self.destination_2
    }

    /// Scale source as configured (`None` when the constant is used).
    pub fn scale(&self) -> SourceId {
        self.scale
    }

    /// Depth for the first destination.
    pub fn amount_1(&self) -> f32 {
        self.amount_1
    }

    /// Depth for the second destination.
    pub fn amount_2(&self) -> f32 {
        self.amount_2
    }

    /// Scale depth.
    pub fn scale_amount(&self) -> f32 {
        self.scale_amount
    }

    /// Voice used for poly-to-mono routing.
    pub fn most_recent_voice(&self) -> usize {
        self.most_recent_voice
    }

    /// `true` if the primary source has one slot per voice.
    pub fn source_is_poly(&self) -> bool {
        self.source_ref.is_poly()
    }

    /// `true` if the first destination has one slot per voice.
    pub fn destination_1_is_poly(&self) -> bool {
        self.destination_1_ref.is_poly()
    }

    /// `true` if the second destination has one slot per voice.
    pub fn destination_2_is_poly(&self) -> bool {
        self.destination_2_ref.is_poly()
    }

    /// `true` if this row currently reads `source` as primary or scale source.
    ///
    /// The primary source counts while the row is active; the scale source
    /// counts while the second destination is active.
    pub fn uses(&self, source: RenderSource) -> bool {
        let id = source.source();
        (self.is_active() && self.source == id) || (self.active_2 && self.scale == id)
    }

    /// Add this row's contribution into the destination slots.
    ///
    /// Unbound rows, rows bound to a registry of different polyphony,
    /// inactive slots and unset sources are silently skipped.
    pub fn apply<const VOICES: usize>(
        &self,
        sources: &SourceSlots<VOICES>,
        destinations: &mut DestinationSlots<VOICES>,
    ) {
        if !self.is_active() || self.source_ref.is_off() || VOICES == 0 {
            return;
        }
        match self.handle {
            Some(handle) if handle.voices() == VOICES => {}
            _ => return,
        }

        let recent = self.most_recent_voice.min(VOICES - 1);

        if self.active_1 {
            self.accumulate(
                self.destination_1_ref,
                self.amount_1,
                None,
                recent,
                sources,
                destinations,
            );
        }
        if self.active_2 {
            self.accumulate(
                self.destination_2_ref,
                self.amount_2,
                Some(self.scale_ref),
                recent,
                sources,
                destinations,
            );
        }
    }

    #[inline]
    fn accumulate<const VOICES: usize>(
        &self,
        destination: SlotRef,
        amount: f32,
        scale: Option<SlotRef>,
        recent: usize,
        sources: &SourceSlots<VOICES>,
        destinations: &mut DestinationSlots<VOICES>,
    ) {
        let contribution = |voice: usize| {
            let value = sources.read(self.source_ref, voice) * amount;
            match scale {
                Some(scale) => value * self.scale_factor(sources.read(scale, voice)),
                None => value,
            }
        };

        match destination {
            SlotRef::Off => {}
            SlotRef::Global(slot) => destinations.add_global(slot, contribution(recent)),
            SlotRef::Voice(slot) => {
                for voice in 0..VOICES {
                    destinations.add_voice(voice, slot, contribution(voice));
                }
            }
        }
    }

    #[inline]
    fn scale_factor(&self, scale_value: f32) -> f32 {
        scale_value * self.scale_amount + (1.0 - self.scale_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{FilterParam, FilterUnit, GlobalDest, MiscParam, VoiceDest, VoiceSource};

    const VOICES: usize = 4;

    fn bound_row(registry: &SignalRegistry<VOICES>) -> ModRow {
        let mut row = ModRow::new();
        row.bind(registry);
        row
    }

    fn cutoff() -> DestinationId {
        DestinationId::Voice(VoiceDest::Filter(FilterUnit::Filter1, FilterParam::Freq))
    }

    fn master() -> DestinationId {
        DestinationId::Global(GlobalDest::Misc(MiscParam::Master))
    }

    #[test]
    fn new_row_is_inactive() {
        let row = ModRow::new();
        assert!(!row.is_active());
        assert_eq!(row.scale_amount(), 1.0);
        assert!(row.handle().is_none());
    }

    #[test]
    fn activity_requires_destination_and_amount() {
        let mut row = ModRow::new();
        row.set_amount_1(0.5);
        assert!(!row.is_active(), "no destination yet");

        row.set_destination_1(cutoff());
        assert!(row.is_active_1());

        row.set_amount_1(0.0);
        assert!(!row.is_active_1(), "zero amount deactivates");

        row.set_destination_2(master());
        row.set_amount_2(-0.3);
        assert!(row.is_active_2());
        assert!(row.is_active());

        row.set_destination_2(DestinationId::None);
        assert!(!row.is_active());
    }

    #[test]
    fn mono_source_broadcasts_to_every_voice() {
        let mut registry: SignalRegistry<VOICES> = SignalRegistry::new();
        registry
            .sources_mut()
            .set_global(GlobalSource::ModWheel, 0.5);

        let mut row = bound_row(&registry);
        row.set_source(SourceId::Global(GlobalSource::ModWheel));
        row.set_destination_1(cutoff());
        row.set_amount_1(0.5);

        let (sources, destinations) = registry.split_mut();
        row.apply(sources, destinations);

        for voice in 0..VOICES {
            assert_eq!(registry.destinations().get(cutoff(), voice), 0.25);
        }
    }

    #[test]
    fn poly_source_reads_matching_voice() {
        let mut registry: SignalRegistry<VOICES> = SignalRegistry::new();
        for voice in 0..VOICES {
            registry
                .sources_mut()
                .set_voice(voice, VoiceSource::MidiKey, voice as f32 * 0.1);
        }

        let mut row = bound_row(&registry);
        row.set_source(SourceId::Voice(VoiceSource::MidiKey));
        row.set_destination_1(cutoff());
        row.set_amount_1(1.0);

        let (sources, destinations) = registry.split_mut();
        row.apply(sources, destinations);

        for voice in 0..VOICES {
            assert_eq!(
                registry.destinations().get(cutoff(), voice),
                voice as f32 * 0.1
            );
        }
    }

    #[test]
    fn poly_source_to_mono_destination_uses_most_recent_voice() {
        let mut registry: SignalRegistry<VOICES> = SignalRegistry::new();
        for voice in 0..VOICES {
            registry
                .sources_mut()
                .set_voice(voice, VoiceSource::Lfo1, (voice + 1) as f32);
        }

        let mut row = bound_row(&registry);
        row.set_source(SourceId::Voice(VoiceSource::Lfo1));
        row.set_destination_1(master());
        row.set_amount_1(0.5);
        row.set_most_recent_voice(2);

        let (sources, destinations) = registry.split_mut();
        row.apply(sources, destinations);

        assert_eq!(registry.destinations().get(master(), 0), 1.5);
    }

    #[test]
    fn most_recent_voice_is_clamped() {
        let mut registry: SignalRegistry<VOICES> = SignalRegistry::new();
        registry
            .sources_mut()
            .set_voice(VOICES - 1, VoiceSource::Lfo1, 1.0);

        let mut row = bound_row(&registry);
        row.set_source(SourceId::Voice(VoiceSource::Lfo1));
        row.set_destination_1(master());
        row.set_amount_1(1.0);
        row.set_most_recent_voice(100);

        let (sources, destinations) = registry.split_mut();
        row.apply(sources, destinations);

        assert_eq!(registry.destinations().get(master(), 0), 1.0);
    }

    #[test]
    fn scale_source_multiplies_second_destination_only() {
        let mut registry: SignalRegistry<VOICES> = SignalRegistry::new();
        registry.sources_mut().set_global(GlobalSource::GlobalLfo, 0.5);
        registry.sources_mut().set_global(GlobalSource::ModWheel, 0.25);

        let mut row = bound_row(&registry);
        row.set_source(SourceId::Global(GlobalSource::GlobalLfo));
        row.set_destination_1(cutoff());
        row.set_amount_1(1.0);
        row.set_destination_2(master());
        row.set_amount_2(1.0);
        row.set_scale(SourceId::Global(GlobalSource::ModWheel));

        let (sources, destinations) = registry.split_mut();
        row.apply(sources, destinations);

        assert_eq!(registry.destinations().get(cutoff(), 0), 0.5);
        assert_eq!(registry.destinations().get(master(), 0), 0.125);
    }

    #[test]
    fn zero_scale_amount_bypasses_scale_source() {
        let mut registry: SignalRegistry<VOICES> = SignalRegistry::new();
        registry.sources_mut().set_global(GlobalSource::GlobalLfo, 0.5);

        let mut row = bound_row(&registry);
        row.set_source(SourceId::Global(GlobalSource::GlobalLfo));
        row.set_destination_2(master());
        row.set_amount_2(1.0);
        row.set_scale(SourceId::Global(GlobalSource::ModWheel));
        row.set_scale_amount(0.0);

        let (sources, destinations) = registry.split_mut();
        row.apply(sources, destinations);

        assert_eq!(registry.destinations().get(master(), 0), 0.5);
    }

    #[test]
    fn unset_scale_reads_constant() {
        let mut registry: SignalRegistry<VOICES> = SignalRegistry::new();
        registry.sources_mut().set_global(GlobalSource::X, -0.4);

        let mut row = bound_row(&registry);
        row.set_source(SourceId::Global(GlobalSource::X));
        row.set_destination_2(master());
        row.set_amount_2(0.5);

        let (sources, destinations) = registry.split_mut();
        row.apply(sources, destinations);

        assert_eq!(registry.destinations().get(master(), 0), -0.2);
    }

    #[test]
    fn unbound_row_is_a_no_op() {
        let mut registry: SignalRegistry<VOICES> = SignalRegistry::new();
        registry.sources_mut().set_global(GlobalSource::ModWheel, 1.0);

        let mut row = ModRow::new();
        row.set_source(SourceId::Global(GlobalSource::ModWheel));
        row.set_destination_1(master());
        row.set_amount_1(1.0);

        let (sources, destinations) = registry.split_mut();
        row.apply(sources, destinations);

        assert!(registry.destinations().is_zeroed());
    }

    #[test]
    fn mismatched_polyphony_is_a_no_op() {
        let other: SignalRegistry<2> = SignalRegistry::new();
        let mut registry: SignalRegistry<VOICES> = SignalRegistry::new();
        registry.sources_mut().set_global(GlobalSource::ModWheel, 1.0);

        let mut row = ModRow::new();
        row.bind(&other);
        row.set_source(SourceId::Global(GlobalSource::ModWheel));
        row.set_destination_1(master());
        row.set_amount_1(1.0);

        let (sources, destinations) = registry.split_mut();
        row.apply(sources, destinations);

        assert!(registry.destinations().is_zeroed());
    }

    #[test]
    fn settings_round_trip_through_apply_settings() {
        let settings = RowSettings {
            source: SourceId::Voice(VoiceSource::Adsr3),
            destination_1: cutoff(),
            destination_2: master(),
            scale: SourceId::Global(GlobalSource::Breath),
            amount_1: 0.7,
            amount_2: -0.2,
            scale_amount: 0.5,
        };
        let mut row = ModRow::new();
        row.apply_settings(settings);

        assert_eq!(row.settings(), settings);
        assert!(row.is_active_1() && row.is_active_2());
        assert!(row.source_is_poly());
        assert!(row.destination_1_is_poly());
        assert!(!row.destination_2_is_poly());
    }

    #[test]
    fn settings_activity_matches_row() {
        let mut settings = RowSettings {
            source: SourceId::Voice(VoiceSource::Lfo1),
            destination_1: cutoff(),
            ..RowSettings::default()
        };
        assert!(!settings.is_active(), "zero amount is inactive");

        settings.amount_1 = 0.4;
        assert!(settings.is_active_1() && !settings.is_active_2());

        settings.amount_2 = 0.4;
        assert!(!settings.is_active_2(), "unset destination is inactive");

        settings.destination_2 = master();
        let mut row = ModRow::new();
        row.apply_settings(settings);
        assert!(settings.is_active_2());
        assert_eq!(row.is_active_1(), settings.is_active_1());
        assert_eq!(row.is_active_2(), settings.is_active_2());

        settings.destination_1 = DestinationId::None;
        row.apply_settings(settings);
        assert!(!settings.is_active_1());
        assert_eq!(row.is_active(), settings.is_active());
    }

    #[test]
    fn uses_reports_source_and_scale() {
        let mut row = ModRow::new();
        row.set_source(SourceId::Voice(VoiceSource::Lfo2));
        assert!(!row.uses(RenderSource::Lfo2), "inactive rows read nothing");

        row.set_destination_1(cutoff());
        row.set_amount_1(0.1);
        assert!(row.uses(RenderSource::Lfo2));
        assert!(!row.uses(RenderSource::GlobalLfo));

        row.set_scale(SourceId::Global(GlobalSource::GlobalLfo));
        assert!(
            !row.uses(RenderSource::GlobalLfo),
            "scale is only read for destination 2"
        );

        row.set_destination_2(master());
        row.set_amount_2(0.1);
        assert!(row.uses(RenderSource::GlobalLfo));
    }
}
