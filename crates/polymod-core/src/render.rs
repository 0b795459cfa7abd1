//! Render selection: which shared, expensive sources are consumed.
//!
//! Upstream producers may skip computing a source nobody reads. The matrix
//! recomputes the selection whenever routing changes and publishes it to a
//! registered [`RenderSelectionObserver`]. Skipping is an optimization only;
//! producers that ignore the selection stay correct.

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};
#[cfg(feature = "std")]
use std::sync::Arc;

use crate::ids::{GlobalSource, SourceId, VoiceSource, slot_enum};

slot_enum! {
    /// Sources whose rendering can be skipped when unused.
    RenderSource {
        /// Voice LFO 1
        Lfo1 => "lfo1",
        /// Voice LFO 2
        Lfo2 => "lfo2",
        /// Voice LFO 3
        Lfo3 => "lfo3",
        /// Global LFO
        GlobalLfo => "global_lfo",
        /// Voice modulation envelope
        ModEnvelope => "mod_envelope",
        /// Global envelope
        GlobalEnvelope => "global_envelope",
    }
}

impl RenderSource {
    /// The source slot this producer writes.
    pub const fn source(self) -> SourceId {
        match self {
            Self::Lfo1 => SourceId::Voice(VoiceSource::Lfo1),
            Self::Lfo2 => SourceId::Voice(VoiceSource::Lfo2),
            Self::Lfo3 => SourceId::Voice(VoiceSource::Lfo3),
            Self::GlobalLfo => SourceId::Global(GlobalSource::GlobalLfo),
            Self::ModEnvelope => SourceId::Voice(VoiceSource::Adsr3),
            Self::GlobalEnvelope => SourceId::Global(GlobalSource::GlobalAdsr),
        }
    }
}

/// One flag per [`RenderSource`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RenderSelection {
    bits: u32,
}

impl RenderSelection {
    /// Nothing selected.
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    /// `true` if `source` must be rendered.
    pub const fn is_selected(self, source: RenderSource) -> bool {
        self.bits & (1 << source.index()) != 0
    }

    /// Mark `source` as rendered or not.
    pub fn set(&mut self, source: RenderSource, selected: bool) {
        if selected {
            self.bits |= 1 << source.index();
        } else {
            self.bits &= !(1 << source.index());
        }
    }

    /// `true` if any source is selected.
    pub const fn any(self) -> bool {
        self.bits != 0
    }

    /// Iterate the selected sources.
    pub fn iter(self) -> impl Iterator<Item = RenderSource> {
        RenderSource::ALL
            .iter()
            .copied()
            .filter(move |&source| self.is_selected(source))
    }

    /// Packed representation, one bit per source in slot order.
    pub const fn bits(self) -> u32 {
        self.bits
    }

    /// Rebuild from [`bits`](Self::bits). Unknown bits are dropped.
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            bits: bits & ((1 << RenderSource::COUNT) - 1),
        }
    }
}

/// Receives render-selection updates from the matrix.
///
/// Called on the thread that changes routing (or on the audio thread when
/// edits arrive through [`ModMatrix::sync`](crate::ModMatrix::sync)), so
/// implementations must not block.
pub trait RenderSelectionObserver {
    /// The set of consumed sources changed.
    fn render_selection_changed(&mut self, selection: RenderSelection);
}

/// Lock-free cell that publishes a [`RenderSelection`] to another thread.
///
/// Register an `Arc<AtomicRenderSelection>` as the matrix observer and let
/// producers [`load`](Self::load) it once per block.
#[derive(Debug, Default)]
pub struct AtomicRenderSelection {
    bits: AtomicU32,
}

impl AtomicRenderSelection {
    /// Create a cell holding an empty selection.
    pub const fn new() -> Self {
        Self {
            bits: AtomicU32::new(0),
        }
    }

    /// Latest published selection.
    pub fn load(&self) -> RenderSelection {
        RenderSelection::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Publish a selection.
    pub fn store(&self, selection: RenderSelection) {
        self.bits.store(selection.bits(), Ordering::Release);
    }
}

impl RenderSelectionObserver for Arc<AtomicRenderSelection> {
    fn render_selection_changed(&mut self, selection: RenderSelection) {
        self.store(selection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(not(feature = "std"))]
    use alloc::string::ToString;

    #[test]
    fn display_uses_stable_name() {
        assert_eq!(RenderSource::ModEnvelope.to_string(), "mod_envelope");
        assert_eq!(RenderSource::GlobalLfo.to_string(), "global_lfo");
    }

    #[test]
    fn set_and_clear_flags() {
        let mut selection = RenderSelection::none();
        assert!(!selection.any());

        selection.set(RenderSource::GlobalLfo, true);
        selection.set(RenderSource::ModEnvelope, true);
        assert!(selection.is_selected(RenderSource::GlobalLfo));
        assert!(!selection.is_selected(RenderSource::Lfo1));

        selection.set(RenderSource::GlobalLfo, false);
        assert!(!selection.is_selected(RenderSource::GlobalLfo));
        let mut selected = selection.iter();
        assert_eq!(selected.next(), Some(RenderSource::ModEnvelope));
        assert_eq!(selected.next(), None);
    }

    #[test]
    fn from_bits_masks_unknown_sources() {
        let selection = RenderSelection::from_bits(u32::MAX);
        assert_eq!(selection.iter().count(), RenderSource::COUNT);
        assert_eq!(selection.bits(), (1 << RenderSource::COUNT) - 1);
    }

    #[test]
    fn render_sources_map_to_slots() {
        assert_eq!(
            RenderSource::ModEnvelope.source(),
            SourceId::Voice(VoiceSource::Adsr3)
        );
        assert!(!RenderSource::GlobalEnvelope.source().is_poly());
    }

    #[test]
    fn atomic_cell_observer_publishes() {
        let cell = Arc::new(AtomicRenderSelection::new());
        let mut observer = Arc::clone(&cell);

        let mut selection = RenderSelection::none();
        selection.set(RenderSource::Lfo3, true);
        observer.render_selection_changed(selection);

        assert_eq!(cell.load(), selection);
    }
}
