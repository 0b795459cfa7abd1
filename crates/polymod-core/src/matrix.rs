//! Modulation matrix: a fixed set of rows applied once per block.
//!
//! Per block, on the audio thread:
//!
//! 1. producers write source slots,
//! 2. [`ModMatrix::apply_modulation`] zeroes every destination slot and
//!    applies each row in order,
//! 3. consumers read destination slots.
//!
//! Configuration setters run on the control side. Each routing change
//! recomputes the [`RenderSelection`] and publishes it to the registered
//! observer when it changed.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
use core::fmt;

use crate::ids::{DestinationId, SourceId};
use crate::registry::{RegistryHandle, SignalRegistry};
use crate::render::{RenderSelection, RenderSelectionObserver, RenderSource};
use crate::row::{ModRow, RowSettings};
use crate::shared::SharedRouting;

/// Number of rows in the default matrix.
pub const MOD_MATRIX_ROWS: usize = 9;

/// Fixed-size, ordered collection of [`ModRow`]s.
///
/// # Example
///
/// ```rust
/// use polymod_core::{
///     DestinationId, GlobalSource, ModMatrix, OscParam, OscUnit, SignalRegistry, SourceId,
///     VoiceDest,
/// };
///
/// let mut registry: SignalRegistry<8> = SignalRegistry::new();
/// let mut matrix: ModMatrix = ModMatrix::new();
/// matrix.bind(&registry);
///
/// let pitch = DestinationId::Voice(VoiceDest::Osc(OscUnit::Osc1, OscParam::PitchLinear));
/// matrix.set_source(0, SourceId::Global(GlobalSource::GlobalLfo));
/// matrix.set_destination_1(0, pitch);
/// matrix.set_amount_1(0, 0.2);
///
/// registry.sources_mut().set_global(GlobalSource::GlobalLfo, 0.5);
/// matrix.apply_modulation(&mut registry);
///
/// for voice in 0..8 {
///     assert!((registry.destinations().get(pitch, voice) - 0.1).abs() < 1e-6);
/// }
/// ```
pub struct ModMatrix<const ROWS: usize = MOD_MATRIX_ROWS> {
    rows: [ModRow; ROWS],
    handle: Option<RegistryHandle>,
    most_recent_voice: usize,
    render_selection: RenderSelection,
    render_observer: Option<Box<dyn RenderSelectionObserver + Send>>,
    synced_sequences: [u32; ROWS],
}

impl<const ROWS: usize> fmt::Debug for ModMatrix<ROWS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModMatrix")
            .field("rows", &self.rows)
            .field("handle", &self.handle)
            .field("most_recent_voice", &self.most_recent_voice)
            .field("render_selection", &self.render_selection)
            .field("has_render_observer", &self.render_observer.is_some())
            .finish_non_exhaustive()
    }
}

impl<const ROWS: usize> Default for ModMatrix<ROWS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ROWS: usize> ModMatrix<ROWS> {
    /// Create an unbound matrix with every row inactive.
    pub fn new() -> Self {
        Self {
            rows: core::array::from_fn(|_| ModRow::new()),
            handle: None,
            most_recent_voice: 0,
            render_selection: RenderSelection::none(),
            render_observer: None,
            synced_sequences: [0; ROWS],
        }
    }

    /// Bind every row to `registry`. Idempotent.
    ///
    /// Until bound, [`apply_modulation`](Self::apply_modulation) does nothing.
    pub fn bind<const VOICES: usize>(&mut self, registry: &SignalRegistry<VOICES>) {
        let handle = registry.handle();
        self.handle = Some(handle);
        for row in &mut self.rows {
            row.bind_handle(handle);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("mod_matrix: bound {} rows to registry with {} voices", ROWS, VOICES);
    }

    /// `true` once [`bind`](Self::bind) has run.
    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        ROWS
    }

    /// `true` if the matrix has no rows.
    pub const fn is_empty(&self) -> bool {
        ROWS == 0
    }

    /// Row by index.
    pub fn row(&self, row: usize) -> Option<&ModRow> {
        self.rows.get(row)
    }

    /// All rows in application order.
    pub fn rows(&self) -> &[ModRow; ROWS] {
        &self.rows
    }

    /// Number of rows with at least one active destination.
    pub fn active_row_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_active()).count()
    }

    /// Select the primary source of a row.
    pub fn set_source(&mut self, row: usize, source: SourceId) {
        self.configure(row, |r| r.set_source(source));
    }

    /// Select the first destination of a row.
    pub fn set_destination_1(&mut self, row: usize, destination: DestinationId) {
        self.configure(row, |r| r.set_destination_1(destination));
    }

    /// Select the second destination of a row.
    pub fn set_destination_2(&mut self, row: usize, destination: DestinationId) {
        self.configure(row, |r| r.set_destination_2(destination));
    }

    /// Select the scale source of a row.
    pub fn set_scale(&mut self, row: usize, scale: SourceId) {
        self.configure(row, |r| r.set_scale(scale));
    }

    /// Set the first depth of a row.
    pub fn set_amount_1(&mut self, row: usize, amount: f32) {
        self.configure(row, |r| r.set_amount_1(amount));
    }

    /// Set the second depth of a row.
    pub fn set_amount_2(&mut self, row: usize, amount: f32) {
        self.configure(row, |r| r.set_amount_2(amount));
    }

    /// Set the scale depth of a row.
    pub fn set_scale_amount(&mut self, row: usize, amount: f32) {
        self.configure(row, |r| r.set_scale_amount(amount));
    }

    /// Replace a whole row configuration.
    pub fn set_row(&mut self, row: usize, settings: RowSettings) {
        self.configure(row, |r| r.apply_settings(settings));
    }

    /// Reset a row to its defaults (inactive).
    pub fn clear_row(&mut self, row: usize) {
        self.set_row(row, RowSettings::default());
    }

    /// Reset every row to its defaults.
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.apply_settings(RowSettings::default());
        }
        self.refresh_render_selection();
    }

    fn configure(&mut self, row: usize, update: impl FnOnce(&mut ModRow)) {
        let Some(target) = self.rows.get_mut(row) else {
            #[cfg(feature = "tracing")]
            tracing::debug!("mod_matrix: ignoring edit of row {row} (only {} rows)", ROWS);
            return;
        };
        update(target);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "mod_matrix: row {row} -> {} => {} ({}), {} ({}) scale {} ({})",
            target.source(),
            target.destination_1(),
            target.amount_1(),
            target.destination_2(),
            target.amount_2(),
            target.scale(),
            target.scale_amount()
        );

        self.refresh_render_selection();
    }

    /// Voice that stands in for per-voice sources routed to global destinations.
    ///
    /// Called by the voice allocator whenever the "current" voice changes.
    pub fn set_most_recent_voice(&mut self, voice: usize) {
        self.most_recent_voice = voice;
        for row in &mut self.rows {
            row.set_most_recent_voice(voice);
        }
    }

    /// Current most-recent voice.
    pub fn most_recent_voice(&self) -> usize {
        self.most_recent_voice
    }

    /// Register the producer-side observer for render-selection changes.
    ///
    /// The current selection is published immediately.
    pub fn set_render_observer(&mut self, mut observer: Box<dyn RenderSelectionObserver + Send>) {
        observer.render_selection_changed(self.render_selection);
        self.render_observer = Some(observer);
    }

    /// Drop the registered observer, returning it.
    pub fn take_render_observer(&mut self) -> Option<Box<dyn RenderSelectionObserver + Send>> {
        self.render_observer.take()
    }

    /// Last computed render selection.
    pub fn render_selection(&self) -> RenderSelection {
        self.render_selection
    }

    /// Recompute the render selection from every row and publish it.
    pub fn compute_render_selection(&mut self) -> RenderSelection {
        self.render_selection = self.collect_render_selection();
        if let Some(observer) = self.render_observer.as_mut() {
            observer.render_selection_changed(self.render_selection);
        }
        self.render_selection
    }

    fn collect_render_selection(&self) -> RenderSelection {
        let mut selection = RenderSelection::none();
        for &source in RenderSource::ALL {
            selection.set(source, self.rows.iter().any(|row| row.uses(source)));
        }
        selection
    }

    fn refresh_render_selection(&mut self) {
        let selection = self.collect_render_selection();
        if selection == self.render_selection {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "mod_matrix: render selection {:#08b} -> {:#08b}",
            self.render_selection.bits(),
            selection.bits()
        );

        self.render_selection = selection;
        if let Some(observer) = self.render_observer.as_mut() {
            observer.render_selection_changed(selection);
        }
    }

    /// Pull pending edits from the control thread. Returns `true` if any row changed.
    ///
    /// Rows being written while this runs are skipped and picked up on a
    /// later call. Bounded work, no locks, no allocation.
    pub fn sync(&mut self, shared: &SharedRouting<ROWS>) -> bool {
        let mut changed = false;
        for (index, row) in self.rows.iter_mut().enumerate() {
            let Some(shared_row) = shared.row(index) else {
                continue;
            };
            if shared_row.sequence() == self.synced_sequences[index] {
                continue;
            }
            if let Some((sequence, settings)) = shared_row.read() {
                row.apply_settings(settings);
                self.synced_sequences[index] = sequence;
                changed = true;
            }
        }
        if changed {
            self.refresh_render_selection();
        }
        changed
    }

    /// Reset every destination slot to 0.
    pub fn zero_destinations<const VOICES: usize>(&self, registry: &mut SignalRegistry<VOICES>) {
        registry.destinations_mut().zero();
    }

    /// Reset transient source slots (everything but the constant).
    ///
    /// Used by the voice/envelope reset path, never by
    /// [`apply_modulation`](Self::apply_modulation).
    pub fn zero_sources<const VOICES: usize>(&self, registry: &mut SignalRegistry<VOICES>) {
        registry.sources_mut().zero_transient();
    }

    /// Zero all destinations, then apply every row in order.
    ///
    /// Does nothing if the matrix is unbound or bound to a registry of a
    /// different polyphony. O(rows × voices), allocation-free.
    pub fn apply_modulation<const VOICES: usize>(&self, registry: &mut SignalRegistry<VOICES>) {
        if self.handle != Some(registry.handle()) {
            return;
        }
        let (sources, destinations) = registry.split_mut();
        destinations.zero();
        for row in &self.rows {
            row.apply(sources, destinations);
        }
    }
}
