//! Lock-free handoff of row configuration from the control thread.
//!
//! [`SharedRouting`] mirrors the matrix configuration in atomics. The control
//! thread (UI, preset loader) is the single writer; the audio thread calls
//! [`ModMatrix::sync`](crate::ModMatrix::sync) at the start of each block.
//!
//! Each row is guarded by a sequence counter: the writer makes it odd before
//! touching the fields and even afterwards. The reader only accepts a
//! snapshot when it saw the same even sequence before and after reading;
//! otherwise it leaves the row as it was and retries on the next block.
//! Neither side ever blocks.

use core::sync::atomic::{AtomicU32, Ordering, fence};

use crate::ids::{DestinationId, SourceId};
use crate::matrix::MOD_MATRIX_ROWS;
use crate::row::RowSettings;

/// Atomic mirror of one row.
#[derive(Debug)]
pub struct SharedRow {
    sequence: AtomicU32,
    source: AtomicU32,
    destination_1: AtomicU32,
    destination_2: AtomicU32,
    scale: AtomicU32,
    amount_1: AtomicU32,
    amount_2: AtomicU32,
    scale_amount: AtomicU32,
}

impl Default for SharedRow {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedRow {
    /// A row holding [`RowSettings::default`], never written.
    pub fn new() -> Self {
        let defaults = RowSettings::default();
        Self {
            sequence: AtomicU32::new(0),
            source: AtomicU32::new(u32::from(defaults.source.to_raw())),
            destination_1: AtomicU32::new(u32::from(defaults.destination_1.to_raw())),
            destination_2: AtomicU32::new(u32::from(defaults.destination_2.to_raw())),
            scale: AtomicU32::new(u32::from(defaults.scale.to_raw())),
            amount_1: AtomicU32::new(defaults.amount_1.to_bits()),
            amount_2: AtomicU32::new(defaults.amount_2.to_bits()),
            scale_amount: AtomicU32::new(defaults.scale_amount.to_bits()),
        }
    }

    /// Current sequence number. Even when no write is in progress.
    pub fn sequence(&self) -> u32 {
        self.sequence.load(Ordering::Acquire)
    }

    fn write(&self, update: impl FnOnce(&Self)) {
        let sequence = self.sequence.load(Ordering::Relaxed);
        self.sequence
            .store(sequence.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        update(self);
        self.sequence
            .store(sequence.wrapping_add(2), Ordering::Release);
    }

    /// Consistent snapshot, or `None` if a write is in progress.
    pub fn read(&self) -> Option<(u32, RowSettings)> {
        let before = self.sequence.load(Ordering::Acquire);
        if before & 1 == 1 {
            return None;
        }

        let settings = RowSettings {
            source: decode_source(self.source.load(Ordering::Relaxed)),
            destination_1: decode_destination(self.destination_1.load(Ordering::Relaxed)),
            destination_2: decode_destination(self.destination_2.load(Ordering::Relaxed)),
            scale: decode_source(self.scale.load(Ordering::Relaxed)),
            amount_1: f32::from_bits(self.amount_1.load(Ordering::Relaxed)),
            amount_2: f32::from_bits(self.amount_2.load(Ordering::Relaxed)),
            scale_amount: f32::from_bits(self.scale_amount.load(Ordering::Relaxed)),
        };

        fence(Ordering::Acquire);
        let after = self.sequence.load(Ordering::Relaxed);
        (before == after).then_some((before, settings))
    }

    fn store_settings(&self, settings: RowSettings) {
        self.source
            .store(u32::from(settings.source.to_raw()), Ordering::Relaxed);
        self.destination_1
            .store(u32::from(settings.destination_1.to_raw()), Ordering::Relaxed);
        self.destination_2
            .store(u32::from(settings.destination_2.to_raw()), Ordering::Relaxed);
        self.scale
            .store(u32::from(settings.scale.to_raw()), Ordering::Relaxed);
        self.amount_1
            .store(settings.amount_1.to_bits(), Ordering::Relaxed);
        self.amount_2
            .store(settings.amount_2.to_bits(), Ordering::Relaxed);
        self.scale_amount
            .store(settings.scale_amount.to_bits(), Ordering::Relaxed);
    }
}

// Writers only ever store ids produced by `to_raw`; anything else is treated
// as unset rather than trusted.
fn decode_source(raw: u32) -> SourceId {
    u16::try_from(raw)
        .ok()
        .and_then(|raw| SourceId::from_raw(raw).ok())
        .unwrap_or_default()
}

fn decode_destination(raw: u32) -> DestinationId {
    u16::try_from(raw)
        .ok()
        .and_then(|raw| DestinationId::from_raw(raw).ok())
        .unwrap_or_default()
}

/// Atomic mirror of a whole matrix configuration.
///
/// Share it between threads behind an `Arc`. All setters take `&self` and
/// must be called from a single writer thread; out-of-range rows are
/// ignored.
///
/// # Example
///
/// ```rust
/// use polymod_core::{
///     DestinationId, GlobalSource, ModMatrix, OscParam, OscUnit, SharedRouting, SignalRegistry,
///     SourceId, VoiceDest,
/// };
///
/// let shared: SharedRouting = SharedRouting::new();
/// let mut matrix: ModMatrix = ModMatrix::new();
/// let mut registry: SignalRegistry<8> = SignalRegistry::new();
/// matrix.bind(&registry);
///
/// // Control thread
/// shared.set_source(0, SourceId::Global(GlobalSource::ModWheel));
/// shared.set_destination_1(
///     0,
///     DestinationId::Voice(VoiceDest::Osc(OscUnit::Osc1, OscParam::Vol)),
/// );
/// shared.set_amount_1(0, 0.5);
///
/// // Audio thread, start of block
/// assert!(matrix.sync(&shared));
/// matrix.apply_modulation(&mut registry);
/// ```
#[derive(Debug)]
pub struct SharedRouting<const ROWS: usize = MOD_MATRIX_ROWS> {
    rows: [SharedRow; ROWS],
}

impl<const ROWS: usize> Default for SharedRouting<ROWS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ROWS: usize> SharedRouting<ROWS> {
    /// Create a mirror with every row at its default.
    pub fn new() -> Self {
        Self {
            rows: core::array::from_fn(|_| SharedRow::new()),
        }
    }

    /// Shared row by index.
    pub fn row(&self, row: usize) -> Option<&SharedRow> {
        self.rows.get(row)
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        ROWS
    }

    /// `true` if there are no rows.
    pub const fn is_empty(&self) -> bool {
        ROWS == 0
    }

    /// Replace a whole row in one write.
    pub fn set_row(&self, row: usize, settings: RowSettings) {
        if let Some(shared) = self.rows.get(row) {
            shared.write(|r| r.store_settings(settings));
        }
    }

    /// Reset a row to its defaults.
    pub fn clear_row(&self, row: usize) {
        self.set_row(row, RowSettings::default());
    }

    /// Select the primary source of a row.
    pub fn set_source(&self, row: usize, source: SourceId) {
        self.store_raw(row, |r| &r.source, u32::from(source.to_raw()));
    }

    /// Select the first destination of a row.
    pub fn set_destination_1(&self, row: usize, destination: DestinationId) {
        self.store_raw(row, |r| &r.destination_1, u32::from(destination.to_raw()));
    }

    /// Select the second destination of a row.
    pub fn set_destination_2(&self, row: usize, destination: DestinationId) {
        self.store_raw(row, |r| &r.destination_2, u32::from(destination.to_raw()));
    }

    /// Select the scale source of a row.
    pub fn set_scale(&self, row: usize, scale: SourceId) {
        self.store_raw(row, |r| &r.scale, u32::from(scale.to_raw()));
    }

    /// Set the first depth of a row.
    pub fn set_amount_1(&self, row: usize, amount: f32) {
        self.store_raw(row, |r| &r.amount_1, amount.to_bits());
    }

    /// Set the second depth of a row.
    pub fn set_amount_2(&self, row: usize, amount: f32) {
        self.store_raw(row, |r| &r.amount_2, amount.to_bits());
    }

    /// Set the scale depth of a row.
    pub fn set_scale_amount(&self, row: usize, amount: f32) {
        self.store_raw(row, |r| &r.scale_amount, amount.to_bits());
    }

    fn store_raw(&self, row: usize, field: impl FnOnce(&SharedRow) -> &AtomicU32, value: u32) {
        if let Some(shared) = self.rows.get(row) {
            shared.write(|r| field(r).store(value, Ordering::Relaxed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{GlobalSource, VoiceSource};

    #[test]
    fn fresh_row_reads_defaults_at_sequence_zero() {
        let row = SharedRow::new();
        assert_eq!(row.read(), Some((0, RowSettings::default())));
    }

    #[test]
    fn each_write_advances_sequence_by_two() {
        let shared: SharedRouting<2> = SharedRouting::new();
        shared.set_amount_1(1, 0.5);
        shared.set_amount_2(1, 0.25);

        let (sequence, settings) = shared.row(1).and_then(SharedRow::read).unwrap();
        assert_eq!(sequence, 4);
        assert_eq!(settings.amount_1, 0.5);
        assert_eq!(settings.amount_2, 0.25);
        assert_eq!(shared.row(0).unwrap().sequence(), 0);
    }

    #[test]
    fn set_row_writes_all_fields_at_once() {
        let shared: SharedRouting<1> = SharedRouting::new();
        let settings = RowSettings {
            source: SourceId::Voice(VoiceSource::Random),
            scale: SourceId::Global(GlobalSource::SustainPedal),
            amount_1: -1.0,
            ..RowSettings::default()
        };
        shared.set_row(0, settings);

        assert_eq!(shared.row(0).unwrap().read(), Some((2, settings)));
    }

    #[test]
    fn read_during_write_is_rejected() {
        let row = SharedRow::new();
        row.sequence.store(3, Ordering::Relaxed);
        assert_eq!(row.read(), None);
    }

    #[test]
    fn out_of_range_rows_are_ignored() {
        let shared: SharedRouting<1> = SharedRouting::new();
        shared.set_amount_1(5, 1.0);
        assert!(shared.row(5).is_none());
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn corrupt_raw_ids_decode_as_none() {
        assert_eq!(decode_source(70_000), SourceId::None);
        assert_eq!(decode_destination(999), DestinationId::None);
    }
}
