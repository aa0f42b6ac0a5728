//! Grid sizing and section reconciliation.
//!
//! Sections are matched to grid slots by flat index, not by (row, column).
//! Shrinking a 3x2 grid to 2x2 and growing it back restores whatever sat at
//! each flat index, which is not the original 2-D arrangement.

use crate::catalog::SectionType;
use crate::ids::IdAllocator;
use crate::model::{DEFAULT_SECTION_WEIGHT, Section};

pub const MIN_TRACKS: u8 = 1;
pub const MAX_TRACKS: u8 = 4;

/// Column/row count of a window grid, always within `[MIN_TRACKS, MAX_TRACKS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSize {
    columns: u8,
    rows: u8,
}

impl Default for GridSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl GridSize {
    pub const DEFAULT: GridSize = GridSize {
        columns: 2,
        rows: 2,
    };

    pub fn clamped(columns: i64, rows: i64) -> Self {
        Self {
            columns: clamp_tracks(columns),
            rows: clamp_tracks(rows),
        }
    }

    pub fn columns(self) -> usize {
        usize::from(self.columns)
    }

    pub fn rows(self) -> usize {
        usize::from(self.rows)
    }

    pub fn cell_count(self) -> usize {
        self.columns() * self.rows()
    }

    /// `(row, column)` of a flat section index.
    pub fn cell_position(self, index: usize) -> (usize, usize) {
        (index / self.columns(), index % self.columns())
    }
}

fn clamp_tracks(count: i64) -> u8 {
    // Bounded by MAX_TRACKS, the cast cannot truncate.
    count.clamp(i64::from(MIN_TRACKS), i64::from(MAX_TRACKS)) as u8
}

/// Section synthesized for a slot that had no previous occupant.
pub fn default_section(ids: &mut IdAllocator) -> Section {
    Section::new(
        ids.allocate(),
        SectionType::Fixed,
        DEFAULT_SECTION_WEIGHT,
        DEFAULT_SECTION_WEIGHT,
    )
}

/// Rebuilds a section list for a `columns x rows` grid.
///
/// Slot `i` keeps `sections[i]` unchanged when it exists and gets a fresh
/// default section otherwise. Bounds are the caller's job (see
/// [`GridSize::clamped`]); the result always has `columns * rows` entries.
pub fn reconcile_grid(
    sections: &[Section],
    columns: usize,
    rows: usize,
    ids: &mut IdAllocator,
) -> Vec<Section> {
    let total = columns.saturating_mul(rows);
    (0..total)
        .map(|index| match sections.get(index) {
            Some(existing) => *existing,
            None => default_section(ids),
        })
        .collect()
}
