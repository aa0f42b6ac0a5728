use std::collections::HashSet;
use std::iter;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{FrameColor, GlassType, InstallationClass, Material, SectionType};
use crate::error::SnapshotError;
use crate::grid::{self, GridSize};
use crate::ids::{EntityId, IdAllocator, MAX_ENTITY_ID};
use crate::patch::{SectionPatch, WindowPatch, finite_or_fallback};
use crate::pricing;

pub const MIN_WINDOW_CM: f64 = 50.0;
pub const MAX_WINDOW_CM: f64 = 300.0;
pub const DEFAULT_WINDOW_WIDTH_CM: f64 = 300.0;
pub const DEFAULT_WINDOW_HEIGHT_CM: f64 = 250.0;

pub const MIN_SECTION_WEIGHT: f64 = 20.0;
pub const MAX_SECTION_WEIGHT: f64 = 200.0;
pub const DEFAULT_SECTION_WEIGHT: f64 = 100.0;

pub fn clamp_window_cm(value: f64) -> f64 {
    finite_or_fallback(value).clamp(MIN_WINDOW_CM, MAX_WINDOW_CM)
}

pub fn clamp_section_weight(value: f64) -> f64 {
    finite_or_fallback(value).clamp(MIN_SECTION_WEIGHT, MAX_SECTION_WEIGHT)
}

/// One pane of a window grid. Width and height are relative weights in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: SectionType,
    pub width: f64,
    pub height: f64,
}

impl Section {
    pub fn new(id: EntityId, kind: SectionType, width: f64, height: f64) -> Self {
        Self {
            id,
            kind,
            width: clamp_section_weight(width),
            height: clamp_section_weight(height),
        }
    }

    fn normalized(self) -> Self {
        Self::new(self.id, self.kind, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub id: EntityId,
    pub width: f64,
    pub height: f64,
    pub material: Material,
    pub glass_type: GlassType,
    pub color: FrameColor,
    pub columns: u8,
    pub rows: u8,
    pub sections: Vec<Section>,
}

impl Window {
    /// Default 300x250 cm PVC window with a 2x2 grid of fixed panes.
    pub fn new(ids: &mut IdAllocator) -> Self {
        let id = ids.allocate();
        let grid = GridSize::DEFAULT;
        let sections = grid::reconcile_grid(&[], grid.columns(), grid.rows(), ids);

        Self {
            id,
            width: DEFAULT_WINDOW_WIDTH_CM,
            height: DEFAULT_WINDOW_HEIGHT_CM,
            material: Material::default(),
            glass_type: GlassType::default(),
            color: FrameColor::default(),
            columns: grid.columns() as u8,
            rows: grid.rows() as u8,
            sections,
        }
    }

    pub fn grid(&self) -> GridSize {
        GridSize::clamped(i64::from(self.columns), i64::from(self.rows))
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub(crate) fn resize(&mut self, grid: GridSize, ids: &mut IdAllocator) {
        self.sections = grid::reconcile_grid(&self.sections, grid.columns(), grid.rows(), ids);
        self.columns = grid.columns() as u8;
        self.rows = grid.rows() as u8;
    }

    fn normalized(mut self, ids: &mut IdAllocator) -> Self {
        self.width = clamp_window_cm(self.width);
        self.height = clamp_window_cm(self.height);
        for section in &mut self.sections {
            *section = section.normalized();
        }
        let grid = self.grid();
        self.resize(grid, ids);
        self
    }
}

/// The editing session's document: every window plus one installation class.
///
/// Windows sit behind `Arc`; each mutation returns a new `Project` that
/// shares every window it did not touch with `self`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ProjectSnapshot")]
pub struct Project {
    windows: Vec<Arc<Window>>,
    installation_type: InstallationClass,
    #[serde(skip)]
    ids: IdAllocator,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    pub fn new() -> Self {
        let mut ids = IdAllocator::default();
        let first = Window::new(&mut ids);
        Self {
            windows: vec![Arc::new(first)],
            installation_type: InstallationClass::default(),
            ids,
        }
    }

    pub fn windows(&self) -> &[Arc<Window>] {
        &self.windows
    }

    pub fn window(&self, index: usize) -> Option<&Window> {
        self.windows.get(index).map(Arc::as_ref)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn installation_type(&self) -> InstallationClass {
        self.installation_type
    }

    pub fn total_price(&self) -> f64 {
        pricing::total_price(self)
    }

    pub fn add_window(&self) -> Project {
        let mut next = self.clone();
        let window = Window::new(&mut next.ids);
        next.windows.push(Arc::new(window));
        next
    }

    /// Removing the last remaining window, or an index past the end, is a no-op.
    pub fn remove_window(&self, index: usize) -> Project {
        if self.windows.len() <= 1 || index >= self.windows.len() {
            return self.clone();
        }

        let mut next = self.clone();
        next.windows.remove(index);
        next
    }

    pub fn update_window(&self, index: usize, patch: &WindowPatch) -> Project {
        self.with_window(index, |window, ids| patch.apply(window, ids))
    }

    /// Clamps the requested grid and reconciles the window's sections to it.
    pub fn resize_grid(&self, index: usize, columns: i64, rows: i64) -> Project {
        self.update_window(index, &WindowPatch::default().with_grid(columns, rows))
    }

    pub fn update_section(
        &self,
        window_index: usize,
        section_index: usize,
        patch: &SectionPatch,
    ) -> Project {
        let in_range = self
            .window(window_index)
            .is_some_and(|window| section_index < window.sections.len());
        if !in_range {
            return self.clone();
        }

        self.with_window(window_index, |window, _ids| {
            patch.apply(&mut window.sections[section_index]);
        })
    }

    pub fn set_installation_type(&self, class: InstallationClass) -> Project {
        let mut next = self.clone();
        next.installation_type = class;
        next
    }

    fn with_window(
        &self,
        index: usize,
        edit: impl FnOnce(&mut Window, &mut IdAllocator),
    ) -> Project {
        let Some(current) = self.windows.get(index) else {
            return self.clone();
        };

        let mut next = self.clone();
        let mut window = Window::clone(current);
        edit(&mut window, &mut next.ids);
        next.windows[index] = Arc::new(window);
        next
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectSnapshot {
    windows: Vec<Window>,
    #[serde(default)]
    installation_type: InstallationClass,
}

impl TryFrom<ProjectSnapshot> for Project {
    type Error = SnapshotError;

    fn try_from(snapshot: ProjectSnapshot) -> Result<Self, Self::Error> {
        if snapshot.windows.is_empty() {
            return Err(SnapshotError::NoWindows);
        }

        let mut seen = HashSet::new();
        let used = snapshot.windows.iter().flat_map(|window| {
            iter::once(window.id).chain(window.sections.iter().map(|section| section.id))
        });
        for id in used.clone() {
            if id.get() > MAX_ENTITY_ID {
                return Err(SnapshotError::IdOutOfRange {
                    id: id.get(),
                    max: MAX_ENTITY_ID,
                });
            }
            if !seen.insert(id) {
                return Err(SnapshotError::DuplicateId { id: id.get() });
            }
        }

        let mut ids = IdAllocator::resume_after(used);
        let windows = snapshot
            .windows
            .into_iter()
            .map(|window| Arc::new(window.normalized(&mut ids)))
            .collect();

        Ok(Self {
            windows,
            installation_type: snapshot.installation_type,
            ids,
        })
    }
}
