//! Schematic preview of one window, derived fresh from the window on each call.
//!
//! Track sizes follow the front-end grid convention: column weights come from
//! the sections of the first row, row weights from the first section of each
//! row. Other sections' weights do not move grid lines.

use serde::Serialize;

use crate::catalog::{FrameColor, SectionType};
use crate::ids::EntityId;
use crate::model::Window;

/// Presentation tints for a frame color. Kept out of the core model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorStyle {
    pub border: &'static str,
    pub shadow: &'static str,
    pub handles: &'static str,
}

pub fn color_style(color: FrameColor) -> ColorStyle {
    match color {
        FrameColor::White => ColorStyle {
            border: "#ffffff",
            shadow: "0 0 0 1px rgba(0,0,0,0.1)",
            handles: "#909090",
        },
        FrameColor::Black => ColorStyle {
            border: "#222222",
            shadow: "0 0 0 1px rgba(255,255,255,0.1)",
            handles: "#404040",
        },
        FrameColor::Anthracite => ColorStyle {
            border: "#3c3c3c",
            shadow: "0 0 0 1px rgba(255,255,255,0.1)",
            handles: "#505050",
        },
        FrameColor::GoldenOak => ColorStyle {
            border: "#b68d4c",
            shadow: "0 0 0 1px rgba(0,0,0,0.1)",
            handles: "#8b6b3a",
        },
    }
}

/// Marks drawn on a sash: a handle, a top-edge line (tilt), a side-edge line (turn).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningMarks {
    pub handle: bool,
    pub top_edge: bool,
    pub side_edge: bool,
}

impl OpeningMarks {
    pub fn for_type(kind: SectionType) -> Self {
        if !kind.is_openable() {
            return Self::default();
        }

        Self {
            handle: true,
            top_edge: matches!(kind, SectionType::TiltTurn | SectionType::Tilt),
            side_edge: matches!(kind, SectionType::TiltTurn | SectionType::Casement),
        }
    }
}

/// Cell geometry in unit coordinates: the frame spans `[0, 1] x [0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewCell {
    pub index: usize,
    pub section_id: EntityId,
    pub row: usize,
    pub column: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "type")]
    pub kind: SectionType,
    pub marks: OpeningMarks,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewLayout {
    /// Frame width divided by frame height.
    pub aspect_ratio: f64,
    pub column_weights: Vec<f64>,
    pub row_weights: Vec<f64>,
    pub column_template: String,
    pub row_template: String,
    pub cells: Vec<PreviewCell>,
    pub style: ColorStyle,
}

impl PreviewLayout {
    pub fn for_window(window: &Window) -> Self {
        let grid = window.grid();
        let columns = grid.columns();

        let column_weights: Vec<f64> = window
            .sections
            .iter()
            .take(columns)
            .map(|section| section.width)
            .collect();
        let row_weights: Vec<f64> = window
            .sections
            .iter()
            .step_by(columns)
            .take(grid.rows())
            .map(|section| section.height)
            .collect();

        let column_offsets = unit_offsets(&column_weights);
        let row_offsets = unit_offsets(&row_weights);

        let cells = window
            .sections
            .iter()
            .enumerate()
            .filter_map(|(index, section)| {
                let (row, column) = grid.cell_position(index);
                let (x, width) = *column_offsets.get(column)?;
                let (y, height) = *row_offsets.get(row)?;
                Some(PreviewCell {
                    index,
                    section_id: section.id,
                    row,
                    column,
                    x,
                    y,
                    width,
                    height,
                    kind: section.kind,
                    marks: OpeningMarks::for_type(section.kind),
                })
            })
            .collect();

        Self {
            aspect_ratio: window.width / window.height,
            column_template: fr_template(&column_weights),
            row_template: fr_template(&row_weights),
            column_weights,
            row_weights,
            cells,
            style: color_style(window.color),
        }
    }
}

/// `(start, span)` of each track once weights are normalized to sum to 1.
fn unit_offsets(weights: &[f64]) -> Vec<(f64, f64)> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut start = 0.0;
    weights
        .iter()
        .map(|weight| {
            let span = weight / total;
            let track = (start, span);
            start += span;
            track
        })
        .collect()
}

/// Fractional track list such as `100fr 155fr`.
pub fn fr_template(weights: &[f64]) -> String {
    weights
        .iter()
        .map(|weight| format!("{weight}fr"))
        .collect::<Vec<_>>()
        .join(" ")
}
