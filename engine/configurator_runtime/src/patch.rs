//! Partial updates for windows and sections.
//!
//! Numeric fields follow "clamp, never reject": anything that is not a finite
//! number (or a string holding one) becomes [`NUMERIC_FALLBACK`] and is then
//! clamped into range when applied. Enum fields must name a known option.

use serde_json::{Map, Value};

use crate::catalog::{FrameColor, GlassType, Material, SectionType};
use crate::error::IntentError;
use crate::grid::GridSize;
use crate::ids::IdAllocator;
use crate::model::{Section, Window, clamp_section_weight, clamp_window_cm};

pub const NUMERIC_FALLBACK: f64 = 100.0;

pub(crate) fn finite_or_fallback(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        NUMERIC_FALLBACK
    }
}

/// Reads loose numeric input: JSON numbers or numeric strings.
pub fn numeric_input(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.map_or(NUMERIC_FALLBACK, finite_or_fallback)
}

/// Whole track count; fractions truncate toward zero.
pub fn track_input(value: &Value) -> i64 {
    numeric_input(value).trunc() as i64
}

fn option_input<T>(
    field: &str,
    value: &Value,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, IntentError> {
    value
        .as_str()
        .and_then(parse)
        .ok_or_else(|| IntentError::UnknownOption {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn patch_object<'a>(
    value: &'a Value,
    what: &'static str,
) -> Result<&'a Map<String, Value>, IntentError> {
    value.as_object().ok_or(IntentError::NotAnObject { what })
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowPatch {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub material: Option<Material>,
    pub glass_type: Option<GlassType>,
    pub color: Option<FrameColor>,
    pub columns: Option<i64>,
    pub rows: Option<i64>,
}

impl WindowPatch {
    pub fn with_width(mut self, cm: f64) -> Self {
        self.width = Some(cm);
        self
    }

    pub fn with_height(mut self, cm: f64) -> Self {
        self.height = Some(cm);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_glass_type(mut self, glass_type: GlassType) -> Self {
        self.glass_type = Some(glass_type);
        self
    }

    pub fn with_color(mut self, color: FrameColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_grid(mut self, columns: i64, rows: i64) -> Self {
        self.columns = Some(columns);
        self.rows = Some(rows);
        self
    }

    /// Decodes `{"width": .., "glassType": .., "columns": ..}` style input.
    pub fn from_json(value: &Value) -> Result<Self, IntentError> {
        let mut patch = Self::default();

        for (key, field) in patch_object(value, "window patch")? {
            match key.as_str() {
                "width" => patch.width = Some(numeric_input(field)),
                "height" => patch.height = Some(numeric_input(field)),
                "material" => patch.material = Some(option_input(key, field, Material::parse)?),
                "glassType" => {
                    patch.glass_type = Some(option_input(key, field, GlassType::parse)?);
                }
                "color" => patch.color = Some(option_input(key, field, FrameColor::parse)?),
                "columns" => patch.columns = Some(track_input(field)),
                "rows" => patch.rows = Some(track_input(field)),
                other => {
                    return Err(IntentError::UnknownField {
                        field: other.to_string(),
                    });
                }
            }
        }

        Ok(patch)
    }

    pub(crate) fn apply(&self, window: &mut Window, ids: &mut IdAllocator) {
        if let Some(width) = self.width {
            window.width = clamp_window_cm(width);
        }
        if let Some(height) = self.height {
            window.height = clamp_window_cm(height);
        }
        if let Some(material) = self.material {
            window.material = material;
        }
        if let Some(glass_type) = self.glass_type {
            window.glass_type = glass_type;
        }
        if let Some(color) = self.color {
            window.color = color;
        }
        if self.columns.is_some() || self.rows.is_some() {
            let grid = GridSize::clamped(
                self.columns.unwrap_or(i64::from(window.columns)),
                self.rows.unwrap_or(i64::from(window.rows)),
            );
            window.resize(grid, ids);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SectionPatch {
    pub kind: Option<SectionType>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl SectionPatch {
    pub fn with_kind(mut self, kind: SectionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_width(mut self, weight: f64) -> Self {
        self.width = Some(weight);
        self
    }

    pub fn with_height(mut self, weight: f64) -> Self {
        self.height = Some(weight);
        self
    }

    pub fn from_json(value: &Value) -> Result<Self, IntentError> {
        let mut patch = Self::default();

        for (key, field) in patch_object(value, "section patch")? {
            match key.as_str() {
                "type" => patch.kind = Some(option_input(key, field, SectionType::parse)?),
                "width" => patch.width = Some(numeric_input(field)),
                "height" => patch.height = Some(numeric_input(field)),
                other => {
                    return Err(IntentError::UnknownField {
                        field: other.to_string(),
                    });
                }
            }
        }

        Ok(patch)
    }

    pub(crate) fn apply(&self, section: &mut Section) {
        if let Some(kind) = self.kind {
            section.kind = kind;
        }
        if let Some(width) = self.width {
            section.width = clamp_section_weight(width);
        }
        if let Some(height) = self.height {
            section.height = clamp_section_weight(height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_input_accepts_numbers_and_numeric_strings() {
        assert_eq!(numeric_input(&json!(120)), 120.0);
        assert_eq!(numeric_input(&json!(87.5)), 87.5);
        assert_eq!(numeric_input(&json!(" 140 ")), 140.0);
    }

    #[test]
    fn numeric_input_falls_back_for_garbage() {
        assert_eq!(numeric_input(&json!("abc")), NUMERIC_FALLBACK);
        assert_eq!(numeric_input(&json!("")), NUMERIC_FALLBACK);
        assert_eq!(numeric_input(&json!(null)), NUMERIC_FALLBACK);
        assert_eq!(numeric_input(&json!([1])), NUMERIC_FALLBACK);
        assert_eq!(numeric_input(&json!("inf")), NUMERIC_FALLBACK);
    }

    #[test]
    fn track_input_truncates() {
        assert_eq!(track_input(&json!(3.9)), 3);
        assert_eq!(track_input(&json!("-2")), -2);
        assert_eq!(track_input(&json!("many")), 100);
    }

    #[test]
    fn window_patch_decodes_known_fields() {
        let patch = WindowPatch::from_json(&json!({
            "width": "180",
            "material": "Drewno",
            "glassType": "DoubleChamber",
            "color": "Anthracite",
            "columns": 3
        }))
        .expect("decode");

        assert_eq!(
            patch,
            WindowPatch {
                width: Some(180.0),
                material: Some(Material::Wood),
                glass_type: Some(GlassType::DoubleChamber),
                color: Some(FrameColor::Anthracite),
                columns: Some(3),
                ..WindowPatch::default()
            }
        );
    }

    #[test]
    fn window_patch_rejects_unknown_option_and_field() {
        let err = WindowPatch::from_json(&json!({"material": "Granite"})).expect_err("option");
        assert!(matches!(err, IntentError::UnknownOption { ref field, .. } if field == "material"));

        let err = WindowPatch::from_json(&json!({"id": 4})).expect_err("field");
        assert_eq!(err, IntentError::UnknownField { field: "id".to_string() });

        let err = WindowPatch::from_json(&json!([1, 2])).expect_err("shape");
        assert_eq!(err, IntentError::NotAnObject { what: "window patch" });
    }

    #[test]
    fn window_patch_applies_with_clamping() {
        let mut ids = IdAllocator::default();
        let mut window = Window::new(&mut ids);
        WindowPatch::default()
            .with_width(f64::NAN)
            .with_height(20.0)
            .with_grid(1, 3)
            .apply(&mut window, &mut ids);

        assert_eq!(window.width, NUMERIC_FALLBACK);
        assert_eq!(window.height, 50.0);
        assert_eq!((window.columns, window.rows), (1, 3));
        assert_eq!(window.sections.len(), 3);
    }

    #[test]
    fn window_patch_with_only_rows_keeps_columns() {
        let mut ids = IdAllocator::default();
        let mut window = Window::new(&mut ids);
        let patch = WindowPatch {
            rows: Some(4),
            ..WindowPatch::default()
        };
        patch.apply(&mut window, &mut ids);
        assert_eq!((window.columns, window.rows), (2, 4));
        assert_eq!(window.sections.len(), 8);
    }

    #[test]
    fn section_patch_decodes_and_clamps() {
        let patch = SectionPatch::from_json(&json!({"type": "Uchylne", "width": 500, "height": "x"}))
            .expect("decode");
        assert_eq!(patch.kind, Some(SectionType::Tilt));

        let mut ids = IdAllocator::default();
        let mut section = crate::grid::default_section(&mut ids);
        patch.apply(&mut section);
        assert_eq!(section.kind, SectionType::Tilt);
        assert_eq!(section.width, 200.0);
        assert_eq!(section.height, 100.0);
    }
}
