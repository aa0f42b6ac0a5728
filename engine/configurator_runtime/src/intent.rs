use serde_json::Value;

use crate::catalog::InstallationClass;
use crate::error::IntentError;
use crate::patch::{SectionPatch, WindowPatch, track_input};

pub const WINDOW_ADD: &str = "window.add";
pub const WINDOW_REMOVE: &str = "window.remove";
pub const WINDOW_SELECT: &str = "window.select";
pub const WINDOW_UPDATE: &str = "window.update";
pub const WINDOW_GRID: &str = "window.grid";
pub const SECTION_SELECT: &str = "section.select";
pub const SECTION_UPDATE: &str = "section.update";
pub const INSTALLATION_SET: &str = "installation.set";
pub const MENU_TOGGLE: &str = "menu.toggle";
pub const PROJECT_SAVE: &str = "project.save";

/// A decoded user action. `window: None` targets the active window.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    AddWindow,
    RemoveWindow {
        index: usize,
    },
    SelectWindow {
        index: usize,
    },
    UpdateWindow {
        window: Option<usize>,
        patch: WindowPatch,
    },
    ResizeGrid {
        window: Option<usize>,
        columns: i64,
        rows: i64,
    },
    SelectSection {
        index: Option<usize>,
    },
    UpdateSection {
        window: Option<usize>,
        section: usize,
        patch: SectionPatch,
    },
    SetInstallation(InstallationClass),
    ToggleMenu,
    SaveProject,
}

impl Intent {
    /// Decodes an intent envelope's `name` and `payload`.
    ///
    /// Single-argument intents also accept the `{"arg": "..."}` form that
    /// string-only UI bridges send.
    pub fn decode(name: &str, payload: &Value) -> Result<Self, IntentError> {
        match name {
            WINDOW_ADD => Ok(Intent::AddWindow),
            WINDOW_REMOVE => Ok(Intent::RemoveWindow {
                index: required_index(payload, "index")?,
            }),
            WINDOW_SELECT => Ok(Intent::SelectWindow {
                index: required_index(payload, "index")?,
            }),
            WINDOW_UPDATE => Ok(Intent::UpdateWindow {
                window: optional_index(payload, "window")?,
                patch: WindowPatch::from_json(required(payload, "patch")?)?,
            }),
            WINDOW_GRID => Ok(Intent::ResizeGrid {
                window: optional_index(payload, "window")?,
                columns: track_input(required(payload, "columns")?),
                rows: track_input(required(payload, "rows")?),
            }),
            SECTION_SELECT => Ok(Intent::SelectSection {
                index: optional_index(payload, "index")?,
            }),
            SECTION_UPDATE => Ok(Intent::UpdateSection {
                window: optional_index(payload, "window")?,
                section: required_index(payload, "section")?,
                patch: SectionPatch::from_json(required(payload, "patch")?)?,
            }),
            INSTALLATION_SET => {
                let raw = field_or_arg(payload, "type").ok_or(IntentError::MissingField {
                    field: "type",
                })?;
                raw.as_str()
                    .and_then(InstallationClass::parse)
                    .map(Intent::SetInstallation)
                    .ok_or_else(|| IntentError::UnknownOption {
                        field: "type".to_string(),
                        value: raw.to_string(),
                    })
            }
            MENU_TOGGLE => Ok(Intent::ToggleMenu),
            PROJECT_SAVE => Ok(Intent::SaveProject),
            other => Err(IntentError::UnknownIntent {
                name: other.to_string(),
            }),
        }
    }
}

fn field_or_arg<'a>(payload: &'a Value, field: &str) -> Option<&'a Value> {
    payload
        .get(field)
        .or_else(|| payload.get("arg"))
        .filter(|value| !value.is_null())
}

fn required<'a>(payload: &'a Value, field: &'static str) -> Result<&'a Value, IntentError> {
    payload
        .get(field)
        .filter(|value| !value.is_null())
        .ok_or(IntentError::MissingField { field })
}

fn parse_index(field: &str, value: &Value) -> Result<usize, IntentError> {
    let parsed = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(raw) => raw.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed
        .and_then(|index| usize::try_from(index).ok())
        .ok_or_else(|| IntentError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn required_index(payload: &Value, field: &'static str) -> Result<usize, IntentError> {
    let value = field_or_arg(payload, field).ok_or(IntentError::MissingField { field })?;
    parse_index(field, value)
}

fn optional_index(payload: &Value, field: &'static str) -> Result<Option<usize>, IntentError> {
    match payload.get(field).filter(|value| !value.is_null()) {
        Some(value) => parse_index(field, value).map(Some),
        None => Ok(None),
    }
}
