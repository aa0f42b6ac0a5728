//! Price estimate for a window and for a whole project.
//!
//! ```text
//! price = 500 * (w*h / 10000) * (1 + 0.3*material) * (1 + 0.4*glass)
//!             * (1 + 0.1*sections) * installation
//! ```
//!
//! `material` and `glass` are catalog ordinals. Prices keep full precision;
//! only [`format_price`] rounds.

use serde::Serialize;

use crate::catalog::InstallationClass;
use crate::model::{Project, Window};

pub const BASE_PRICE: f64 = 500.0;
pub const AREA_DIVISOR_CM2: f64 = 10_000.0;
pub const MATERIAL_STEP: f64 = 0.3;
pub const GLASS_STEP: f64 = 0.4;
pub const SECTION_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base: f64,
    pub area_multiplier: f64,
    pub material_multiplier: f64,
    pub glass_multiplier: f64,
    pub sections_multiplier: f64,
    pub installation_multiplier: f64,
    pub total: f64,
}

impl PriceBreakdown {
    pub fn for_window(window: &Window, installation: InstallationClass) -> Self {
        let area_multiplier = (window.width * window.height) / AREA_DIVISOR_CM2;
        let material_multiplier = window.material.ordinal() as f64 * MATERIAL_STEP + 1.0;
        let glass_multiplier = window.glass_type.ordinal() as f64 * GLASS_STEP + 1.0;
        let sections_multiplier = window.section_count() as f64 * SECTION_STEP + 1.0;
        let installation_multiplier = installation.multiplier();

        let window_price = BASE_PRICE
            * area_multiplier
            * material_multiplier
            * glass_multiplier
            * sections_multiplier;

        Self {
            base: BASE_PRICE,
            area_multiplier,
            material_multiplier,
            glass_multiplier,
            sections_multiplier,
            installation_multiplier,
            total: window_price * installation_multiplier,
        }
    }
}

pub fn price(window: &Window, installation: InstallationClass) -> f64 {
    PriceBreakdown::for_window(window, installation).total
}

pub fn total_price(project: &Project) -> f64 {
    let installation = project.installation_type();
    project
        .windows()
        .iter()
        .map(|window| price(window, installation))
        .sum()
}

pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Two-decimal display form in the source currency, e.g. `5250.00 zł`.
pub fn format_price(amount: f64) -> String {
    format!("{amount:.2} zł")
}
