use serde::Serialize;
use serde_json::Value;

use crate::editor::{Editor, Selection};
use crate::model::Project;
use crate::preview::PreviewLayout;
use crate::pricing::{PriceBreakdown, format_price, round_to_cents};

pub const APP_TITLE: &str = "Konfigurator okien";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WindowPrice {
    price: f64,
    display: String,
    breakdown: PriceBreakdown,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PricingView {
    windows: Vec<WindowPrice>,
    total: f64,
    total_display: String,
}

#[derive(Debug, Serialize)]
struct AppView {
    title: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewModel<'a> {
    app: AppView,
    project: &'a Project,
    selection: &'a Selection,
    can_remove_window: bool,
    pricing: PricingView,
    preview: PreviewLayout,
}

fn pricing_view(project: &Project) -> PricingView {
    let installation = project.installation_type();
    let windows = project
        .windows()
        .iter()
        .map(|window| {
            let breakdown = PriceBreakdown::for_window(window, installation);
            WindowPrice {
                price: round_to_cents(breakdown.total),
                display: format_price(breakdown.total),
                breakdown,
            }
        })
        .collect();
    let total = project.total_price();

    PricingView {
        windows,
        total: round_to_cents(total),
        total_display: format_price(total),
    }
}

/// Full view model for the front-end, rebuilt from the editor on every call.
pub fn render_view_model(editor: &Editor) -> serde_json::Result<Value> {
    let project = editor.project();
    let vm = ViewModel {
        app: AppView { title: APP_TITLE },
        project,
        selection: editor.selection(),
        can_remove_window: project.window_count() > 1,
        pricing: pricing_view(project),
        preview: PreviewLayout::for_window(editor.active_window()),
    };
    serde_json::to_value(vm)
}

/// Plain structural snapshot handed to an external persistence component.
pub fn project_snapshot(project: &Project) -> serde_json::Result<Value> {
    serde_json::to_value(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InstallationClass;

    #[test]
    fn view_model_carries_project_prices_and_preview() {
        let mut editor = Editor::new();
        editor.set_installation_type(InstallationClass::Atypical);
        let vm = render_view_model(&editor).expect("vm");

        assert_eq!(vm["app"]["title"], APP_TITLE);
        assert_eq!(vm["project"]["windows"].as_array().map(Vec::len), Some(1));
        assert_eq!(vm["selection"]["window"], 0);
        assert!(vm["selection"]["section"].is_null());
        assert_eq!(vm["canRemoveWindow"], false);
        assert_eq!(vm["pricing"]["windows"][0]["display"], "7875.00 zł");
        assert_eq!(vm["pricing"]["totalDisplay"], "7875.00 zł");
        assert_eq!(vm["preview"]["cells"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn preview_follows_active_window() {
        let mut editor = Editor::new();
        editor.add_window();
        editor.resize_grid(1, 3, 1);
        let vm = render_view_model(&editor).expect("vm");

        assert_eq!(vm["selection"]["window"], 1);
        assert_eq!(vm["canRemoveWindow"], true);
        assert_eq!(vm["preview"]["columnTemplate"], "100fr 100fr 100fr");
    }

    #[test]
    fn snapshot_has_no_presentation_state() {
        let editor = Editor::new();
        let snapshot = project_snapshot(editor.project()).expect("snapshot");
        let object = snapshot.as_object().expect("object");
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["installationType", "windows"]);
    }
}
