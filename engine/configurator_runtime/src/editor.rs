use serde::Serialize;

use crate::catalog::InstallationClass;
use crate::error::IntentError;
use crate::intent::Intent;
use crate::model::{Project, Window};
use crate::patch::{SectionPatch, WindowPatch};

/// Presentation state kept next to the project. Not part of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub window: usize,
    pub section: Option<usize>,
    pub menu_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEffect {
    Updated,
    SaveRequested,
}

/// One editing session: the current project value plus the selection.
///
/// `selection.window` always indexes an existing window.
#[derive(Debug, Clone, Default)]
pub struct Editor {
    project: Project,
    selection: Selection,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_project(project: Project) -> Self {
        Self {
            project,
            selection: Selection::default(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_window_index(&self) -> usize {
        self.selection.window
    }

    pub fn active_window(&self) -> &Window {
        // selection.window is kept in range by every mutation below.
        &self.project.windows()[self.selection.window]
    }

    pub fn apply(&mut self, intent: &Intent) -> Result<EditorEffect, IntentError> {
        match intent {
            Intent::AddWindow => self.add_window(),
            Intent::RemoveWindow { index } => self.remove_window(*index)?,
            Intent::SelectWindow { index } => self.select_window(*index)?,
            Intent::UpdateWindow { window, patch } => {
                let index = self.target_window(*window)?;
                self.update_window(index, patch);
            }
            Intent::ResizeGrid {
                window,
                columns,
                rows,
            } => {
                let index = self.target_window(*window)?;
                self.resize_grid(index, *columns, *rows);
            }
            Intent::SelectSection { index } => self.select_section(*index)?,
            Intent::UpdateSection {
                window,
                section,
                patch,
            } => {
                let index = self.target_window(*window)?;
                self.update_section(index, *section, patch)?;
            }
            Intent::SetInstallation(class) => self.set_installation_type(*class),
            Intent::ToggleMenu => self.toggle_menu(),
            Intent::SaveProject => return Ok(EditorEffect::SaveRequested),
        }

        Ok(EditorEffect::Updated)
    }

    /// Appends a default window and makes it active.
    pub fn add_window(&mut self) {
        self.project = self.project.add_window();
        self.selection.window = self.project.window_count() - 1;
        self.selection.section = None;
    }

    /// Removes a window, then steps the active index back by one.
    ///
    /// Removing the only window changes nothing.
    pub fn remove_window(&mut self, index: usize) -> Result<(), IntentError> {
        self.check_window(index)?;
        if self.project.window_count() == 1 {
            tracing::debug!(
                target: "configurator.session",
                index,
                "refusing to remove the last window"
            );
            return Ok(());
        }

        self.project = self.project.remove_window(index);
        let last = self.project.window_count() - 1;
        self.selection.window = self.selection.window.saturating_sub(1).min(last);
        self.selection.section = None;
        Ok(())
    }

    pub fn select_window(&mut self, index: usize) -> Result<(), IntentError> {
        self.check_window(index)?;
        if self.selection.window != index {
            self.selection.window = index;
            self.selection.section = None;
        }
        Ok(())
    }

    pub fn select_section(&mut self, index: Option<usize>) -> Result<(), IntentError> {
        if let Some(index) = index {
            let len = self.active_window().section_count();
            if index >= len {
                return Err(IntentError::SectionOutOfRange { index, len });
            }
        }
        self.selection.section = index;
        Ok(())
    }

    pub fn toggle_menu(&mut self) {
        self.selection.menu_open = !self.selection.menu_open;
    }

    pub fn update_window(&mut self, index: usize, patch: &WindowPatch) {
        self.project = self.project.update_window(index, patch);
        self.drop_stale_section();
    }

    pub fn resize_grid(&mut self, index: usize, columns: i64, rows: i64) {
        self.project = self.project.resize_grid(index, columns, rows);
        self.drop_stale_section();
    }

    pub fn update_section(
        &mut self,
        window_index: usize,
        section_index: usize,
        patch: &SectionPatch,
    ) -> Result<(), IntentError> {
        self.check_window(window_index)?;
        let len = self.project.windows()[window_index].section_count();
        if section_index >= len {
            return Err(IntentError::SectionOutOfRange {
                index: section_index,
                len,
            });
        }

        self.project = self
            .project
            .update_section(window_index, section_index, patch);
        Ok(())
    }

    pub fn set_installation_type(&mut self, class: InstallationClass) {
        self.project = self.project.set_installation_type(class);
    }

    fn target_window(&self, window: Option<usize>) -> Result<usize, IntentError> {
        let index = window.unwrap_or(self.selection.window);
        self.check_window(index)?;
        Ok(index)
    }

    fn check_window(&self, index: usize) -> Result<(), IntentError> {
        let len = self.project.window_count();
        if index < len {
            Ok(())
        } else {
            Err(IntentError::WindowOutOfRange { index, len })
        }
    }

    fn drop_stale_section(&mut self) {
        let len = self.active_window().section_count();
        if self.selection.section.is_some_and(|section| section >= len) {
            self.selection.section = None;
        }
    }
}
