//! Responsive collapse state for the navigation panels.
//!
//! Panels collapse as the selection moves deeper on narrow viewports and
//! re-expand when the viewport widens. Manual toggles adjust the same state
//! and hold only until the next reflow recomputes it.

/// Pixel width at or below which the hosted web client collapses panels.
///
/// [`PanelState::reflow`] takes the threshold as a parameter so callers can
/// supply a unit that fits their viewport; the chat loop passes
/// `NARROW_TERMINAL_COLS` to apply the same collapse rules to terminal
/// columns. This constant is the canonical threshold in the web client's
/// pixel unit.
pub const MOBILE_BREAKPOINT: u16 = 768;

/// How deep the current selection reaches into the cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionDepth {
    pub project: bool,
    pub session: bool,
}

/// Collapse flags for the two navigation panels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelState {
    pub projects_collapsed: bool,
    pub sessions_collapsed: bool,
}

impl PanelState {
    /// Recompute collapse state for a viewport width and selection depth.
    ///
    /// Wide viewports always expand both panels. On a narrow viewport a
    /// selected session collapses both, a selected project collapses only
    /// the projects panel, and with nothing selected the current state is
    /// kept as-is.
    pub fn reflow(&mut self, width: u16, threshold: u16, depth: SelectionDepth) {
        if width > threshold {
            self.projects_collapsed = false;
            self.sessions_collapsed = false;
        } else if depth.session {
            self.projects_collapsed = true;
            self.sessions_collapsed = true;
        } else if depth.project {
            self.projects_collapsed = true;
        }
    }

    pub fn toggle_projects(&mut self) {
        self.projects_collapsed = !self.projects_collapsed;
    }

    pub fn toggle_sessions(&mut self) {
        self.sessions_collapsed = !self.sessions_collapsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u16 = MOBILE_BREAKPOINT;

    fn depth(project: bool, session: bool) -> SelectionDepth {
        SelectionDepth { project, session }
    }

    #[test]
    fn narrow_viewport_collapses_as_selection_deepens() {
        let mut panels = PanelState::default();

        panels.reflow(500, T, depth(false, false));
        assert_eq!(panels, PanelState::default());

        panels.reflow(500, T, depth(true, false));
        assert!(panels.projects_collapsed);
        assert!(!panels.sessions_collapsed);

        panels.reflow(500, T, depth(true, true));
        assert!(panels.projects_collapsed);
        assert!(panels.sessions_collapsed);
    }

    #[test]
    fn widening_expands_everything_regardless_of_selection() {
        let mut panels = PanelState {
            projects_collapsed: true,
            sessions_collapsed: true,
        };
        panels.reflow(1024, T, depth(true, true));
        assert_eq!(panels, PanelState::default());
    }

    #[test]
    fn threshold_width_still_counts_as_narrow() {
        let mut panels = PanelState::default();
        panels.reflow(T, T, depth(true, true));
        assert!(panels.projects_collapsed && panels.sessions_collapsed);
    }

    #[test]
    fn project_selection_leaves_session_panel_alone() {
        let mut panels = PanelState {
            projects_collapsed: false,
            sessions_collapsed: true,
        };
        panels.reflow(500, T, depth(true, false));
        assert!(panels.projects_collapsed);
        // Only the projects panel is forced; a manual session collapse holds.
        assert!(panels.sessions_collapsed);
    }

    #[test]
    fn manual_toggle_holds_until_the_next_reflow() {
        let mut panels = PanelState::default();
        panels.reflow(500, T, depth(true, true));
        panels.toggle_projects();
        assert!(!panels.projects_collapsed);

        panels.reflow(500, T, depth(true, true));
        assert!(panels.projects_collapsed);
    }
}
