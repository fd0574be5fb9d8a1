//! Show/hide toggle driven by the global hotkey

/// What the view must do after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChange {
    /// Window hidden
    Hidden,
    /// Window shown; bring it to the foreground
    ShownAndFocused,
}

#[derive(Debug, Clone, Copy)]
pub struct VisibilityToggle {
    visible: bool,
}

impl VisibilityToggle {
    pub fn new(visible: bool) -> Self {
        Self { visible }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) -> VisibilityChange {
        self.visible = !self.visible;
        if self.visible {
            VisibilityChange::ShownAndFocused
        } else {
            VisibilityChange::Hidden
        }
    }
}
