use std::time::Duration;

/// Quiet period after the last edit before a save is sent.
pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_secs(2);

/// How long "saved" stays visible before falling back to idle.
pub const DEFAULT_SAVED_DISPLAY: Duration = Duration::from_secs(3);

/// Title used for drafts created before the user typed one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Timing and naming knobs for an editing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub save_debounce: Duration,
    pub saved_display: Duration,
    pub default_title: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            save_debounce: DEFAULT_SAVE_DEBOUNCE,
            saved_display: DEFAULT_SAVED_DISPLAY,
            default_title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl SyncConfig {
    pub fn with_save_debounce(mut self, delay: Duration) -> Self {
        self.save_debounce = delay;
        self
    }

    pub fn with_saved_display(mut self, delay: Duration) -> Self {
        self.saved_display = delay;
        self
    }

    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// Title to create a draft with: the current one unless it is blank.
    pub fn title_for_draft(&self, current: &str) -> String {
        if current.trim().is_empty() {
            self.default_title.clone()
        } else {
            current.to_string()
        }
    }
}
