#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardOptions {
    /// Run the general-info checks before persisting on `next`.
    pub validate_on_next: bool,
    /// `next` on the last step saves and reports `Finished` instead of
    /// staying put.
    pub exit_on_last_step: bool,
    /// Record a success notice after each save.
    pub notify_on_save: bool,
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self {
            validate_on_next: true,
            exit_on_last_step: true,
            notify_on_save: true,
        }
    }
}

impl WizardOptions {
    pub fn with_validate_on_next(mut self, enabled: bool) -> Self {
        self.validate_on_next = enabled;
        self
    }

    pub fn with_exit_on_last_step(mut self, enabled: bool) -> Self {
        self.exit_on_last_step = enabled;
        self
    }

    pub fn with_notify_on_save(mut self, enabled: bool) -> Self {
        self.notify_on_save = enabled;
        self
    }
}
