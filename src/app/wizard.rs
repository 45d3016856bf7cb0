use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    domain::{GeometryError, Household, StepId},
    form::{Dispatched, LookupApplied, LookupResponse, LookupTicket, StepIntent, WizardState},
    io::{ApiError, HouseholdStore, SaveReceipt},
};

use super::{
    gate::SaveGate,
    options::WizardOptions,
    status::{Notice, SAVED_MESSAGE},
    validation::{GeneralInfoValidator, ValidationIssue},
};

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("{0}")]
    Validation(ValidationIssue),
    #[error("a save is already in progress")]
    Busy,
    #[error(transparent)]
    Persist(#[from] ApiError),
}

/// What a successful `next` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTransition {
    Advanced(StepId),
    /// Saved on the last step; the caller should leave the wizard.
    Finished,
    /// Saved on the last step with `exit_on_last_step` off.
    Stayed,
}

/// Multi-step household editor: owns the edit state, gates navigation on
/// validation, and persists the whole household before moving forward.
pub struct Wizard {
    household_id: String,
    state: WizardState,
    store: Arc<dyn HouseholdStore>,
    validator: GeneralInfoValidator,
    gate: SaveGate,
    options: WizardOptions,
    notice: Option<Notice>,
}

impl Wizard {
    /// An empty wizard for `household_id`.
    pub fn new(household_id: impl Into<String>, store: Arc<dyn HouseholdStore>) -> Result<Self> {
        Ok(Self {
            household_id: household_id.into(),
            state: WizardState::new(),
            store,
            validator: GeneralInfoValidator::new()?,
            gate: SaveGate::new(),
            options: WizardOptions::default(),
            notice: None,
        })
    }

    /// Edit mode. The returned tickets preload every selector level the
    /// record already has a parent for.
    pub fn open(
        household: Household,
        store: Arc<dyn HouseholdStore>,
    ) -> Result<(Self, Vec<LookupTicket>)> {
        let mut wizard = Self::new(household.id, store)?;
        let tickets = wizard.state.seed(household.payload);
        Ok((wizard, tickets))
    }

    pub async fn load(
        household_id: &str,
        store: Arc<dyn HouseholdStore>,
    ) -> Result<(Self, Vec<LookupTicket>)> {
        let household = store
            .load_household(household_id)
            .await
            .with_context(|| format!("failed to load household {household_id}"))?;
        Self::open(household, store)
    }

    pub fn with_options(mut self, options: WizardOptions) -> Self {
        self.options = options;
        self
    }

    pub fn household_id(&self) -> &str {
        &self.household_id
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> StepId {
        self.state.current_step()
    }

    pub fn options(&self) -> &WizardOptions {
        &self.options
    }

    /// Shared handle on the at-most-one-save flag.
    pub fn gate(&self) -> SaveGate {
        self.gate.clone()
    }

    pub fn is_saving(&self) -> bool {
        self.gate.is_saving()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn dispatch(&mut self, intent: StepIntent) -> Result<Dispatched, GeometryError> {
        self.state.dispatch(intent)
    }

    pub fn load_regions(&mut self) -> LookupTicket {
        self.state.load_regions()
    }

    pub fn apply_lookup(&mut self, response: LookupResponse) -> LookupApplied {
        self.state.apply_lookup(response)
    }

    /// First blocking issue of the current step. Only the general step has
    /// client-side checks.
    pub fn validate_current(&self) -> Option<ValidationIssue> {
        match self.current_step() {
            StepId::General => self.validator.first_issue(self.state.general()),
            _ => None,
        }
    }

    /// Validate, save, then advance. On any failure the step index and the
    /// in-memory edits stay as they were.
    pub async fn next(&mut self) -> Result<StepTransition, WizardError> {
        let current = self.current_step();
        if self.options.validate_on_next
            && let Some(issue) = self.validate_current()
        {
            debug!(step = %current, field = %issue.field, "validation blocked next");
            self.notice = Some(Notice::from_validation(&issue));
            return Err(WizardError::Validation(issue));
        }

        self.persist().await?;

        match StepId::from_number(current.number() + 1) {
            Some(next) => {
                self.state.set_current(next);
                info!(household = %self.household_id, step = %next, "advanced");
                Ok(StepTransition::Advanced(next))
            }
            None if self.options.exit_on_last_step => Ok(StepTransition::Finished),
            None => Ok(StepTransition::Stayed),
        }
    }

    /// Moves back one step without saving; stays on the first step.
    pub fn previous(&mut self) -> StepId {
        let current = self.current_step();
        if let Some(previous) = current.number().checked_sub(1).and_then(StepId::from_number) {
            self.state.set_current(previous);
        }
        self.current_step()
    }

    /// Jumps back to an earlier (or the current) step. Forward jumps would
    /// skip validation and are refused.
    pub fn go_to(&mut self, step: StepId) -> bool {
        if step.number() > self.current_step().number() {
            debug!(from = %self.current_step(), to = %step, "refusing forward jump");
            return false;
        }
        self.state.set_current(step);
        true
    }

    /// Saves without moving.
    pub async fn save(&mut self) -> Result<SaveReceipt, WizardError> {
        self.persist().await
    }

    async fn persist(&mut self) -> Result<SaveReceipt, WizardError> {
        let Some(_permit) = self.gate.try_acquire() else {
            self.notice = Some(Notice::info("A save is already in progress."));
            return Err(WizardError::Busy);
        };
        let payload = self.state.payload();
        match self.store.save_household(&self.household_id, &payload).await {
            Ok(receipt) => {
                self.state.mark_saved();
                if self.options.notify_on_save {
                    let message = if receipt.message.trim().is_empty() {
                        SAVED_MESSAGE
                    } else {
                        receipt.message.as_str()
                    };
                    self.notice = Some(Notice::success(message));
                }
                Ok(receipt)
            }
            Err(err) => {
                warn!(household = %self.household_id, error = %err, "saving household failed");
                self.notice = Some(Notice::from_api_error(&err));
                Err(WizardError::Persist(err))
            }
        }
    }
}

impl std::fmt::Debug for Wizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("household_id", &self.household_id)
            .field("state", &self.state)
            .field("options", &self.options)
            .field("notice", &self.notice)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::domain::HouseholdPayload;

    struct NeverCalled;

    #[async_trait]
    impl HouseholdStore for NeverCalled {
        async fn load_household(&self, _id: &str) -> Result<Household, ApiError> {
            panic!("load should not be called")
        }

        async fn save_household(
            &self,
            _id: &str,
            _payload: &HouseholdPayload,
        ) -> Result<SaveReceipt, ApiError> {
            panic!("save should not be called")
        }
    }

    #[test]
    fn previous_floors_at_first_step() {
        let mut wizard = Wizard::new("hh-1", Arc::new(NeverCalled)).unwrap();
        assert_eq!(wizard.previous(), StepId::General);
    }

    #[test]
    fn forward_jumps_are_refused() {
        let mut wizard = Wizard::new("hh-1", Arc::new(NeverCalled)).unwrap();
        assert!(!wizard.go_to(StepId::Location));
        assert!(wizard.go_to(StepId::General));
        assert_eq!(wizard.current_step(), StepId::General);
    }

    #[tokio::test]
    async fn next_on_incomplete_general_step_never_saves() {
        let mut wizard = Wizard::new("hh-1", Arc::new(NeverCalled)).unwrap();
        let err = wizard.next().await.unwrap_err();
        assert!(matches!(err, WizardError::Validation(_)));
        assert_eq!(wizard.current_step(), StepId::General);
        assert!(wizard.notice().unwrap().is_error());
    }
}
