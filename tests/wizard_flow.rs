use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use surveyform::{
    ApiError, FieldEdit, GeneralField, GeneralInfo, Household, HouseholdPayload, HouseholdStore,
    NoticeKind, StepId, StepIntent, StepTransition, TechnicalField, Wizard, WizardError,
    WizardOptions,
    app::{GENERIC_ERROR_MESSAGE, SESSION_EXPIRED_MESSAGE},
    domain::SubmissionStatus,
    io::{SaveReceipt, classify_failure},
};

#[derive(Default)]
struct ScriptedStore {
    replies: Mutex<VecDeque<Result<SaveReceipt, ApiError>>>,
    saved: Mutex<Vec<HouseholdPayload>>,
    existing: Option<Household>,
}

impl ScriptedStore {
    fn replying(replies: impl IntoIterator<Item = Result<SaveReceipt, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        })
    }

    fn saves(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

#[async_trait]
impl HouseholdStore for ScriptedStore {
    async fn load_household(&self, id: &str) -> Result<Household, ApiError> {
        self.existing.clone().ok_or(ApiError::Server {
            status: 404,
            message: Some(format!("household {id} not found")),
        })
    }

    async fn save_household(
        &self,
        _id: &str,
        payload: &HouseholdPayload,
    ) -> Result<SaveReceipt, ApiError> {
        self.saved.lock().unwrap().push(payload.clone());
        self.replies.lock().unwrap().pop_front().unwrap_or(Ok(SaveReceipt {
            message: "Saved".into(),
        }))
    }
}

fn ok(message: &str) -> Result<SaveReceipt, ApiError> {
    Ok(SaveReceipt {
        message: message.into(),
    })
}

fn complete_general() -> GeneralInfo {
    GeneralInfo {
        head_name: Some("Siti Aminah".into()),
        nik: Some("3171234567890001".into()),
        address: Some("Jl. Melati 4".into()),
        province_id: Some("31".into()),
        regency_id: Some("3171".into()),
        district_id: Some("317101".into()),
        village_id: Some("3171011001".into()),
        ..GeneralInfo::default()
    }
}

fn household(general: GeneralInfo) -> Household {
    Household {
        id: "hh-9".into(),
        status: SubmissionStatus::Draft,
        rejection_reason: None,
        payload: HouseholdPayload {
            general,
            ..HouseholdPayload::default()
        },
    }
}

#[tokio::test]
async fn next_saves_then_advances() {
    let store = ScriptedStore::replying([ok("General information saved.")]);
    let (mut wizard, tickets) = Wizard::open(household(complete_general()), store.clone()).unwrap();
    assert_eq!(tickets.len(), 4);

    let transition = wizard.next().await.unwrap();
    assert_eq!(transition, StepTransition::Advanced(StepId::Technical));
    assert_eq!(store.saves(), 1);
    let notice = wizard.notice().unwrap();
    assert_eq!(notice.kind(), NoticeKind::Success);
    assert_eq!(notice.message(), "General information saved.");
}

#[tokio::test]
async fn missing_province_blocks_next_without_saving() {
    let store = ScriptedStore::replying([]);
    let general = GeneralInfo {
        province_id: None,
        regency_id: None,
        district_id: None,
        village_id: None,
        ..complete_general()
    };
    let (mut wizard, _) = Wizard::open(household(general), store.clone()).unwrap();

    let err = wizard.next().await.unwrap_err();
    match err {
        WizardError::Validation(issue) => assert_eq!(issue.message, "Province is required"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(wizard.current_step(), StepId::General);
    assert_eq!(store.saves(), 0);
}

#[tokio::test]
async fn expired_session_keeps_step_and_edits() {
    let store = ScriptedStore::replying([
        Err(classify_failure(419, "{\"message\":\"CSRF token mismatch.\"}")),
        ok(""),
    ]);
    let (mut wizard, _) = Wizard::open(household(complete_general()), store.clone()).unwrap();
    wizard
        .dispatch(StepIntent::General(FieldEdit::set(GeneralField::MaleMembers, 2u32)))
        .unwrap();

    let err = wizard.next().await.unwrap_err();
    assert!(matches!(err, WizardError::Persist(ApiError::SessionExpired { status: 419 })));
    assert_eq!(wizard.current_step(), StepId::General);
    assert_eq!(wizard.state().general().male_members, Some(2));
    assert!(wizard.state().has_unsaved_changes());
    let notice = wizard.take_notice().unwrap();
    assert_eq!(notice.kind(), NoticeKind::SessionExpired);
    assert_eq!(notice.message(), SESSION_EXPIRED_MESSAGE);

    assert!(!wizard.is_saving());
    assert_eq!(
        wizard.next().await.unwrap(),
        StepTransition::Advanced(StepId::Technical)
    );
    assert!(!wizard.state().has_unsaved_changes());
}

#[tokio::test]
async fn server_error_yields_generic_notice() {
    let store = ScriptedStore::replying([Err(classify_failure(500, "<html>oops</html>"))]);
    let (mut wizard, _) = Wizard::open(household(complete_general()), store).unwrap();
    let err = wizard.save().await.unwrap_err();
    assert!(matches!(err, WizardError::Persist(ApiError::Server { status: 500, .. })));
    let notice = wizard.notice().unwrap();
    assert_eq!(notice.kind(), NoticeKind::Error);
    assert_eq!(notice.message(), GENERIC_ERROR_MESSAGE);
    assert!(!wizard.is_saving());
}

#[tokio::test]
async fn overlapping_save_is_refused() {
    let store = ScriptedStore::replying([]);
    let (mut wizard, _) = Wizard::open(household(complete_general()), store.clone()).unwrap();
    let gate = wizard.gate();
    let permit = gate.try_acquire().unwrap();

    assert!(matches!(wizard.next().await, Err(WizardError::Busy)));
    assert_eq!(store.saves(), 0);
    assert_eq!(wizard.current_step(), StepId::General);

    drop(permit);
    assert!(wizard.next().await.is_ok());
}

#[tokio::test]
async fn last_step_saves_and_finishes() {
    let store = ScriptedStore::replying([]);
    let (mut wizard, _) = Wizard::open(household(complete_general()), store.clone()).unwrap();
    assert_eq!(wizard.next().await.unwrap(), StepTransition::Advanced(StepId::Technical));
    wizard
        .dispatch(StepIntent::Technical(FieldEdit::set(TechnicalField::BuildingLength, 8.0)))
        .unwrap();
    assert_eq!(wizard.next().await.unwrap(), StepTransition::Advanced(StepId::Location));
    assert_eq!(wizard.next().await.unwrap(), StepTransition::Finished);
    assert_eq!(store.saves(), 3);
    assert_eq!(
        store.saved.lock().unwrap()[1].technical.building_length,
        Some(8.0)
    );
}

#[tokio::test]
async fn last_step_can_stay_put() {
    let store = ScriptedStore::replying([]);
    let (wizard, _) = Wizard::open(household(complete_general()), store).unwrap();
    let mut wizard = wizard.with_options(WizardOptions::default().with_exit_on_last_step(false));
    wizard.next().await.unwrap();
    wizard.next().await.unwrap();
    assert_eq!(wizard.next().await.unwrap(), StepTransition::Stayed);
    assert_eq!(wizard.current_step(), StepId::Location);
    assert_eq!(wizard.previous(), StepId::Technical);
    assert!(wizard.go_to(StepId::General));
}

#[tokio::test]
async fn load_reports_missing_household() {
    let store = ScriptedStore::replying([]);
    let err = Wizard::load("hh-404", store).await.unwrap_err();
    assert!(format!("{err:#}").contains("household hh-404 not found"));

    let store = Arc::new(ScriptedStore {
        existing: Some(household(complete_general())),
        ..ScriptedStore::default()
    });
    let (wizard, tickets) = Wizard::load("hh-9", store).await.unwrap();
    assert_eq!(wizard.household_id(), "hh-9");
    assert_eq!(tickets.len(), 4);
    assert_eq!(wizard.state().general().head_name.as_deref(), Some("Siti Aminah"));
}
