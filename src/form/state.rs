use tracing::debug;

use crate::domain::{
    DrawEvent, FieldId, FieldValue, GeneralField, GeneralInfo, GeometryError, GeometryType,
    HouseholdPayload, LookupOption, MapLocation, MapShape, RegionLevel, StepId, TechnicalData,
    TechnicalField,
};

use super::{
    actions::{FieldEdit, StepIntent},
    cascade::{LookupApplied, LookupResponse, LookupTicket, RegionChain},
    engine::{FormEngine, RecordChange},
};

/// A change notice tagged with the step it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum StepChange {
    General(RecordChange<GeneralInfo>),
    Technical(RecordChange<TechnicalData>),
    Location(RecordChange<MapLocation>),
}

impl StepChange {
    pub fn step(&self) -> StepId {
        match self {
            StepChange::General(_) => StepId::General,
            StepChange::Technical(_) => StepId::Technical,
            StepChange::Location(_) => StepId::Location,
        }
    }

    pub fn changed_names(&self) -> Vec<&'static str> {
        match self {
            StepChange::General(change) => change.changed_names(),
            StepChange::Technical(change) => change.changed_names(),
            StepChange::Location(change) => change.changed_names(),
        }
    }
}

/// Everything one intent produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatched {
    pub changes: Vec<StepChange>,
    pub lookups: Vec<LookupTicket>,
}

impl Dispatched {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.lookups.is_empty()
    }
}

/// Aggregate edit state of the household wizard.
///
/// Fields are private: readers get shared references, and the only way to
/// mutate is [`WizardState::dispatch`].
#[derive(Debug, Clone)]
pub struct WizardState {
    current: StepId,
    general: FormEngine<GeneralInfo>,
    technical: FormEngine<TechnicalData>,
    location: FormEngine<MapLocation>,
    regions: RegionChain,
    dirty: [bool; 3],
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current: StepId::General,
            general: FormEngine::default(),
            technical: FormEngine::default(),
            location: FormEngine::default(),
            regions: RegionChain::new(),
            dirty: [false; 3],
        }
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit-mode construction. Returns the lookups needed to preload every
    /// selector level.
    pub fn from_payload(payload: HouseholdPayload) -> (Self, Vec<LookupTicket>) {
        let mut state = Self::default();
        let tickets = state.seed(payload);
        (state, tickets)
    }

    /// Replaces all step records without cascading and marks them clean.
    pub fn seed(&mut self, payload: HouseholdPayload) -> Vec<LookupTicket> {
        let HouseholdPayload {
            general,
            mut technical,
            location,
        } = payload;
        self.general.seed(general);
        technical.household_members = self.general.record().total_members;
        self.technical.seed(technical);
        self.location.seed(location);
        self.dirty = [false; 3];
        self.regions.seed_from_existing(self.general.record())
    }

    pub fn current_step(&self) -> StepId {
        self.current
    }

    pub fn general(&self) -> &GeneralInfo {
        self.general.record()
    }

    pub fn technical(&self) -> &TechnicalData {
        self.technical.record()
    }

    pub fn location(&self) -> &MapLocation {
        self.location.record()
    }

    pub fn regions(&self) -> &RegionChain {
        &self.regions
    }

    pub fn is_dirty(&self, step: StepId) -> bool {
        self.dirty[step.number() - 1]
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty.iter().any(|dirty| *dirty)
    }

    pub fn payload(&self) -> HouseholdPayload {
        HouseholdPayload {
            general: self.general.record().clone(),
            technical: self.technical.record().clone(),
            location: self.location.record().clone(),
        }
    }

    pub fn dispatch(&mut self, intent: StepIntent) -> Result<Dispatched, GeometryError> {
        let mut out = Dispatched::default();
        match intent {
            StepIntent::General(FieldEdit { field, value }) => {
                if let Some(level) = region_level_for(field) {
                    let option = match value.as_ref().map(FieldValue::as_str) {
                        None => None,
                        Some(Some(id)) => Some(self.known_option(level, id)),
                        Some(None) => {
                            debug!(
                                %level,
                                field = field.name(),
                                "ignoring region id of the wrong kind"
                            );
                            return Ok(out);
                        }
                    };
                    self.select_region(level, option, &mut out);
                } else if let Some(change) = self.general.update_field(field, value) {
                    self.after_general(change, &mut out);
                }
            }
            StepIntent::SelectRegion { level, option } => {
                self.select_region(level, option, &mut out);
            }
            StepIntent::Technical(FieldEdit { field, value }) => {
                if let Some(change) = self.technical.update_field(field, value) {
                    out.changes.push(StepChange::Technical(change));
                }
            }
            StepIntent::Location(FieldEdit { field, value }) => {
                if let Some(change) = self.location.update_field(field, value) {
                    out.changes.push(StepChange::Location(change));
                }
            }
            StepIntent::Draw(event) => {
                if let Some(change) = self.location.edit_attachments(|record| apply_draw(record, event))? {
                    out.changes.push(StepChange::Location(change));
                }
            }
        }
        for change in &out.changes {
            self.dirty[change.step().number() - 1] = true;
        }
        Ok(out)
    }

    /// Starts (or restarts) the province list.
    pub fn load_regions(&mut self) -> LookupTicket {
        self.regions.load_root()
    }

    pub fn apply_lookup(&mut self, response: LookupResponse) -> LookupApplied {
        self.regions.apply_response(response)
    }

    pub(crate) fn set_current(&mut self, step: StepId) {
        self.current = step;
    }

    pub(crate) fn mark_saved(&mut self) {
        self.dirty = [false; 3];
    }

    fn select_region(
        &mut self,
        level: RegionLevel,
        option: Option<LookupOption>,
        out: &mut Dispatched,
    ) {
        let selection = self.regions.apply_user_selection(level, option);
        out.lookups.extend(selection.lookup);
        if let Some(change) = self.general.update_fields(selection.edits) {
            self.after_general(change, out);
        }
    }

    fn after_general(&mut self, change: RecordChange<GeneralInfo>, out: &mut Dispatched) {
        let total = change.record.total_members;
        let total_moved = change.touched(GeneralField::TotalMembers);
        out.changes.push(StepChange::General(change));
        if total_moved
            && let Some(mirrored) = self
                .technical
                .sync_inbound(TechnicalField::HouseholdMembers, total.map(FieldValue::from))
        {
            out.changes.push(StepChange::Technical(mirrored));
        }
    }

    fn known_option(&self, level: RegionLevel, id: &str) -> LookupOption {
        self.regions
            .level(level)
            .options()
            .iter()
            .find(|option| option.value == id)
            .cloned()
            .unwrap_or_else(|| {
                debug!(%level, id, "selected id is not in the loaded options");
                LookupOption::new(id, id)
            })
    }
}

fn region_level_for(field: GeneralField) -> Option<RegionLevel> {
    RegionLevel::ALL
        .into_iter()
        .find(|level| level.id_field() == field)
}

/// Applies a draw event; a drawn or moved point also becomes the household
/// coordinate.
fn apply_draw(record: &mut MapLocation, event: DrawEvent) -> Result<bool, GeometryError> {
    let marker = match &event {
        DrawEvent::Created { geometry, .. } | DrawEvent::Edited { geometry, .. }
            if geometry.geometry_type() == GeometryType::Point =>
        {
            match geometry.to_map_shape() {
                MapShape::Marker(point) => Some(point),
                _ => None,
            }
        }
        _ => None,
    };
    let changed = record.layers.apply(event)?;
    if changed && let Some(point) = marker {
        record.latitude = Some(point.lat);
        record.longitude = Some(point.lng);
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Geometry;

    fn jakarta() -> LookupOption {
        LookupOption::new("31", "DKI Jakarta")
    }

    #[test]
    fn selecting_province_updates_record_and_requests_children() {
        let mut state = WizardState::new();
        let out = state
            .dispatch(StepIntent::SelectRegion {
                level: RegionLevel::Province,
                option: Some(jakarta()),
            })
            .unwrap();
        assert_eq!(out.changes.len(), 1);
        assert_eq!(out.lookups.len(), 1);
        assert_eq!(state.general().province_name.as_deref(), Some("DKI Jakarta"));
        assert!(state.is_dirty(StepId::General));
        assert!(!state.is_dirty(StepId::Technical));
    }

    #[test]
    fn reselecting_a_province_with_a_new_label_renames_it() {
        let mut state = WizardState::new();
        let select = |label: &str| StepIntent::SelectRegion {
            level: RegionLevel::Province,
            option: Some(LookupOption::new("31", label)),
        };
        state.dispatch(select("DKI Jakarta")).unwrap();
        state
            .dispatch(StepIntent::SelectRegion {
                level: RegionLevel::Regency,
                option: Some(LookupOption::new("3171", "Jakarta Selatan")),
            })
            .unwrap();

        let out = state.dispatch(select("Jakarta Raya")).unwrap();
        assert_eq!(out.changes[0].changed_names(), vec!["provinceName"]);
        assert!(out.lookups.is_empty());
        assert_eq!(state.general().province_name.as_deref(), Some("Jakarta Raya"));
        assert_eq!(state.general().regency_id.as_deref(), Some("3171"));

        assert!(state.dispatch(select("Jakarta Raya")).unwrap().changes.is_empty());
    }

    #[test]
    fn member_totals_mirror_into_technical_step() {
        let mut state = WizardState::new();
        state
            .dispatch(StepIntent::Technical(FieldEdit::set(TechnicalField::BuildingLength, 8.0)))
            .unwrap();
        state
            .dispatch(StepIntent::Technical(FieldEdit::set(TechnicalField::BuildingWidth, 6.0)))
            .unwrap();
        state
            .dispatch(StepIntent::Technical(FieldEdit::set(TechnicalField::FloorCount, 2u32)))
            .unwrap();
        let out = state
            .dispatch(StepIntent::General(FieldEdit::set(GeneralField::MaleMembers, 4u32)))
            .unwrap();
        assert_eq!(out.changes.len(), 2);
        assert_eq!(state.general().total_members, Some(4));
        assert_eq!(state.technical().household_members, Some(4));
        assert_eq!(state.technical().area_per_person, Some(24.0));
    }

    #[test]
    fn general_edit_on_region_id_goes_through_the_chain() {
        let mut state = WizardState::new();
        let out = state
            .dispatch(StepIntent::General(FieldEdit::set(GeneralField::ProvinceId, "32")))
            .unwrap();
        assert_eq!(out.lookups[0].level, RegionLevel::Regency);
        assert_eq!(state.regions().level(RegionLevel::Province).selected(), Some("32"));
    }

    #[test]
    fn region_id_of_the_wrong_kind_keeps_the_chain() {
        let payload = HouseholdPayload {
            general: GeneralInfo {
                province_id: Some("31".into()),
                regency_id: Some("3171".into()),
                ..GeneralInfo::default()
            },
            ..HouseholdPayload::default()
        };
        let (mut state, _) = WizardState::from_payload(payload);
        let out = state
            .dispatch(StepIntent::General(FieldEdit {
                field: GeneralField::ProvinceId,
                value: Some(FieldValue::Integer(32)),
            }))
            .unwrap();
        assert!(out.changes.is_empty());
        assert!(out.lookups.is_empty());
        assert_eq!(state.general().province_id.as_deref(), Some("31"));
        assert_eq!(state.general().regency_id.as_deref(), Some("3171"));
        assert!(!state.has_unsaved_changes());

        let out = state
            .dispatch(StepIntent::General(FieldEdit {
                field: GeneralField::ProvinceId,
                value: None,
            }))
            .unwrap();
        assert_eq!(out.changes.len(), 1);
        assert_eq!(state.general().regency_id, None);
    }

    #[test]
    fn seeding_marks_clean_and_preloads() {
        let payload = HouseholdPayload {
            general: GeneralInfo {
                province_id: Some("31".into()),
                male_members: Some(2),
                female_members: Some(2),
                ..GeneralInfo::default()
            },
            ..HouseholdPayload::default()
        };
        let (state, tickets) = WizardState::from_payload(payload);
        assert!(!state.has_unsaved_changes());
        assert_eq!(tickets.len(), 2);
        assert_eq!(state.general().total_members, Some(4));
        assert_eq!(state.technical().household_members, Some(4));
    }

    #[test]
    fn drawing_a_point_sets_coordinates() {
        let mut state = WizardState::new();
        let out = state
            .dispatch(StepIntent::Draw(DrawEvent::Created {
                layer_id: "marker".into(),
                geometry: Geometry::Point([106.8, -6.2]),
            }))
            .unwrap();
        assert_eq!(out.changes[0].step(), StepId::Location);
        assert_eq!(out.changes[0].changed_names(), vec!["latitude", "longitude"]);
        assert_eq!(state.location().latitude, Some(-6.2));
        assert_eq!(state.location().longitude, Some(106.8));

        let err = state
            .dispatch(StepIntent::Draw(DrawEvent::Created {
                layer_id: "bad".into(),
                geometry: Geometry::LineString(vec![[106.8, -6.2]]),
            }))
            .unwrap_err();
        assert_eq!(err, GeometryError::ShortLine(1));
        assert_eq!(state.location().layers.len(), 1);
    }
}
