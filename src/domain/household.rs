use std::fmt;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    ComputedField, FieldSlot, FieldValue, FormRecord, MapLayers, derive,
    record::record_fields,
};

/// The wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    General,
    Technical,
    Location,
}

impl StepId {
    pub const ALL: [StepId; 3] = [StepId::General, StepId::Technical, StepId::Location];

    /// 1-based position.
    pub fn number(self) -> usize {
        match self {
            StepId::General => 1,
            StepId::Technical => 2,
            StepId::Location => 3,
        }
    }

    pub fn from_number(number: usize) -> Option<Self> {
        Self::ALL.get(number.checked_sub(1)?).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            StepId::General => "general",
            StepId::Technical => "technical",
            StepId::Location => "location",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.name() == name)
    }

    pub fn title(self) -> &'static str {
        match self {
            StepId::General => "General Information",
            StepId::Technical => "Technical Data",
            StepId::Location => "Map Location",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Step 1: identity, administrative location, and household composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralInfo {
    #[schemars(length(max = 255))]
    pub head_name: Option<String>,
    pub nik: Option<String>,
    pub family_card_number: Option<String>,
    #[schemars(length(max = 500))]
    pub address: Option<String>,
    #[schemars(regex(pattern = r"^\d{1,3}$"))]
    pub rt: Option<String>,
    #[schemars(regex(pattern = r"^\d{1,3}$"))]
    pub rw: Option<String>,
    pub province_id: Option<String>,
    pub province_name: Option<String>,
    pub regency_id: Option<String>,
    pub regency_name: Option<String>,
    pub district_id: Option<String>,
    pub district_name: Option<String>,
    pub village_id: Option<String>,
    pub village_name: Option<String>,
    #[schemars(range(max = 99))]
    pub male_members: Option<u32>,
    #[schemars(range(max = 99))]
    pub female_members: Option<u32>,
    #[schemars(range(max = 99))]
    pub disabled_members: Option<u32>,
    pub total_members: Option<u32>,
    pub survey_date: Option<NaiveDate>,
    pub owns_land: Option<bool>,
}

record_fields! {
    pub enum GeneralField for GeneralInfo {
        HeadName => head_name: String, "headName", "Head of household";
        Nik => nik: String, "nik", "NIK";
        FamilyCardNumber => family_card_number: String, "familyCardNumber", "Family card number";
        Address => address: String, "address", "Address";
        Rt => rt: String, "rt", "RT";
        Rw => rw: String, "rw", "RW";
        ProvinceId => province_id: String, "provinceId", "Province";
        ProvinceName => province_name: String, "provinceName", "Province name";
        RegencyId => regency_id: String, "regencyId", "Regency";
        RegencyName => regency_name: String, "regencyName", "Regency name";
        DistrictId => district_id: String, "districtId", "District";
        DistrictName => district_name: String, "districtName", "District name";
        VillageId => village_id: String, "villageId", "Village";
        VillageName => village_name: String, "villageName", "Village name";
        MaleMembers => male_members: u32, "maleMembers", "Male members";
        FemaleMembers => female_members: u32, "femaleMembers", "Female members";
        DisabledMembers => disabled_members: u32, "disabledMembers", "Members with disabilities";
        TotalMembers => total_members: u32, "totalMembers", "Total members";
        SurveyDate => survey_date: NaiveDate, "surveyDate", "Survey date";
        OwnsLand => owns_land: bool, "ownsLand", "Owns the land";
    }
}

fn derive_total_members(record: &GeneralInfo) -> Option<FieldValue> {
    let total = derive::total_members(
        record.male_members,
        record.female_members,
        record.disabled_members,
    );
    Some(total.to_field_value())
}

static GENERAL_COMPUTED: [ComputedField<GeneralInfo>; 1] = [ComputedField {
    target: GeneralField::TotalMembers,
    sources: &[
        GeneralField::MaleMembers,
        GeneralField::FemaleMembers,
        GeneralField::DisabledMembers,
    ],
    derive: derive_total_members,
}];

impl FormRecord for GeneralInfo {
    type Field = GeneralField;

    const STEP: StepId = StepId::General;

    fn get(&self, field: GeneralField) -> Option<FieldValue> {
        self.read_field(field)
    }

    fn set(&mut self, field: GeneralField, value: Option<&FieldValue>) {
        self.write_field(field, value)
    }

    fn dependents(field: GeneralField) -> &'static [GeneralField] {
        match field {
            GeneralField::ProvinceId => &[GeneralField::RegencyId, GeneralField::RegencyName],
            GeneralField::RegencyId => &[GeneralField::DistrictId, GeneralField::DistrictName],
            GeneralField::DistrictId => &[GeneralField::VillageId, GeneralField::VillageName],
            _ => &[],
        }
    }

    fn computed() -> &'static [ComputedField<Self>] {
        &GENERAL_COMPUTED
    }
}

/// Step 2: building measurements and sanitation facilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TechnicalData {
    pub building_length: Option<f64>,
    pub building_width: Option<f64>,
    pub floor_count: Option<u32>,
    pub building_area: Option<f64>,
    pub household_members: Option<u32>,
    pub area_per_person: Option<f64>,
    pub roof_material: Option<String>,
    pub wall_material: Option<String>,
    pub floor_material: Option<String>,
    pub water_source: Option<String>,
    pub sanitation: Option<String>,
    pub electricity_source: Option<String>,
    pub has_toilet: Option<bool>,
}

record_fields! {
    pub enum TechnicalField for TechnicalData {
        BuildingLength => building_length: f64, "buildingLength", "Building length (m)";
        BuildingWidth => building_width: f64, "buildingWidth", "Building width (m)";
        FloorCount => floor_count: u32, "floorCount", "Floors";
        BuildingArea => building_area: f64, "buildingArea", "Building area (m²)";
        HouseholdMembers => household_members: u32, "householdMembers", "Household members";
        AreaPerPerson => area_per_person: f64, "areaPerPerson", "Area per person (m²)";
        RoofMaterial => roof_material: String, "roofMaterial", "Roof material";
        WallMaterial => wall_material: String, "wallMaterial", "Wall material";
        FloorMaterial => floor_material: String, "floorMaterial", "Floor material";
        WaterSource => water_source: String, "waterSource", "Drinking water source";
        Sanitation => sanitation: String, "sanitation", "Sanitation";
        ElectricitySource => electricity_source: String, "electricitySource", "Electricity source";
        HasToilet => has_toilet: bool, "hasToilet", "Private toilet";
    }
}

fn derive_building_area(record: &TechnicalData) -> Option<FieldValue> {
    derive::building_area(
        record.building_length,
        record.building_width,
        record.floor_count,
    )
    .map(|area| area.to_field_value())
}

fn derive_area_per_person(record: &TechnicalData) -> Option<FieldValue> {
    derive::area_per_person(record.building_area, record.household_members)
        .map(|ratio| ratio.to_field_value())
}

static TECHNICAL_COMPUTED: [ComputedField<TechnicalData>; 2] = [
    ComputedField {
        target: TechnicalField::BuildingArea,
        sources: &[
            TechnicalField::BuildingLength,
            TechnicalField::BuildingWidth,
            TechnicalField::FloorCount,
        ],
        derive: derive_building_area,
    },
    ComputedField {
        target: TechnicalField::AreaPerPerson,
        sources: &[TechnicalField::BuildingArea, TechnicalField::HouseholdMembers],
        derive: derive_area_per_person,
    },
];

impl FormRecord for TechnicalData {
    type Field = TechnicalField;

    const STEP: StepId = StepId::Technical;

    fn get(&self, field: TechnicalField) -> Option<FieldValue> {
        self.read_field(field)
    }

    fn set(&mut self, field: TechnicalField, value: Option<&FieldValue>) {
        self.write_field(field, value)
    }

    fn computed() -> &'static [ComputedField<Self>] {
        &TECHNICAL_COMPUTED
    }

    fn inbound() -> &'static [TechnicalField] {
        &[TechnicalField::HouseholdMembers]
    }
}

/// Step 3: marker position plus any shapes drawn on the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_note: Option<String>,
    pub layers: MapLayers,
}

record_fields! {
    pub enum LocationField for MapLocation {
        Latitude => latitude: f64, "latitude", "Latitude";
        Longitude => longitude: f64, "longitude", "Longitude";
        LocationNote => location_note: String, "locationNote", "Location note";
    }
}

impl FormRecord for MapLocation {
    type Field = LocationField;

    const STEP: StepId = StepId::Location;

    fn get(&self, field: LocationField) -> Option<FieldValue> {
        self.read_field(field)
    }

    fn set(&mut self, field: LocationField, value: Option<&FieldValue>) {
        self.write_field(field, value)
    }
}

/// Everything the wizard persists in one write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HouseholdPayload {
    pub general: GeneralInfo,
    pub technical: TechnicalData,
    pub location: MapLocation,
}

/// Review state of a submitted household.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

/// A household as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    pub id: String,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(flatten)]
    pub payload: HouseholdPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldId, FieldKind};

    #[test]
    fn field_names_match_serialized_keys() {
        let json = serde_json::to_value(GeneralInfo::default()).unwrap();
        let keys = json.as_object().unwrap();
        for field in GeneralField::all() {
            assert!(keys.contains_key(field.name()), "missing {}", field.name());
        }
        let json = serde_json::to_value(TechnicalData::default()).unwrap();
        for field in TechnicalField::all() {
            assert!(json.get(field.name()).is_some(), "missing {}", field.name());
        }
    }

    #[test]
    fn field_kinds_follow_member_types() {
        assert_eq!(GeneralField::MaleMembers.kind(), FieldKind::Count);
        assert_eq!(GeneralField::SurveyDate.kind(), FieldKind::Date);
        assert_eq!(TechnicalField::BuildingLength.kind(), FieldKind::Decimal);
        assert_eq!(GeneralField::from_name("villageName"), Some(GeneralField::VillageName));
        assert_eq!(GeneralField::from_name("unknown"), None);
    }

    #[test]
    fn computed_and_inbound_fields_are_not_user_editable() {
        assert!(!GeneralInfo::is_user_editable(GeneralField::TotalMembers));
        assert!(!TechnicalData::is_user_editable(TechnicalField::HouseholdMembers));
        assert!(!TechnicalData::is_user_editable(TechnicalField::AreaPerPerson));
        assert!(GeneralInfo::is_user_editable(GeneralField::ProvinceId));
    }

    #[test]
    fn steps_round_trip_through_numbers() {
        assert_eq!(StepId::from_number(1), Some(StepId::General));
        assert_eq!(StepId::from_number(3), Some(StepId::Location));
        assert_eq!(StepId::from_number(0), None);
        assert_eq!(StepId::from_number(4), None);
    }

    #[test]
    fn household_flattens_step_payloads() {
        let raw = serde_json::json!({
            "id": "42",
            "status": "submitted",
            "general": {"headName": "Siti", "provinceId": "31"},
            "technical": {"floorCount": 2}
        });
        let household: Household = serde_json::from_value(raw).unwrap();
        assert_eq!(household.status, SubmissionStatus::Submitted);
        assert_eq!(household.payload.general.head_name.as_deref(), Some("Siti"));
        assert_eq!(household.payload.technical.floor_count, Some(2));
        assert!(household.payload.location.layers.is_empty());
    }
}
