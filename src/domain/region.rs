use std::fmt;

use serde::{Deserialize, Serialize};

use super::GeneralField;

static LEVELS: [RegionLevel; 4] = RegionLevel::ALL;

/// Administrative levels, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionLevel {
    Province,
    Regency,
    District,
    Village,
}

impl RegionLevel {
    pub const ALL: [RegionLevel; 4] = [
        RegionLevel::Province,
        RegionLevel::Regency,
        RegionLevel::District,
        RegionLevel::Village,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn parent(self) -> Option<RegionLevel> {
        self.index().checked_sub(1).map(|idx| Self::ALL[idx])
    }

    pub fn child(self) -> Option<RegionLevel> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Levels strictly below `self`.
    pub fn descendants(self) -> &'static [RegionLevel] {
        &LEVELS[self.index() + 1..]
    }

    pub fn id_field(self) -> GeneralField {
        match self {
            RegionLevel::Province => GeneralField::ProvinceId,
            RegionLevel::Regency => GeneralField::RegencyId,
            RegionLevel::District => GeneralField::DistrictId,
            RegionLevel::Village => GeneralField::VillageId,
        }
    }

    pub fn name_field(self) -> GeneralField {
        match self {
            RegionLevel::Province => GeneralField::ProvinceName,
            RegionLevel::Regency => GeneralField::RegencyName,
            RegionLevel::District => GeneralField::DistrictName,
            RegionLevel::Village => GeneralField::VillageName,
        }
    }

    /// Path segment used by the reference-data endpoints.
    pub fn slug(self) -> &'static str {
        match self {
            RegionLevel::Province => "provinces",
            RegionLevel::Regency => "regencies",
            RegionLevel::District => "districts",
            RegionLevel::Village => "villages",
        }
    }
}

impl fmt::Display for RegionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RegionLevel::Province => "province",
            RegionLevel::Regency => "regency",
            RegionLevel::District => "district",
            RegionLevel::Village => "village",
        };
        f.write_str(label)
    }
}

/// One entry of a selector's option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOption {
    pub value: String,
    pub label: String,
}

impl LookupOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}
