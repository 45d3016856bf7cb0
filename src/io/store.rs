use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Household, HouseholdPayload, LookupOption, RegionLevel};

use super::ApiError;

/// Body of a successful mutation: `{ message, ...payload }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveReceipt {
    #[serde(default)]
    pub message: String,
}

/// Persistence seam used by the wizard.
#[async_trait]
pub trait HouseholdStore: Send + Sync {
    async fn load_household(&self, id: &str) -> Result<Household, ApiError>;

    async fn save_household(
        &self,
        id: &str,
        payload: &HouseholdPayload,
    ) -> Result<SaveReceipt, ApiError>;
}

/// Reference data for the region selectors.
#[async_trait]
pub trait RegionSource: Send + Sync {
    /// `parent_id` is `None` only for provinces.
    async fn fetch_regions(
        &self,
        level: RegionLevel,
        parent_id: Option<&str>,
    ) -> Result<Vec<LookupOption>, ApiError>;
}
