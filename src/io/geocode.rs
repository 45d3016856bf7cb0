//! Best-effort placement of the map on the household's region.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{DrawEvent, GeneralInfo, Geometry, LatLng, MapLocation};
use crate::form::StepIntent;

use super::{ApiError, GeocoderConfig, MapDefaults};

const REGENCY_PREFIXES: [&str; 3] = ["kabupaten ", "kab. ", "kota "];

/// Structured place search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceQuery {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
}

impl PlaceQuery {
    /// Builds a query from the selected regency (city) and province (state).
    /// `None` when neither is known.
    pub fn from_general(general: &GeneralInfo, country: impl Into<String>) -> Option<Self> {
        let city = general
            .regency_name
            .as_deref()
            .map(strip_regency_prefix)
            .filter(|name| !name.is_empty());
        let state = general
            .province_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        if city.is_none() && state.is_none() {
            return None;
        }
        Some(Self {
            city,
            state,
            country: country.into(),
        })
    }

    fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::with_capacity(5);
        if let Some(city) = self.city.as_deref() {
            params.push(("city", city));
        }
        if let Some(state) = self.state.as_deref() {
            params.push(("state", state));
        }
        params.push(("country", self.country.as_str()));
        params.push(("format", "json"));
        params.push(("limit", "1"));
        params
    }
}

fn strip_regency_prefix(name: &str) -> String {
    let trimmed = name.trim();
    for prefix in REGENCY_PREFIXES {
        if let Some(head) = trimmed.get(..prefix.len())
            && head.eq_ignore_ascii_case(prefix)
        {
            return trimmed[prefix.len()..].trim().to_string();
        }
    }
    trimmed.to_string()
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` means the service answered but found nothing.
    async fn locate(&self, query: &PlaceQuery) -> Result<Option<LatLng>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl SearchHit {
    fn position(&self) -> Option<LatLng> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lng = self.lon.trim().parse::<f64>().ok()?;
        let valid = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng);
        valid.then_some(LatLng::new(lat, lng))
    }
}

/// Geocoder speaking the Nominatim search API.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: Client,
    config: GeocoderConfig,
}

impl NominatimGeocoder {
    pub fn new(config: GeocoderConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("surveyform/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeocoderConfig {
        &self.config
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn locate(&self, query: &PlaceQuery) -> Result<Option<LatLng>, ApiError> {
        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&query.params())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: None,
            });
        }
        let hits: Vec<SearchHit> = response.json().await?;
        Ok(hits.first().and_then(SearchHit::position))
    }
}

/// Where the map should open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
    /// `false` when the defaults were used.
    pub located: bool,
}

impl MapView {
    pub fn fallback(defaults: &MapDefaults) -> Self {
        Self {
            center: defaults.center,
            zoom: defaults.zoom,
            located: false,
        }
    }
}

/// Layer id of the marker placed from a geocoded center.
pub const GEOCODED_MARKER_LAYER: &str = "geocoded";

impl MapView {
    /// A draw intent that drops a marker on the geocoded center, for records
    /// that have no coordinates or shapes yet. `None` for fallback views.
    pub fn initial_marker(&self, location: &MapLocation) -> Option<StepIntent> {
        let unplaced = location.latitude.is_none()
            && location.longitude.is_none()
            && location.layers.is_empty();
        (self.located && unplaced).then(|| {
            StepIntent::Draw(DrawEvent::Created {
                layer_id: GEOCODED_MARKER_LAYER.to_string(),
                geometry: Geometry::Point([self.center.lng, self.center.lat]),
            })
        })
    }
}

/// Resolves the initial map view. Never fails: a missing query, an empty
/// result or a service error all fall back to `defaults`.
pub async fn resolve_map_center(
    geocoder: &dyn Geocoder,
    query: Option<&PlaceQuery>,
    defaults: &MapDefaults,
) -> MapView {
    let Some(query) = query else {
        return MapView::fallback(defaults);
    };
    match geocoder.locate(query).await {
        Ok(Some(center)) => {
            debug!(lat = center.lat, lng = center.lng, "geocoded map center");
            MapView {
                center,
                zoom: defaults.located_zoom,
                located: true,
            }
        }
        Ok(None) => {
            debug!(?query, "geocoder found no match");
            MapView::fallback(defaults)
        }
        Err(err) => {
            warn!(error = %err, "geocoding failed, using default map center");
            MapView::fallback(defaults)
        }
    }
}
