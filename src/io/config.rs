use std::time::Duration;

use crate::domain::LatLng;

/// Connection settings for [`ApiClient`](super::ApiClient).
///
/// The CSRF token is handed in here rather than read from the page, so the
/// client can be built anywhere.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub csrf_token: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
    /// Send updates as `POST` + `X-HTTP-Method-Override: PUT`.
    pub spoof_methods: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_spoofed_methods(mut self, enabled: bool) -> Self {
        self.spoof_methods = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            csrf_token: None,
            timeout: Duration::from_secs(30),
            user_agent: concat!("surveyform/", env!("CARGO_PKG_VERSION")).to_string(),
            spoof_methods: false,
        }
    }
}

/// Where the map opens when geocoding has nothing better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapDefaults {
    pub center: LatLng,
    pub zoom: u8,
    /// Zoom used once a geocoded center is known.
    pub located_zoom: u8,
}

impl Default for MapDefaults {
    fn default() -> Self {
        Self {
            center: LatLng::new(-2.548926, 118.0148634),
            zoom: 5,
            located_zoom: 13,
        }
    }
}

impl MapDefaults {
    pub fn with_center(mut self, center: LatLng) -> Self {
        self.center = center;
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }
}

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub country: String,
    pub timeout: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            country: "Indonesia".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl GeocoderConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }
}
