mod client;
mod config;
mod error;
mod format;
mod geocode;
mod input;
mod lookup;
mod output;
mod store;

pub use client::{
    ApiClient, ApiResponse, CSRF_HEADER, ListQuery, METHOD_OVERRIDE_HEADER, Page, PageMeta,
    PhotoUpload,
};
pub use config::{ClientConfig, GeocoderConfig, MapDefaults};
pub use error::{ApiError, classify_failure};
pub use format::DocumentFormat;
pub use geocode::{
    GEOCODED_MARKER_LAYER, Geocoder, MapView, NominatimGeocoder, PlaceQuery, resolve_map_center,
};
pub use input::{
    HouseholdDocument, household_from_value, parse_document_any, parse_document_str,
    parse_household_str,
};
pub use lookup::{LookupDispatcher, resolve};
pub use output::{OutputDestination, OutputOptions, Rendering, emit_text, serialize_document};
pub use store::{HouseholdStore, RegionSource, SaveReceipt};
