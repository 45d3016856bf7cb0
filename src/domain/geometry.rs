//! GeoJSON-like geometry exchanged with the map widget.
//!
//! Positions on the wire are `[longitude, latitude]`; the rendering side wants
//! `(latitude, longitude)`, so conversion happens here and nowhere else.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// `[longitude, latitude]`.
pub type Position = [f64; 2];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    Polygon(Vec<Vec<Position>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("unsupported or malformed geometry: {0}")]
    Malformed(String),
    #[error("coordinate [{lng}, {lat}] is out of range")]
    OutOfRange { lng: f64, lat: f64 },
    #[error("a line needs at least 2 positions, got {0}")]
    ShortLine(usize),
    #[error("polygon ring {ring} needs at least 4 positions, got {len}")]
    ShortRing { ring: usize, len: usize },
    #[error("polygon ring {0} is not closed")]
    OpenRing(usize),
    #[error("polygon has no rings")]
    EmptyPolygon,
}

/// A position in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    fn from_position(position: &Position) -> Self {
        Self {
            lat: position[1],
            lng: position[0],
        }
    }

    pub fn to_position(self) -> Position {
        [self.lng, self.lat]
    }
}

/// Geometry converted for the map widget.
#[derive(Debug, Clone, PartialEq)]
pub enum MapShape {
    Marker(LatLng),
    Polyline(Vec<LatLng>),
    Polygon(Vec<Vec<LatLng>>),
}

impl Geometry {
    /// Parses and validates a `{type, coordinates}` object.
    pub fn from_json(value: &Value) -> Result<Self, GeometryError> {
        let geometry: Geometry = serde_json::from_value(value.clone())
            .map_err(|err| GeometryError::Malformed(err.to_string()))?;
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::LineString(_) => GeometryType::LineString,
            Geometry::Polygon(_) => GeometryType::Polygon,
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        match self {
            Geometry::Point(position) => check_position(position),
            Geometry::LineString(line) => {
                if line.len() < 2 {
                    return Err(GeometryError::ShortLine(line.len()));
                }
                line.iter().try_for_each(check_position)
            }
            Geometry::Polygon(rings) => {
                if rings.is_empty() {
                    return Err(GeometryError::EmptyPolygon);
                }
                for (idx, ring) in rings.iter().enumerate() {
                    if ring.len() < 4 {
                        return Err(GeometryError::ShortRing {
                            ring: idx,
                            len: ring.len(),
                        });
                    }
                    if ring.first() != ring.last() {
                        return Err(GeometryError::OpenRing(idx));
                    }
                    ring.iter().try_for_each(check_position)?;
                }
                Ok(())
            }
        }
    }

    pub fn to_map_shape(&self) -> MapShape {
        match self {
            Geometry::Point(position) => MapShape::Marker(LatLng::from_position(position)),
            Geometry::LineString(line) => {
                MapShape::Polyline(line.iter().map(LatLng::from_position).collect())
            }
            Geometry::Polygon(rings) => MapShape::Polygon(
                rings
                    .iter()
                    .map(|ring| ring.iter().map(LatLng::from_position).collect())
                    .collect(),
            ),
        }
    }

    /// Builds a polygon from widget vertices, closing the ring if the widget
    /// left it open.
    pub fn polygon_from_vertices(vertices: &[LatLng]) -> Result<Self, GeometryError> {
        let mut ring: Vec<Position> = vertices.iter().map(|point| point.to_position()).collect();
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied())
            && first != last
        {
            ring.push(first);
        }
        let polygon = Geometry::Polygon(vec![ring]);
        polygon.validate()?;
        Ok(polygon)
    }

    /// Arithmetic mean of the distinct positions; good enough to drop a
    /// label or marker on small parcels.
    pub fn centroid(&self) -> LatLng {
        let positions: Vec<&Position> = match self {
            Geometry::Point(position) => vec![position],
            Geometry::LineString(line) => line.iter().collect(),
            Geometry::Polygon(rings) => rings
                .first()
                .map(|ring| {
                    let take = ring.len().saturating_sub(1).max(1);
                    ring.iter().take(take).collect()
                })
                .unwrap_or_default(),
        };
        if positions.is_empty() {
            return LatLng::new(0.0, 0.0);
        }
        let count = positions.len() as f64;
        let (lng, lat) = positions
            .iter()
            .fold((0.0, 0.0), |(lng, lat), pos| (lng + pos[0], lat + pos[1]));
        LatLng::new(lat / count, lng / count)
    }
}

fn check_position(position: &Position) -> Result<(), GeometryError> {
    let [lng, lat] = *position;
    let valid = lng.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lng)
        && (-90.0..=90.0).contains(&lat);
    if valid {
        Ok(())
    } else {
        Err(GeometryError::OutOfRange { lng, lat })
    }
}

/// Draw-toolbar callbacks from the map widget.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    Created { layer_id: String, geometry: Geometry },
    Edited { layer_id: String, geometry: Geometry },
    Deleted { layer_id: String },
}

impl DrawEvent {
    pub fn layer_id(&self) -> &str {
        match self {
            DrawEvent::Created { layer_id, .. }
            | DrawEvent::Edited { layer_id, .. }
            | DrawEvent::Deleted { layer_id } => layer_id,
        }
    }
}

/// Shapes drawn on the location step, keyed by widget layer id in draw order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapLayers {
    features: IndexMap<String, Geometry>,
}

impl MapLayers {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn get(&self, layer_id: &str) -> Option<&Geometry> {
        self.features.get(layer_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Geometry)> {
        self.features
            .iter()
            .map(|(id, geometry)| (id.as_str(), geometry))
    }

    /// Applies one widget event. Returns whether the layer set changed.
    pub fn apply(&mut self, event: DrawEvent) -> Result<bool, GeometryError> {
        match event {
            DrawEvent::Created { layer_id, geometry } | DrawEvent::Edited { layer_id, geometry } => {
                geometry.validate()?;
                if self.features.get(&layer_id) == Some(&geometry) {
                    return Ok(false);
                }
                self.features.insert(layer_id, geometry);
                Ok(true)
            }
            DrawEvent::Deleted { layer_id } => Ok(self.features.shift_remove(&layer_id).is_some()),
        }
    }

    /// The most recently drawn point, if any.
    pub fn last_marker(&self) -> Option<LatLng> {
        self.features
            .values()
            .rev()
            .find_map(|geometry| match geometry.to_map_shape() {
                MapShape::Marker(point) => Some(point),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn point_converts_lng_lat_to_lat_lng() {
        let geometry = Geometry::from_json(&json!({"type": "Point", "coordinates": [106.8, -6.2]}))
            .unwrap();
        assert_eq!(geometry.geometry_type(), GeometryType::Point);
        assert_eq!(geometry.to_map_shape(), MapShape::Marker(LatLng::new(-6.2, 106.8)));
    }

    #[test]
    fn rejects_open_polygon_rings() {
        let raw = json!({
            "type": "Polygon",
            "coordinates": [[[106.0, -6.0], [106.1, -6.0], [106.1, -6.1], [106.0, -6.1]]]
        });
        assert_eq!(Geometry::from_json(&raw), Err(GeometryError::OpenRing(0)));
    }

    #[test]
    fn rejects_out_of_range_and_unknown_types() {
        let raw = json!({"type": "Point", "coordinates": [200.0, 0.0]});
        assert!(matches!(
            Geometry::from_json(&raw),
            Err(GeometryError::OutOfRange { .. })
        ));
        let raw = json!({"type": "Circle", "coordinates": [0.0, 0.0]});
        assert!(matches!(
            Geometry::from_json(&raw),
            Err(GeometryError::Malformed(_))
        ));
    }

    #[test]
    fn polygon_from_vertices_closes_ring() {
        let vertices = [
            LatLng::new(-6.0, 106.0),
            LatLng::new(-6.0, 106.1),
            LatLng::new(-6.1, 106.1),
        ];
        let polygon = Geometry::polygon_from_vertices(&vertices).unwrap();
        let Geometry::Polygon(rings) = &polygon else {
            panic!("expected polygon");
        };
        assert_eq!(rings[0].len(), 4);
        assert_eq!(rings[0].first(), rings[0].last());
        let centroid = polygon.centroid();
        assert!((centroid.lat - (-6.0333)).abs() < 1e-3);
    }

    #[test]
    fn geometry_serializes_as_geojson() {
        let line = Geometry::LineString(vec![[106.0, -6.0], [106.5, -6.5]]);
        assert_eq!(
            serde_json::to_value(&line).unwrap(),
            json!({"type": "LineString", "coordinates": [[106.0, -6.0], [106.5, -6.5]]})
        );
    }

    #[test]
    fn layers_follow_create_edit_delete() {
        let mut layers = MapLayers::default();
        let point = Geometry::Point([106.8, -6.2]);
        assert!(
            layers
                .apply(DrawEvent::Created {
                    layer_id: "m1".into(),
                    geometry: point.clone(),
                })
                .unwrap()
        );
        assert!(
            !layers
                .apply(DrawEvent::Edited {
                    layer_id: "m1".into(),
                    geometry: point,
                })
                .unwrap(),
            "identical edit is not a change"
        );
        assert_eq!(layers.last_marker(), Some(LatLng::new(-6.2, 106.8)));
        assert!(layers.apply(DrawEvent::Deleted { layer_id: "m1".into() }).unwrap());
        assert!(layers.is_empty());
        assert!(!layers.apply(DrawEvent::Deleted { layer_id: "m1".into() }).unwrap());
    }
}
