use std::fmt::Write as _;

use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

use crate::domain::{FieldId, FormRecord, GeometryType, HouseholdPayload, MapLocation};

const EMPTY_VALUE: &str = "-";
const COMPUTED_MARK: &str = " *";
const MIN_VALUE_WIDTH: usize = 12;

/// Renders one step as a label/value table, values wrapped to fit `width`
/// columns. Computed and mirrored fields carry a trailing `*`.
pub fn render_step<R: FormRecord>(record: &R, width: usize) -> String {
    let fields = R::Field::all();
    let labels: Vec<String> = fields
        .iter()
        .map(|field| {
            let mut label = field.label().to_string();
            if !R::is_user_editable(*field) {
                label.push_str(COMPUTED_MARK);
            }
            label
        })
        .collect();
    let label_width = labels
        .iter()
        .map(|label| UnicodeWidthStr::width(label.as_str()))
        .max()
        .unwrap_or(0);
    let value_width = width
        .saturating_sub(label_width + 3)
        .max(MIN_VALUE_WIDTH);

    let mut out = String::new();
    let title = R::STEP.title();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(UnicodeWidthStr::width(title)));
    for (field, label) in fields.iter().zip(&labels) {
        let value = record
            .get(*field)
            .map(|value| value.display())
            .unwrap_or_else(|| EMPTY_VALUE.to_string());
        let mut lines = wrap(&value, value_width).into_iter();
        let first = lines.next().map(|line| line.into_owned()).unwrap_or_default();
        let pad = label_width - UnicodeWidthStr::width(label.as_str());
        let _ = writeln!(out, "{label}{} : {first}", " ".repeat(pad));
        for line in lines {
            let _ = writeln!(out, "{}   {line}", " ".repeat(label_width));
        }
    }
    out
}

fn render_layers(location: &MapLocation) -> String {
    if location.layers.is_empty() {
        return "No shapes drawn.\n".to_string();
    }
    let mut out = String::new();
    for (layer_id, geometry) in location.layers.iter() {
        let kind = match geometry.geometry_type() {
            GeometryType::Point => "point",
            GeometryType::LineString => "line",
            GeometryType::Polygon => "polygon",
        };
        let centroid = geometry.centroid();
        let _ = writeln!(
            out,
            "- {layer_id}: {kind} near {:.6}, {:.6}",
            centroid.lat, centroid.lng
        );
    }
    out
}

/// All three steps, separated by blank lines.
pub fn render_household(payload: &HouseholdPayload, width: usize) -> String {
    let mut out = render_step(&payload.general, width);
    out.push('\n');
    out.push_str(&render_step(&payload.technical, width));
    out.push('\n');
    out.push_str(&render_step(&payload.location, width));
    out.push_str(&render_layers(&payload.location));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DrawEvent, Geometry, TechnicalData};

    #[test]
    fn computed_fields_are_marked() {
        let technical = TechnicalData {
            building_area: Some(96.0),
            ..TechnicalData::default()
        };
        let text = render_step(&technical, 80);
        assert!(text.starts_with("Technical Data\n=============="));
        assert!(text.contains("Building area (m²) *"));
        assert!(text.contains(": 96.00"));
        assert!(text.contains("Roof material "));
    }

    #[test]
    fn long_values_wrap_under_the_value_column() {
        let mut payload = HouseholdPayload::default();
        payload.general.address =
            Some("Jalan Kenanga Raya nomor 12 gang buntu sebelah masjid".to_string());
        let text = render_step(&payload.general, 40);
        let address_lines: Vec<&str> = text
            .lines()
            .skip_while(|line| !line.starts_with("Address"))
            .take(3)
            .collect();
        assert!(address_lines[1].starts_with(' '));
        assert!(text.lines().all(|line| UnicodeWidthStr::width(line) <= 40 + MIN_VALUE_WIDTH));
    }

    #[test]
    fn household_summary_lists_drawn_layers() {
        let mut payload = HouseholdPayload::default();
        payload
            .location
            .layers
            .apply(DrawEvent::Created {
                layer_id: "house".into(),
                geometry: Geometry::Point([106.8, -6.2]),
            })
            .unwrap();
        let text = render_household(&payload, 72);
        assert!(text.contains("Map Location"));
        assert!(text.contains("- house: point near -6.200000, 106.800000"));
    }
}
