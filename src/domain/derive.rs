//! Pure derivations behind the computed fields. Missing numeric inputs count
//! as zero.

/// `None` when the value (or its scaled form) is not finite.
pub fn round_to_cents(value: f64) -> Option<f64> {
    let scaled = value * 100.0;
    scaled.is_finite().then(|| scaled.round() / 100.0)
}

pub fn total_members(male: Option<u32>, female: Option<u32>, disabled: Option<u32>) -> u32 {
    [male, female, disabled]
        .into_iter()
        .map(|count| count.unwrap_or(0))
        .fold(0u32, u32::saturating_add)
}

/// `None` when the product overflows.
pub fn building_area(length: Option<f64>, width: Option<f64>, floors: Option<u32>) -> Option<f64> {
    let floors = f64::from(floors.unwrap_or(0));
    round_to_cents(length.unwrap_or(0.0) * width.unwrap_or(0.0) * floors)
}

/// `None` when there is nobody to divide by.
pub fn area_per_person(area: Option<f64>, members: Option<u32>) -> Option<f64> {
    let members = members.unwrap_or(0);
    if members == 0 {
        return None;
    }
    let ratio = area.unwrap_or(0.0) / f64::from(members);
    round_to_cents(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_treat_missing_counts_as_zero() {
        assert_eq!(total_members(Some(3), Some(2), Some(1)), 6);
        assert_eq!(total_members(Some(3), None, None), 3);
        assert_eq!(total_members(None, None, None), 0);
    }

    #[test]
    fn area_multiplies_all_dimensions() {
        assert_eq!(building_area(Some(8.0), Some(6.0), Some(2)), Some(96.0));
        assert_eq!(building_area(Some(8.0), Some(6.0), None), Some(0.0));
        assert_eq!(building_area(Some(3.333), Some(3.0), Some(1)), Some(10.0));
    }

    #[test]
    fn overflowing_area_has_no_value() {
        assert_eq!(building_area(Some(1e200), Some(1e200), Some(1)), None);
        assert_eq!(building_area(Some(1e154), Some(1e153), Some(1)), None);
        assert_eq!(round_to_cents(f64::MAX), None);
    }

    #[test]
    fn per_person_area_guards_division_by_zero() {
        assert_eq!(area_per_person(Some(96.0), Some(0)), None);
        assert_eq!(area_per_person(Some(96.0), None), None);
        assert_eq!(area_per_person(Some(96.0), Some(7)), Some(13.71));
    }
}
