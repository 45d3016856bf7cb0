use crate::domain::{ComputedField, FormRecord};

/// Re-derives every computed field whose sources intersect `changed`, in
/// declaration order. A target is appended to `changed` only when the stored
/// value actually moved, which keeps derived fields from feeding back into
/// themselves.
pub fn recompute<R: FormRecord>(record: &mut R, changed: &mut Vec<R::Field>) {
    for computed in R::computed() {
        if !computed.depends_on(changed) {
            continue;
        }
        if write_back(record, computed) && !changed.contains(&computed.target) {
            changed.push(computed.target);
        }
    }
}

/// Re-derives every computed field regardless of what changed. Returns the
/// targets that moved.
pub fn recompute_all<R: FormRecord>(record: &mut R) -> Vec<R::Field> {
    let mut moved = Vec::new();
    for computed in R::computed() {
        if write_back(record, computed) {
            moved.push(computed.target);
        }
    }
    moved
}

/// Stores the derived value and reports whether the stored value moved. The
/// comparison is made after `set`, since a slot may normalize what it keeps.
fn write_back<R: FormRecord>(record: &mut R, computed: &ComputedField<R>) -> bool {
    let next = (computed.derive)(record);
    let before = record.get(computed.target);
    if before == next {
        return false;
    }
    record.set(computed.target, next.as_ref());
    record.get(computed.target) != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GeneralField, GeneralInfo, TechnicalData, TechnicalField};

    #[test]
    fn recomputes_only_when_sources_changed() {
        let mut record = GeneralInfo {
            male_members: Some(3),
            female_members: Some(2),
            disabled_members: Some(1),
            ..GeneralInfo::default()
        };
        let mut changed = vec![GeneralField::HeadName];
        recompute(&mut record, &mut changed);
        assert_eq!(record.total_members, None);

        let mut changed = vec![GeneralField::MaleMembers];
        recompute(&mut record, &mut changed);
        assert_eq!(record.total_members, Some(6));
        assert_eq!(changed, vec![GeneralField::MaleMembers, GeneralField::TotalMembers]);
    }

    #[test]
    fn chained_targets_follow_declaration_order() {
        let mut record = TechnicalData {
            building_length: Some(8.0),
            building_width: Some(6.0),
            floor_count: Some(2),
            household_members: Some(4),
            ..TechnicalData::default()
        };
        let mut changed = vec![TechnicalField::FloorCount];
        recompute(&mut record, &mut changed);
        assert_eq!(record.building_area, Some(96.0));
        assert_eq!(record.area_per_person, Some(24.0));
    }

    #[test]
    fn recompute_all_is_idempotent() {
        let mut record = TechnicalData {
            building_length: Some(8.0),
            building_width: Some(6.0),
            floor_count: Some(2),
            ..TechnicalData::default()
        };
        let first = recompute_all(&mut record);
        assert_eq!(first, vec![TechnicalField::BuildingArea]);
        assert!(recompute_all(&mut record).is_empty());
        assert_eq!(record.area_per_person, None);
    }

    #[test]
    fn overflowing_dimensions_settle_on_no_area() {
        let mut record = TechnicalData {
            building_length: Some(1e200),
            building_width: Some(1e200),
            floor_count: Some(1),
            building_area: Some(12.0),
            ..TechnicalData::default()
        };
        assert_eq!(recompute_all(&mut record), vec![TechnicalField::BuildingArea]);
        assert_eq!(record.building_area, None);
        assert!(recompute_all(&mut record).is_empty());
    }
}
