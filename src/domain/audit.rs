use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    Created,
    Updated,
    Deleted,
    Approved,
    Rejected,
}

/// One row of a household's change history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub event: AuditEvent,
    #[serde(default)]
    pub user_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub old_values: Map<String, Value>,
    #[serde(default)]
    pub new_values: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDiff {
    pub field: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl AuditEntry {
    /// Fields whose value differs between `old_values` and `new_values`,
    /// in the order they first appear.
    pub fn changed_fields(&self) -> Vec<FieldDiff> {
        let mut names: Vec<&String> = self.old_values.keys().collect();
        for key in self.new_values.keys() {
            if !names.contains(&key) {
                names.push(key);
            }
        }
        names
            .into_iter()
            .filter_map(|name| {
                let before = self.old_values.get(name).filter(|value| !value.is_null());
                let after = self.new_values.get(name).filter(|value| !value.is_null());
                (before != after).then(|| FieldDiff {
                    field: name.clone(),
                    before: before.cloned(),
                    after: after.cloned(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diff_skips_unchanged_and_null_equivalent_fields() {
        let entry: AuditEntry = serde_json::from_value(json!({
            "event": "updated",
            "userName": "surveyor",
            "createdAt": "2024-05-01T08:00:00Z",
            "oldValues": {"headName": "Budi", "rt": "01", "rw": null},
            "newValues": {"headName": "Budi S.", "rt": "01", "floorCount": 2}
        }))
        .unwrap();
        let diff = entry.changed_fields();
        let names: Vec<&str> = diff.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(names, vec!["headName", "floorCount"]);
        assert_eq!(diff[1].before, None);
        assert_eq!(diff[1].after, Some(json!(2)));
    }
}
