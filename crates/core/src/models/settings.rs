use super::null_as_default;
use hms_types::NonEmptyText;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Department {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentCreate {
    pub name: NonEmptyText,
}

/// A billable service or item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Particular {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub rate: Option<f64>,
    /// Included in the default line list of a new OP bill.
    #[serde(deserialize_with = "null_as_default")]
    pub default_op: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub default_ip: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub sort_order: i64,
    pub created_at: Option<String>,
}

impl Particular {
    /// The department name, or `default` when the backend sent none.
    pub fn department_label(&self, default: &str) -> String {
        self.department_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(default)
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticularCreate {
    pub name: NonEmptyText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsStats {
    #[serde(deserialize_with = "null_as_default")]
    pub total_departments: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_particulars: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particular_defaults_flags_when_absent() {
        let p: Particular =
            serde_json::from_str(r#"{"id":9,"name":"ECG","department_id":2,"department_name":null}"#)
                .unwrap();
        assert!(!p.default_op);
        assert_eq!(p.sort_order, 0);
        assert_eq!(p.department_label("OPD"), "OPD");
    }

    #[test]
    fn particular_create_skips_missing_rate() {
        let body = ParticularCreate {
            name: NonEmptyText::new("X-RAY").unwrap(),
            department_id: Some(3),
            rate: None,
        };
        let json = serde_json::to_value(body).unwrap();
        assert!(json.get("rate").is_none());
        assert_eq!(json["department_id"], 3);
        assert_eq!(json["name"], "X-RAY");
    }
}
