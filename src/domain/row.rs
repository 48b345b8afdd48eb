//! Typed result rows.
//!
//! The search endpoint returns one nested JSON object per result, e.g.
//! `{"campaign": {"name": "A"}, "metrics": {"costMicros": "1200000"}}`.
//! [`Row::from_api_result`] flattens that into an ordered list of dotted
//! field names with typed scalars, `campaign.name = "A"` and
//! `metrics.cost_micros = 1200000`.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// A single typed scalar from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free text (names, enum values such as `ENABLED`).
    Text(String),
    /// Whole number, including int64 metrics the API encodes as strings.
    Integer(i64),
    /// Floating-point metric (`metrics.ctr`, `metrics.conversions`).
    Float(f64),
    /// Boolean flag.
    Boolean(bool),
    /// Identifier or resource name; rendered as text, never as a number.
    Identifier(String),
}

impl FieldValue {
    /// Renders the value for text outputs. Non-finite floats render empty.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) | Self::Identifier(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) if f.is_finite() => f.to_string(),
            Self::Float(_) => String::new(),
            Self::Boolean(b) => b.to_string(),
        }
    }

    /// Numeric view of the value, if it has one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) if f.is_finite() => Some(*f),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Converts to a JSON value, keeping numbers numeric.
    ///
    /// A float JSON cannot represent (NaN, infinity) becomes `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) | Self::Identifier(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Boolean(b) => Value::Bool(*b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// An ordered mapping from dotted field name to [`FieldValue`].
///
/// Field order is insertion order; inserting an existing name replaces the
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, FieldValue)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens one nested API result object into a row.
    ///
    /// Non-object input yields a single `value` field.
    #[must_use]
    pub fn from_api_result(result: &Value) -> Self {
        let mut row = Self::new();
        match result {
            Value::Object(_) => flatten_into(&mut row, "", result),
            other => flatten_into(&mut row, "value", other),
        }
        row
    }

    /// Sets `field`, replacing an existing value in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        let field = field.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(name, _)| *name == field) {
            slot.1 = value;
        } else {
            self.fields.push((field, value));
        }
    }

    /// Builder-style [`Row::insert`].
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Looks up a field by its dotted name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Numeric value of a field, if present and numeric.
    #[must_use]
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_f64)
    }

    /// Rendered text of a field; empty when missing.
    #[must_use]
    pub fn render(&self, field: &str) -> String {
        self.get(field).map(FieldValue::render).unwrap_or_default()
    }

    /// Field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, &value.to_json())?;
        }
        map.end()
    }
}

/// Converts an API key (`costMicros`) to its query-language name
/// (`cost_micros`).
#[must_use]
pub fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn flatten_into(row: &mut Row, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let key = snake_case(key);
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(row, &path, child);
            }
        }
        Value::Null => {}
        Value::Bool(b) => row.insert(prefix, *b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => row.insert(prefix, i),
            None => row.insert(prefix, n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => row.insert(prefix, classify_string(prefix, s)),
        Value::Array(_) => row.insert(prefix, value.to_string()),
    }
}

fn classify_string(path: &str, s: &str) -> FieldValue {
    let leaf = path.rsplit('.').next().unwrap_or(path);
    if leaf == "resource_name" || leaf == "id" || leaf.ends_with("_id") {
        return FieldValue::Identifier(s.to_string());
    }
    if path.starts_with("metrics.") {
        if let Ok(i) = s.parse::<i64>() {
            return FieldValue::Integer(i);
        }
    }
    FieldValue::Text(s.to_string())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_result_in_order() {
        let result = json!({
            "campaign": {
                "resourceName": "customers/1/campaigns/42",
                "id": "42",
                "name": "Brand",
                "status": "ENABLED"
            },
            "metrics": {
                "clicks": "10",
                "costMicros": "1500000",
                "ctr": 0.025,
                "conversions": 1.5
            }
        });
        let row = Row::from_api_result(&result);
        let names: Vec<&str> = row.field_names().collect();
        assert_eq!(
            names,
            vec![
                "campaign.resource_name",
                "campaign.id",
                "campaign.name",
                "campaign.status",
                "metrics.clicks",
                "metrics.cost_micros",
                "metrics.ctr",
                "metrics.conversions",
            ]
        );
        assert_eq!(row.get("metrics.clicks"), Some(&FieldValue::Integer(10)));
        assert_eq!(
            row.get("metrics.cost_micros"),
            Some(&FieldValue::Integer(1_500_000))
        );
        assert_eq!(row.get("campaign.id"), Some(&FieldValue::Identifier("42".into())));
        assert_eq!(row.get("campaign.name"), Some(&FieldValue::Text("Brand".into())));
        assert_eq!(row.get("metrics.ctr"), Some(&FieldValue::Float(0.025)));
    }

    #[test]
    fn deeply_nested_paths_use_dots() {
        let result = json!({"adGroupAd": {"ad": {"id": "7", "name": "Spring"}}});
        let row = Row::from_api_result(&result);
        assert_eq!(row.render("ad_group_ad.ad.id"), "7");
        assert_eq!(row.render("ad_group_ad.ad.name"), "Spring");
    }

    #[test]
    fn non_metric_digit_strings_stay_text() {
        let row = Row::from_api_result(&json!({"campaign": {"name": "2024"}}));
        assert_eq!(row.get("campaign.name"), Some(&FieldValue::Text("2024".into())));
    }

    #[test]
    fn missing_field_renders_empty() {
        let row = Row::new().with("campaign.name", "A");
        assert_eq!(row.render("metrics.clicks"), "");
        assert!(row.get_f64("metrics.clicks").is_none());
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut row = Row::new().with("a", 1_i64).with("b", 2_i64);
        row.insert("a", 3_i64);
        let names: Vec<&str> = row.field_names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&FieldValue::Integer(3)));
    }

    #[test]
    fn non_finite_float_degrades() {
        let value = FieldValue::Float(f64::NAN);
        assert_eq!(value.render(), "");
        assert_eq!(value.to_json(), Value::Null);
        assert!(value.as_f64().is_none());
    }

    #[test]
    fn serializes_as_ordered_object() {
        let row = Row::new().with("z.last", "x").with("a.first", 5_i64);
        let Ok(json) = serde_json::to_string(&row) else {
            panic!("serialization failed");
        };
        assert_eq!(json, r#"{"z.last":"x","a.first":5}"#);
    }

    #[test]
    fn snake_case_conversion() {
        assert_eq!(snake_case("costMicros"), "cost_micros");
        assert_eq!(snake_case("adGroupAd"), "ad_group_ad");
        assert_eq!(snake_case("ctr"), "ctr");
    }
}
