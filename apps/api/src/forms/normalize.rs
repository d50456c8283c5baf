//! Flat form submissions to nested objects.
//!
//! A browser posts `(name, value)` pairs. Names follow three shapes:
//!
//! - `title`          → single value, last write wins
//! - `highlights[]`   → ordered list (so does `highlights[0]`)
//! - `links[github]`  → object keyed by the trimmed bracket contents
//!
//! Mixing shapes under one base name is rejected with
//! [`NormalizeError::MixedShapes`]. Names that are not an identifier with an
//! optional single bracket suffix are kept verbatim as single fields.

use std::sync::LazyLock;

use bytes::Bytes;
use indexmap::map::Entry;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{json, Map, Value};
use thiserror::Error;

static FIELD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_$][A-Za-z0-9_$]*)(?:\[([^\[\]]*)\])?$").expect("valid field name regex")
});

/// One raw value posted by the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(FileBlob),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            FormValue::File(_) => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FormValue::Text(s) => Value::String(s.clone()),
            FormValue::File(blob) => json!({
                "filename": blob.filename,
                "contentType": blob.content_type,
                "size": blob.bytes.len(),
            }),
        }
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::Text(s.to_string())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::Text(s)
    }
}

/// The ordered pair sequence exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<FormValue>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Builder form of [`FormData::append`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FormValue>) -> Self {
        self.append(name, value);
        self
    }

    /// The last value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<FormValue>> FromIterator<(N, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

/// How a field name aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    Single,
    Array,
    Object(String),
}

impl FieldShape {
    fn describe(&self) -> &'static str {
        match self {
            FieldShape::Single => "single",
            FieldShape::Array => "array",
            FieldShape::Object(_) => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(FormValue),
    List(Vec<FormValue>),
    Object(IndexMap<String, FormValue>),
}

impl FieldValue {
    fn first(shape: FieldShape, value: FormValue) -> Self {
        match shape {
            FieldShape::Single => FieldValue::Single(value),
            FieldShape::Array => FieldValue::List(vec![value]),
            FieldShape::Object(key) => FieldValue::Object(IndexMap::from([(key, value)])),
        }
    }

    fn absorb(&mut self, base: &str, shape: FieldShape, value: FormValue) -> Result<(), NormalizeError> {
        match (self, shape) {
            (FieldValue::Single(existing), FieldShape::Single) => *existing = value,
            (FieldValue::List(items), FieldShape::Array) => items.push(value),
            (FieldValue::Object(entries), FieldShape::Object(key)) => {
                entries.insert(key, value);
            }
            (existing, shape) => {
                return Err(NormalizeError::MixedShapes {
                    field: base.to_string(),
                    first: existing.shape_name(),
                    second: shape.describe(),
                });
            }
        }
        Ok(())
    }

    fn shape_name(&self) -> &'static str {
        match self {
            FieldValue::Single(_) => "single",
            FieldValue::List(_) => "array",
            FieldValue::Object(_) => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("field '{field}' was submitted as both {first} and {second}")]
    MixedShapes {
        field: String,
        first: &'static str,
        second: &'static str,
    },
}

impl NormalizeError {
    pub fn field(&self) -> &str {
        match self {
            NormalizeError::MixedShapes { field, .. } => field,
        }
    }
}

/// Nested form object, top-level keys in first-submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedForm {
    fields: IndexMap<String, FieldValue>,
}

impl NormalizedForm {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// JSON view handed to schema validation.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (name, value) in &self.fields {
            let converted = match value {
                FieldValue::Single(v) => v.to_json(),
                FieldValue::List(items) => Value::Array(items.iter().map(FormValue::to_json).collect()),
                FieldValue::Object(entries) => Value::Object(
                    entries
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_json()))
                        .collect(),
                ),
            };
            object.insert(name.clone(), converted);
        }
        Value::Object(object)
    }
}

/// Splits a field name into its base name and aggregation shape.
pub fn classify_field_name(name: &str) -> (&str, FieldShape) {
    let Some(captures) = FIELD_NAME.captures(name) else {
        return (name, FieldShape::Single);
    };
    let base = captures.get(1).map_or(name, |m| m.as_str());
    let shape = match captures.get(2) {
        None => FieldShape::Single,
        Some(inner) => {
            let key = inner.as_str().trim();
            if key.is_empty() || key.chars().all(|c| c.is_ascii_digit()) {
                FieldShape::Array
            } else {
                FieldShape::Object(key.to_string())
            }
        }
    };
    (base, shape)
}

pub fn normalize(form: &FormData) -> Result<NormalizedForm, NormalizeError> {
    let mut fields: IndexMap<String, FieldValue> = IndexMap::new();

    for (name, value) in form.iter() {
        let (base, shape) = classify_field_name(name);
        match fields.entry(base.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(FieldValue::first(shape, value.clone()));
            }
            Entry::Occupied(mut slot) => slot.get_mut().absorb(base, shape, value.clone())?,
        }
    }

    Ok(NormalizedForm { fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FormValue {
        FormValue::Text(s.to_string())
    }

    #[test]
    fn test_plain_names_map_directly() {
        let form: FormData = [("name", "happy"), ("description", "some stuff")]
            .into_iter()
            .collect();
        let normalized = normalize(&form).unwrap();
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized.get("name"), Some(&FieldValue::Single(text("happy"))));
        assert_eq!(
            normalized.to_json(),
            json!({"name": "happy", "description": "some stuff"})
        );
    }

    #[test]
    fn test_repeated_plain_name_last_write_wins() {
        let form: FormData = [("name", "first"), ("name", "second")].into_iter().collect();
        let normalized = normalize(&form).unwrap();
        assert_eq!(normalized.to_json(), json!({"name": "second"}));
    }

    #[test]
    fn test_array_preserves_submission_order() {
        let forward: FormData = [("list[]", "first"), ("list[]", "second")].into_iter().collect();
        assert_eq!(
            normalize(&forward).unwrap().to_json(),
            json!({"list": ["first", "second"]})
        );

        let reversed: FormData = [("list[]", "second"), ("list[]", "first")].into_iter().collect();
        assert_eq!(
            normalize(&reversed).unwrap().to_json(),
            json!({"list": ["second", "first"]})
        );
    }

    #[test]
    fn test_object_aggregates_by_key() {
        let form: FormData = [("obj[a]", "Alpha"), ("obj[b]", "Beta")].into_iter().collect();
        assert_eq!(
            normalize(&form).unwrap().to_json(),
            json!({"obj": {"a": "Alpha", "b": "Beta"}})
        );
    }

    #[test]
    fn test_classify_field_names() {
        assert_eq!(classify_field_name("name"), ("name", FieldShape::Single));
        assert_eq!(classify_field_name("name[]"), ("name", FieldShape::Array));
        assert_eq!(classify_field_name("name[2]"), ("name", FieldShape::Array));
        assert_eq!(
            classify_field_name("name[cat]"),
            ("name", FieldShape::Object("cat".to_string()))
        );
        assert_eq!(
            classify_field_name("name[ cat ]"),
            ("name", FieldShape::Object("cat".to_string()))
        );
        assert_eq!(classify_field_name("name[  ]"), ("name", FieldShape::Array));
    }

    #[test]
    fn test_non_identifier_names_are_kept_verbatim() {
        assert_eq!(classify_field_name("a[b][c]"), ("a[b][c]", FieldShape::Single));
        assert_eq!(classify_field_name("1abc"), ("1abc", FieldShape::Single));
    }

    #[test]
    fn test_numeric_and_empty_brackets_share_one_list() {
        let form: FormData = [("skills[0]", "Rust"), ("skills[]", "SQL")].into_iter().collect();
        assert_eq!(
            normalize(&form).unwrap().to_json(),
            json!({"skills": ["Rust", "SQL"]})
        );
    }

    #[test]
    fn test_mixed_array_and_object_rejected() {
        let form: FormData = [("x[]", "1"), ("x[a]", "2")].into_iter().collect();
        let err = normalize(&form).unwrap_err();
        assert_eq!(err.field(), "x");
        assert_eq!(
            err,
            NormalizeError::MixedShapes {
                field: "x".to_string(),
                first: "array",
                second: "object",
            }
        );
    }

    #[test]
    fn test_mixed_single_and_array_rejected() {
        let form: FormData = [("x", "1"), ("x[]", "2")].into_iter().collect();
        assert!(matches!(
            normalize(&form),
            Err(NormalizeError::MixedShapes { first: "single", second: "array", .. })
        ));
    }

    #[test]
    fn test_file_values_render_as_metadata() {
        let mut form = FormData::new();
        form.append(
            "avatar",
            FormValue::File(FileBlob {
                filename: Some("me.png".to_string()),
                content_type: Some("image/png".to_string()),
                bytes: Bytes::from_static(b"\x89PNG"),
            }),
        );
        assert_eq!(
            normalize(&form).unwrap().to_json(),
            json!({"avatar": {"filename": "me.png", "contentType": "image/png", "size": 4}})
        );
    }

    #[test]
    fn test_form_data_get_returns_last_value() {
        let form = FormData::new().with("id", "a").with("id", "b");
        assert_eq!(form.get("id").and_then(FormValue::as_text), Some("b"));
        assert!(form.get("missing").is_none());
    }
}
