use std::marker::PhantomData;

use jsonschema::Validator;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::forms::errors::FieldErrorSet;
use crate::forms::normalize::{normalize, FormData};

pub const REQUIRED_MESSAGE: &str = "Required";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid form schema: {0}")]
    Invalid(String),
}

/// Capability every form schema exposes to the submission controllers.
///
/// `parse` never panics on bad input; every rejection is a [`FieldErrorSet`].
pub trait FormSchema: Send + Sync {
    type Output;

    fn parse(&self, candidate: &Value) -> Result<Self::Output, FieldErrorSet>;
}

/// Object-safe view of a [`FormSchema`] that only reports validity.
pub trait FormValidator: Send + Sync {
    fn check(&self, candidate: &Value) -> Result<(), FieldErrorSet>;
}

impl<S: FormSchema> FormValidator for S {
    fn check(&self, candidate: &Value) -> Result<(), FieldErrorSet> {
        self.parse(candidate).map(|_| ())
    }
}

/// Cross-field rules that run after a value has been deserialized.
///
/// Implementations attach each error to whichever field the user should fix,
/// which need not be the field holding the offending value.
pub trait Refine {
    fn refine(&self, _errors: &mut FieldErrorSet) {}
}

/// Normalizes a raw submission and runs it through `schema`.
///
/// Shape conflicts from normalization are reported on the conflicting field.
pub fn validate_form<S: FormSchema + ?Sized>(
    schema: &S,
    form: &FormData,
) -> Result<S::Output, FieldErrorSet> {
    let normalized = normalize(form).map_err(|e| FieldErrorSet::field(e.field(), e.to_string()))?;
    schema.parse(&normalized.to_json())
}

/// Same as [`validate_form`] for a type-erased validator.
pub fn check_form(validator: &dyn FormValidator, form: &FormData) -> Result<(), FieldErrorSet> {
    let normalized = normalize(form).map_err(|e| FieldErrorSet::field(e.field(), e.to_string()))?;
    validator.check(&normalized.to_json())
}

/// A schema backed by a JSON Schema document and a serde target type.
///
/// Parsing runs in three passes:
/// 1. blank top-level strings are dropped and the `required` list is checked,
/// 2. the remaining structural constraints run through `jsonschema`,
/// 3. the candidate is deserialized into `T` and `T::refine` runs.
///
/// A pass only runs when the previous one produced no errors.
pub struct JsonFormSchema<T> {
    validator: Validator,
    required: Vec<String>,
    _target: PhantomData<fn() -> T>,
}

impl<T> JsonFormSchema<T> {
    pub fn new(mut schema: Value) -> Result<Self, SchemaError> {
        let required = match schema.as_object_mut().and_then(|o| o.remove("required")) {
            Some(Value::Array(names)) => names
                .into_iter()
                .map(|n| match n {
                    Value::String(s) => Ok(s),
                    other => Err(SchemaError::Invalid(format!(
                        "required entries must be strings, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(SchemaError::Invalid(format!(
                    "required must be an array, got {other}"
                )))
            }
            None => Vec::new(),
        };

        let validator =
            jsonschema::validator_for(&schema).map_err(|e| SchemaError::Invalid(e.to_string()))?;

        Ok(Self {
            validator,
            required,
            _target: PhantomData,
        })
    }

    fn structural_errors(&self, candidate: &Value) -> FieldErrorSet {
        let mut errors = FieldErrorSet::new();

        let object = candidate.as_object();
        for name in &self.required {
            if object.and_then(|o| o.get(name)).is_none() {
                errors.add_field(name.clone(), REQUIRED_MESSAGE);
            }
        }
        if !errors.is_empty() {
            return errors;
        }

        for error in self.validator.iter_errors(candidate) {
            let pointer = error.instance_path.to_string();
            match top_level_field(&pointer) {
                Some(field) => errors.add_field(field, error.to_string()),
                None => errors.add_form(error.to_string()),
            }
        }
        errors
    }
}

impl<T> FormSchema for JsonFormSchema<T>
where
    T: DeserializeOwned + Refine,
{
    type Output = T;

    fn parse(&self, candidate: &Value) -> Result<T, FieldErrorSet> {
        let candidate = drop_blank_strings(candidate);

        let errors = self.structural_errors(&candidate);
        if !errors.is_empty() {
            return Err(errors);
        }

        let value: T = serde_json::from_value(candidate)
            .map_err(|e| FieldErrorSet::form(format!("Invalid value: {e}")))?;

        let mut errors = FieldErrorSet::new();
        value.refine(&mut errors);
        errors.into_result(value)
    }
}

/// Blank inputs arrive as empty strings; treat them as absent.
fn drop_blank_strings(candidate: &Value) -> Value {
    match candidate {
        Value::Object(object) => Value::Object(
            object
                .iter()
                .filter(|(_, v)| !matches!(v, Value::String(s) if s.trim().is_empty()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<_, _>>(),
        ),
        other => other.clone(),
    }
}

/// `/skills/0` → `skills`; the root pointer has no field.
fn top_level_field(pointer: &str) -> Option<String> {
    let first = pointer.strip_prefix('/')?.split('/').next()?;
    if first.is_empty() {
        return None;
    }
    Some(first.replace("~1", "/").replace("~0", "~"))
}

/// Deserializers for values as browsers submit them.
pub mod de {
    use serde::{Deserialize, Deserializer};

    /// Checkbox inputs are absent when unchecked and usually `"on"` when
    /// checked. Use with `#[serde(default, deserialize_with = ...)]`.
    pub fn checkbox<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "on" | "true" | "1" | "yes"
        ))
    }

    /// An optional decimal number submitted as text.
    pub fn optional_decimal<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s
                .parse::<f64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a number"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Period {
        label: String,
        start: NaiveDate,
        end: Option<NaiveDate>,
        #[serde(default, deserialize_with = "de::checkbox")]
        current: bool,
        #[serde(default)]
        tags: Vec<String>,
    }

    impl Refine for Period {
        fn refine(&self, errors: &mut FieldErrorSet) {
            if let Some(end) = self.end {
                if end < self.start {
                    errors.add_field("end", "End must not precede start");
                }
            }
        }
    }

    fn period_schema() -> JsonFormSchema<Period> {
        JsonFormSchema::new(json!({
            "type": "object",
            "required": ["label", "start"],
            "properties": {
                "label": { "type": "string", "maxLength": 10 },
                "start": { "type": "string", "pattern": "^\\d{4}-\\d{2}-\\d{2}$" },
                "end": { "type": "string", "pattern": "^\\d{4}-\\d{2}-\\d{2}$" },
                "tags": { "type": "array", "items": { "type": "string", "minLength": 1 } }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_candidate_parses() {
        let parsed = period_schema()
            .parse(&json!({"label": "Acme", "start": "2020-01-01", "current": "on", "tags": ["a"]}))
            .unwrap();
        assert_eq!(parsed.label, "Acme");
        assert!(parsed.current);
        assert!(parsed.end.is_none());
        assert_eq!(parsed.tags, ["a"]);
    }

    #[test]
    fn test_missing_and_blank_required_fields() {
        let errors = period_schema()
            .parse(&json!({"label": "   "}))
            .unwrap_err();
        assert_eq!(errors.for_field("label"), [REQUIRED_MESSAGE]);
        assert_eq!(errors.for_field("start"), [REQUIRED_MESSAGE]);
        assert!(errors.form_errors.is_empty());
    }

    #[test]
    fn test_blank_optional_field_is_absent() {
        let parsed = period_schema()
            .parse(&json!({"label": "Acme", "start": "2020-01-01", "end": ""}))
            .unwrap();
        assert!(parsed.end.is_none());
    }

    #[test]
    fn test_structural_errors_keyed_by_top_level_field() {
        let errors = period_schema()
            .parse(&json!({"label": "far too long a label", "start": "2020-01-01", "tags": [""]}))
            .unwrap_err();
        assert_eq!(errors.for_field("label").len(), 1);
        assert_eq!(errors.for_field("tags").len(), 1);
    }

    #[test]
    fn test_refinement_attaches_to_chosen_field() {
        let errors = period_schema()
            .parse(&json!({"label": "Acme", "start": "2020-05-01", "end": "2020-01-01"}))
            .unwrap_err();
        assert_eq!(errors.for_field("end"), ["End must not precede start"]);
        assert!(errors.for_field("start").is_empty());
    }

    #[test]
    fn test_unparseable_date_is_form_error() {
        let errors = period_schema()
            .parse(&json!({"label": "Acme", "start": "2020-02-31"}))
            .unwrap_err();
        assert_eq!(errors.form_errors.len(), 1);
        assert!(errors.form_errors[0].starts_with("Invalid value"));
    }

    #[test]
    fn test_validate_form_reports_shape_conflict_on_field() {
        let form: FormData = [("tags[]", "a"), ("tags[x]", "b")].into_iter().collect();
        let errors = validate_form(&period_schema(), &form).unwrap_err();
        assert_eq!(errors.for_field("tags").len(), 1);
    }

    #[test]
    fn test_non_array_required_is_rejected() {
        let result = JsonFormSchema::<Period>::new(json!({"type": "object", "required": "label"}));
        assert!(matches!(result, Err(SchemaError::Invalid(_))));
    }

    #[test]
    fn test_top_level_field_from_pointer() {
        assert_eq!(top_level_field("/skills/0").as_deref(), Some("skills"));
        assert_eq!(top_level_field("/title").as_deref(), Some("title"));
        assert_eq!(top_level_field(""), None);
    }
}
