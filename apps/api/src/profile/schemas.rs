//! Form schemas for profile entities.
//!
//! The same schemas validate in the browser-side controllers and again in
//! the server handlers before anything is written.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::forms::errors::FieldErrorSet;
use crate::forms::schema::{de, JsonFormSchema, Refine, SchemaError};

const DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";
const UUID_PATTERN: &str =
    r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";
const GPA_PATTERN: &str = r"^\d(\.\d{1,2})?$";

pub const MAX_NAME_LEN: u64 = 120;
pub const MAX_HIGHLIGHT_LEN: u64 = 300;
pub const MAX_OBJECTIVE_LEN: u64 = 2000;
pub const MAX_GPA: f64 = 4.0;

#[derive(Debug, Clone, Deserialize)]
pub struct JobInput {
    pub id: Option<Uuid>,
    pub company: String,
    pub title: String,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DegreeInput {
    pub id: Option<Uuid>,
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::optional_decimal")]
    pub gpa: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillCategoryInput {
    pub id: Option<Uuid>,
    pub name: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectiveInput {
    pub id: Option<Uuid>,
    pub title: String,
    pub body: String,
    #[serde(default, deserialize_with = "de::checkbox")]
    pub is_default: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteInput {
    pub id: Uuid,
}

fn check_period(start: NaiveDate, end: Option<NaiveDate>, errors: &mut FieldErrorSet) {
    if matches!(end, Some(end) if end < start) {
        errors.add_field("end_date", "End date cannot be before start date");
    }
}

impl Refine for JobInput {
    fn refine(&self, errors: &mut FieldErrorSet) {
        check_period(self.start_date, self.end_date, errors);
    }
}

impl Refine for DegreeInput {
    fn refine(&self, errors: &mut FieldErrorSet) {
        check_period(self.start_date, self.end_date, errors);
        if matches!(self.gpa, Some(gpa) if gpa > MAX_GPA) {
            errors.add_field("gpa", format!("GPA cannot exceed {MAX_GPA:.1}"));
        }
    }
}

impl Refine for SkillCategoryInput {
    fn refine(&self, errors: &mut FieldErrorSet) {
        let mut seen = std::collections::HashSet::new();
        if self
            .skills
            .iter()
            .any(|s| !seen.insert(s.trim().to_lowercase()))
        {
            errors.add_field("skills", "Each skill may only be listed once");
        }
    }
}

impl Refine for ObjectiveInput {}

impl Refine for DeleteInput {}

fn text(max: u64) -> Value {
    json!({ "type": "string", "maxLength": max })
}

fn pattern(pattern: &str) -> Value {
    json!({ "type": "string", "pattern": pattern })
}

fn job_schema() -> Value {
    json!({
        "type": "object",
        "required": ["company", "title", "start_date"],
        "properties": {
            "id": pattern(UUID_PATTERN),
            "company": text(MAX_NAME_LEN),
            "title": text(MAX_NAME_LEN),
            "location": text(MAX_NAME_LEN),
            "start_date": pattern(DATE_PATTERN),
            "end_date": pattern(DATE_PATTERN),
            "highlights": {
                "type": "array",
                "items": { "type": "string", "minLength": 1, "maxLength": MAX_HIGHLIGHT_LEN }
            }
        }
    })
}

fn degree_schema() -> Value {
    json!({
        "type": "object",
        "required": ["institution", "degree", "start_date"],
        "properties": {
            "id": pattern(UUID_PATTERN),
            "institution": text(MAX_NAME_LEN),
            "degree": text(MAX_NAME_LEN),
            "field_of_study": text(MAX_NAME_LEN),
            "start_date": pattern(DATE_PATTERN),
            "end_date": pattern(DATE_PATTERN),
            "gpa": pattern(GPA_PATTERN)
        }
    })
}

fn skill_category_schema() -> Value {
    json!({
        "type": "object",
        "required": ["name", "skills"],
        "properties": {
            "id": pattern(UUID_PATTERN),
            "name": text(MAX_NAME_LEN),
            "skills": {
                "type": "array",
                "minItems": 1,
                "items": { "type": "string", "minLength": 1, "maxLength": MAX_NAME_LEN }
            }
        }
    })
}

fn objective_schema() -> Value {
    json!({
        "type": "object",
        "required": ["title", "body"],
        "properties": {
            "id": pattern(UUID_PATTERN),
            "title": text(MAX_NAME_LEN),
            "body": text(MAX_OBJECTIVE_LEN),
            "is_default": { "type": "string" }
        }
    })
}

fn delete_schema() -> Value {
    json!({
        "type": "object",
        "required": ["id"],
        "properties": { "id": pattern(UUID_PATTERN) }
    })
}

/// Compiled schemas for every profile form, shared by client and server.
#[derive(Clone)]
pub struct ProfileSchemas {
    pub job: Arc<JsonFormSchema<JobInput>>,
    pub degree: Arc<JsonFormSchema<DegreeInput>>,
    pub skill_category: Arc<JsonFormSchema<SkillCategoryInput>>,
    pub objective: Arc<JsonFormSchema<ObjectiveInput>>,
    pub delete: Arc<JsonFormSchema<DeleteInput>>,
}

impl ProfileSchemas {
    pub fn build() -> Result<Self, SchemaError> {
        Ok(Self {
            job: Arc::new(JsonFormSchema::new(job_schema())?),
            degree: Arc::new(JsonFormSchema::new(degree_schema())?),
            skill_category: Arc::new(JsonFormSchema::new(skill_category_schema())?),
            objective: Arc::new(JsonFormSchema::new(objective_schema())?),
            delete: Arc::new(JsonFormSchema::new(delete_schema())?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::normalize::FormData;
    use crate::forms::schema::{validate_form, FormSchema, REQUIRED_MESSAGE};

    fn schemas() -> ProfileSchemas {
        ProfileSchemas::build().unwrap()
    }

    #[test]
    fn test_job_form_parses() {
        let form = FormData::new()
            .with("company", "Acme")
            .with("title", "Engineer")
            .with("location", "")
            .with("start_date", "2021-03-01")
            .with("end_date", "")
            .with("highlights[]", "Cut p99 latency by 40%")
            .with("highlights[]", "Mentored 4 engineers");
        let job = validate_form(schemas().job.as_ref(), &form).unwrap();
        assert_eq!(job.company, "Acme");
        assert!(job.id.is_none());
        assert!(job.location.is_none());
        assert!(job.end_date.is_none());
        assert_eq!(job.highlights.len(), 2);
    }

    #[test]
    fn test_job_end_before_start_flags_end_date() {
        let form = FormData::new()
            .with("company", "Acme")
            .with("title", "Engineer")
            .with("start_date", "2021-03-01")
            .with("end_date", "2020-01-01");
        let errors = validate_form(schemas().job.as_ref(), &form).unwrap_err();
        assert_eq!(
            errors.for_field("end_date"),
            ["End date cannot be before start date"]
        );
        assert!(errors.for_field("start_date").is_empty());
    }

    #[test]
    fn test_job_missing_required_fields() {
        let errors = validate_form(schemas().job.as_ref(), &FormData::new()).unwrap_err();
        for field in ["company", "title", "start_date"] {
            assert_eq!(errors.for_field(field), [REQUIRED_MESSAGE], "{field}");
        }
    }

    #[test]
    fn test_job_rejects_blank_highlight() {
        let form = FormData::new()
            .with("company", "Acme")
            .with("title", "Engineer")
            .with("start_date", "2021-03-01")
            .with("highlights[]", "");
        let errors = validate_form(schemas().job.as_ref(), &form).unwrap_err();
        assert_eq!(errors.for_field("highlights").len(), 1);
    }

    #[test]
    fn test_job_rejects_malformed_id() {
        let form = FormData::new()
            .with("id", "not-a-uuid")
            .with("company", "Acme")
            .with("title", "Engineer")
            .with("start_date", "2021-03-01");
        let errors = validate_form(schemas().job.as_ref(), &form).unwrap_err();
        assert_eq!(errors.for_field("id").len(), 1);
    }

    #[test]
    fn test_degree_gpa_bounds() {
        let base = FormData::new()
            .with("institution", "MIT")
            .with("degree", "BSc")
            .with("start_date", "2015-09-01");

        let ok = validate_form(schemas().degree.as_ref(), &base.clone().with("gpa", "3.85")).unwrap();
        assert_eq!(ok.gpa, Some(3.85));

        let errors =
            validate_form(schemas().degree.as_ref(), &base.clone().with("gpa", "4.5")).unwrap_err();
        assert_eq!(errors.for_field("gpa"), ["GPA cannot exceed 4.0"]);

        let errors = validate_form(schemas().degree.as_ref(), &base.with("gpa", "abc")).unwrap_err();
        assert_eq!(errors.for_field("gpa").len(), 1);
    }

    #[test]
    fn test_skill_category_needs_skills() {
        let form = FormData::new().with("name", "Languages");
        let errors = validate_form(schemas().skill_category.as_ref(), &form).unwrap_err();
        assert_eq!(errors.for_field("skills"), [REQUIRED_MESSAGE]);

        let form = FormData::new()
            .with("name", "Languages")
            .with("skills[]", "Rust")
            .with("skills[]", "rust");
        let errors = validate_form(schemas().skill_category.as_ref(), &form).unwrap_err();
        assert_eq!(errors.for_field("skills"), ["Each skill may only be listed once"]);
    }

    #[test]
    fn test_objective_checkbox() {
        let form = FormData::new()
            .with("title", "Backend")
            .with("body", "Build reliable systems");
        let unchecked = validate_form(schemas().objective.as_ref(), &form).unwrap();
        assert!(!unchecked.is_default);

        let checked =
            validate_form(schemas().objective.as_ref(), &form.with("is_default", "on")).unwrap();
        assert!(checked.is_default);
    }

    #[test]
    fn test_delete_requires_uuid() {
        let schema = schemas().delete;
        let id = Uuid::new_v4();
        let parsed = schema.parse(&json!({ "id": id.to_string() })).unwrap();
        assert_eq!(parsed.id, id);
        assert_eq!(
            schema.parse(&json!({})).unwrap_err().for_field("id"),
            [REQUIRED_MESSAGE]
        );
    }
}
