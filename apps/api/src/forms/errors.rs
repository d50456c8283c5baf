use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Structured failure report for one form submission.
///
/// `form_errors` holds whole-form messages, `field_errors` maps a field name
/// to its messages in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrorSet {
    #[serde(default)]
    pub form_errors: Vec<String>,
    #[serde(default)]
    pub field_errors: IndexMap<String, Vec<String>>,
}

impl FieldErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding a single whole-form message and no field errors.
    pub fn form(message: impl Into<String>) -> Self {
        Self {
            form_errors: vec![message.into()],
            field_errors: IndexMap::new(),
        }
    }

    /// A set holding a single message for one field.
    pub fn field(name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add_field(name, message);
        errors
    }

    pub fn add_form(&mut self, message: impl Into<String>) {
        self.form_errors.push(message.into());
    }

    pub fn add_field(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(name.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }

    pub fn for_field(&self, name: &str) -> &[String] {
        self.field_errors
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Appends every message of `other` after the messages already held.
    pub fn merge(&mut self, other: FieldErrorSet) {
        self.form_errors.extend(other.form_errors);
        for (name, messages) in other.field_errors {
            self.field_errors.entry(name).or_default().extend(messages);
        }
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrorSet> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<String> = self.form_errors.clone();
        for (name, messages) in &self.field_errors {
            for message in messages {
                parts.push(format!("{name}: {message}"));
            }
        }
        write!(f, "{}", parts.join("; "))
    }
}

/// Outcome of a remote save or delete operation. Exactly one variant is
/// populated per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionResult<T> {
    Success { data: T },
    Error { errors: FieldErrorSet },
}

impl<T> SubmissionResult<T> {
    pub fn success(data: T) -> Self {
        SubmissionResult::Success { data }
    }

    pub fn error(errors: FieldErrorSet) -> Self {
        SubmissionResult::Error { errors }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionResult::Success { .. })
    }

    pub fn into_result(self) -> Result<T, FieldErrorSet> {
        match self {
            SubmissionResult::Success { data } => Ok(data),
            SubmissionResult::Error { errors } => Err(errors),
        }
    }
}

impl<T> From<Result<T, FieldErrorSet>> for SubmissionResult<T> {
    fn from(result: Result<T, FieldErrorSet>) -> Self {
        match result {
            Ok(data) => SubmissionResult::success(data),
            Err(errors) => SubmissionResult::error(errors),
        }
    }
}
