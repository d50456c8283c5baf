use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::panel::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Option<Uuid>,
    pub company: String,
    pub title: String,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Degree {
    pub id: Option<Uuid>,
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub gpa: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SkillCategory {
    pub id: Option<Uuid>,
    pub name: String,
    pub skills: Vec<String>,
}

/// A career objective. At most one per user is the default shown on new
/// resumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Objective {
    pub id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub is_default: bool,
}

impl Record for Job {
    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

impl Record for Degree {
    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

impl Record for SkillCategory {
    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

impl Record for Objective {
    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn is_default(&self) -> Option<bool> {
        Some(self.is_default)
    }

    fn set_default(&mut self, value: bool) {
        self.is_default = value;
    }
}
