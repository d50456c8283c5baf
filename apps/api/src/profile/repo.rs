use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::forms::schema::JsonFormSchema;
use crate::profile::models::{Degree, Job, Objective, SkillCategory};
use crate::profile::schemas::{
    DegreeInput, JobInput, ObjectiveInput, ProfileSchemas, SkillCategoryInput,
};
use crate::profile::ProfileResource;

const JOB_COLUMNS: &str = "id, company, title, location, start_date, end_date, highlights";
const DEGREE_COLUMNS: &str = "id, institution, degree, field_of_study, start_date, end_date, gpa";
const SKILL_CATEGORY_COLUMNS: &str = "id, name, skills";
const OBJECTIVE_COLUMNS: &str = "id, title, body, is_default";

#[async_trait]
impl ProfileResource for Job {
    type Input = JobInput;

    const PATH: &'static str = "jobs";
    const TABLE: &'static str = "jobs";
    const COLUMNS: &'static str = JOB_COLUMNS;

    fn schema(schemas: &ProfileSchemas) -> Arc<JsonFormSchema<JobInput>> {
        schemas.job.clone()
    }

    fn input_id(input: &JobInput) -> Option<Uuid> {
        input.id
    }

    async fn insert(pool: &PgPool, user_id: Uuid, input: JobInput) -> Result<Job, sqlx::Error> {
        let id = Uuid::new_v4();
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs
                (id, user_id, company, title, location, start_date, end_date, highlights)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.company)
        .bind(&input.title)
        .bind(&input.location)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.highlights)
        .fetch_one(pool)
        .await?;

        info!("Created job {id} for user {user_id}");
        Ok(job)
    }

    async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        input: JobInput,
    ) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET company = $3, title = $4, location = $5, start_date = $6,
                end_date = $7, highlights = $8, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.company)
        .bind(&input.title)
        .bind(&input.location)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.highlights)
        .fetch_optional(pool)
        .await
    }
}

#[async_trait]
impl ProfileResource for Degree {
    type Input = DegreeInput;

    const PATH: &'static str = "degrees";
    const TABLE: &'static str = "degrees";
    const COLUMNS: &'static str = DEGREE_COLUMNS;

    fn schema(schemas: &ProfileSchemas) -> Arc<JsonFormSchema<DegreeInput>> {
        schemas.degree.clone()
    }

    fn input_id(input: &DegreeInput) -> Option<Uuid> {
        input.id
    }

    async fn insert(pool: &PgPool, user_id: Uuid, input: DegreeInput) -> Result<Degree, sqlx::Error> {
        let id = Uuid::new_v4();
        let degree = sqlx::query_as::<_, Degree>(&format!(
            r#"
            INSERT INTO degrees
                (id, user_id, institution, degree, field_of_study, start_date, end_date, gpa)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {DEGREE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.institution)
        .bind(&input.degree)
        .bind(&input.field_of_study)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.gpa)
        .fetch_one(pool)
        .await?;

        info!("Created degree {id} for user {user_id}");
        Ok(degree)
    }

    async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        input: DegreeInput,
    ) -> Result<Option<Degree>, sqlx::Error> {
        sqlx::query_as::<_, Degree>(&format!(
            r#"
            UPDATE degrees
            SET institution = $3, degree = $4, field_of_study = $5, start_date = $6,
                end_date = $7, gpa = $8, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {DEGREE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.institution)
        .bind(&input.degree)
        .bind(&input.field_of_study)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.gpa)
        .fetch_optional(pool)
        .await
    }
}

#[async_trait]
impl ProfileResource for SkillCategory {
    type Input = SkillCategoryInput;

    const PATH: &'static str = "skills";
    const TABLE: &'static str = "skill_categories";
    const COLUMNS: &'static str = SKILL_CATEGORY_COLUMNS;

    fn schema(schemas: &ProfileSchemas) -> Arc<JsonFormSchema<SkillCategoryInput>> {
        schemas.skill_category.clone()
    }

    fn input_id(input: &SkillCategoryInput) -> Option<Uuid> {
        input.id
    }

    async fn insert(
        pool: &PgPool,
        user_id: Uuid,
        input: SkillCategoryInput,
    ) -> Result<SkillCategory, sqlx::Error> {
        let id = Uuid::new_v4();
        let category = sqlx::query_as::<_, SkillCategory>(&format!(
            r#"
            INSERT INTO skill_categories (id, user_id, name, skills)
            VALUES ($1, $2, $3, $4)
            RETURNING {SKILL_CATEGORY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.skills)
        .fetch_one(pool)
        .await?;

        info!("Created skill category {id} for user {user_id}");
        Ok(category)
    }

    async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        input: SkillCategoryInput,
    ) -> Result<Option<SkillCategory>, sqlx::Error> {
        sqlx::query_as::<_, SkillCategory>(&format!(
            r#"
            UPDATE skill_categories
            SET name = $3, skills = $4, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {SKILL_CATEGORY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.skills)
        .fetch_optional(pool)
        .await
    }
}

/// Objectives keep at most one default per user. Setting the flag clears it
/// on the user's other objectives inside the same transaction.
#[async_trait]
impl ProfileResource for Objective {
    type Input = ObjectiveInput;

    const PATH: &'static str = "objectives";
    const TABLE: &'static str = "objectives";
    const COLUMNS: &'static str = OBJECTIVE_COLUMNS;

    fn schema(schemas: &ProfileSchemas) -> Arc<JsonFormSchema<ObjectiveInput>> {
        schemas.objective.clone()
    }

    fn input_id(input: &ObjectiveInput) -> Option<Uuid> {
        input.id
    }

    async fn insert(
        pool: &PgPool,
        user_id: Uuid,
        input: ObjectiveInput,
    ) -> Result<Objective, sqlx::Error> {
        let id = Uuid::new_v4();
        let mut tx = pool.begin().await?;

        if input.is_default {
            clear_default_objectives(&mut tx, user_id, id).await?;
        }
        let objective = sqlx::query_as::<_, Objective>(&format!(
            r#"
            INSERT INTO objectives (id, user_id, title, body, is_default)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {OBJECTIVE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.body)
        .bind(input.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Created objective {id} for user {user_id}");
        Ok(objective)
    }

    async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        input: ObjectiveInput,
    ) -> Result<Option<Objective>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if input.is_default {
            clear_default_objectives(&mut tx, user_id, id).await?;
        }
        let objective = sqlx::query_as::<_, Objective>(&format!(
            r#"
            UPDATE objectives
            SET title = $3, body = $4, is_default = $5, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {OBJECTIVE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.body)
        .bind(input.is_default)
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping the transaction rolls back the cleared defaults.
        if objective.is_some() {
            tx.commit().await?;
        }
        Ok(objective)
    }
}

async fn clear_default_objectives(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    keep: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE objectives SET is_default = false, updated_at = now() \
         WHERE user_id = $1 AND id <> $2 AND is_default",
    )
    .bind(user_id)
    .bind(keep)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
