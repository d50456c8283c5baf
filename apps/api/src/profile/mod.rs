// Profile sections a user manages: jobs, degrees, skill categories and
// objectives. Each section is a ProfileResource; handlers, client and panels
// are written once against that trait.

pub mod client;
pub mod handlers;
pub mod models;
pub mod repo;
pub mod schemas;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::forms::schema::{JsonFormSchema, Refine};
use crate::panel::Record;
use crate::profile::schemas::ProfileSchemas;

/// A profile section persisted per user and edited through an entity panel.
#[async_trait]
pub trait ProfileResource:
    Record + Serialize + DeserializeOwned + Unpin + for<'r> FromRow<'r, PgRow>
{
    /// Validated form payload for create and update.
    type Input: DeserializeOwned + Refine + Send + Sync + 'static;

    /// URL segment under `/api/v1/profile/`.
    const PATH: &'static str;
    const TABLE: &'static str;
    /// Column list selected into `Self`.
    const COLUMNS: &'static str;

    fn schema(schemas: &ProfileSchemas) -> Arc<JsonFormSchema<Self::Input>>;

    fn input_id(input: &Self::Input) -> Option<Uuid>;

    async fn insert(pool: &PgPool, user_id: Uuid, input: Self::Input) -> Result<Self, sqlx::Error>;

    /// `None` when the user owns no record with `id`.
    async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        input: Self::Input,
    ) -> Result<Option<Self>, sqlx::Error>;

    /// All of the user's records in creation order.
    async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1 ORDER BY position",
            Self::COLUMNS,
            Self::TABLE
        );
        sqlx::query_as::<_, Self>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// `false` when the user owns no record with `id`.
    async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND user_id = $2", Self::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
