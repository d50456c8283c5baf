use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::forms::errors::{FieldErrorSet, SubmissionResult};
use crate::forms::normalize::{FileBlob, FormData, FormValue};
use crate::forms::schema::validate_form;
use crate::panel::DeletedRecord;
use crate::profile::ProfileResource;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

type SubmissionResponse<T> = (StatusCode, Json<SubmissionResult<T>>);

fn rejected<T>(status: StatusCode, errors: FieldErrorSet) -> SubmissionResponse<T> {
    (status, Json(SubmissionResult::error(errors)))
}

fn not_found<T>() -> SubmissionResponse<T> {
    rejected(
        StatusCode::NOT_FOUND,
        FieldErrorSet::form("This record no longer exists. Reload and try again."),
    )
}

/// Reads a multipart body into raw form pairs, preserving field order.
pub async fn read_form(mut multipart: Multipart) -> Result<FormData, AppError> {
    let mut form = FormData::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let value = if filename.is_some() {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload '{name}': {e}")))?;
            FormValue::File(FileBlob {
                filename,
                content_type,
                bytes,
            })
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?;
            FormValue::Text(text)
        };
        form.append(name, value);
    }
    Ok(form)
}

/// GET /api/v1/profile/{resource}
pub async fn handle_list<R: ProfileResource>(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<R>>, AppError> {
    let records = R::list(&state.db, params.user_id).await?;
    Ok(Json(records))
}

/// POST /api/v1/profile/{resource}
///
/// Creates when the form carries no `id`, updates otherwise.
pub async fn handle_save<R: ProfileResource>(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    multipart: Multipart,
) -> Result<SubmissionResponse<R>, AppError> {
    let form = read_form(multipart).await?;
    let schema = R::schema(&state.schemas);

    let input = match validate_form(schema.as_ref(), &form) {
        Ok(input) => input,
        Err(errors) => {
            debug!("Rejected {} submission: {errors}", R::PATH);
            return Ok(rejected(StatusCode::UNPROCESSABLE_ENTITY, errors));
        }
    };

    let saved = match R::input_id(&input) {
        None => Some(R::insert(&state.db, params.user_id, input).await?),
        Some(id) => R::update(&state.db, params.user_id, id, input).await?,
    };

    match saved {
        Some(record) => Ok((StatusCode::OK, Json(SubmissionResult::success(record)))),
        None => Ok(not_found()),
    }
}

/// POST /api/v1/profile/{resource}/delete
pub async fn handle_delete<R: ProfileResource>(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    multipart: Multipart,
) -> Result<SubmissionResponse<DeletedRecord>, AppError> {
    let form = read_form(multipart).await?;

    let input = match validate_form(state.schemas.delete.as_ref(), &form) {
        Ok(input) => input,
        Err(errors) => return Ok(rejected(StatusCode::UNPROCESSABLE_ENTITY, errors)),
    };

    if !R::delete(&state.db, params.user_id, input.id).await? {
        return Ok(not_found());
    }

    info!("Deleted {} record {} for user {}", R::PATH, input.id, params.user_id);
    Ok((
        StatusCode::OK,
        Json(SubmissionResult::success(DeletedRecord { id: input.id })),
    ))
}
