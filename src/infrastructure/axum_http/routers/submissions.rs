use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::Field},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    application::usecases::{
        errors::{UseCaseError, UseCaseResult},
        submissions::SubmissionsUseCase,
    },
    domain::{
        repositories::{
            daily_submissions::DailySubmissionRepository, goals::GoalRepository,
            storage::FileStorage,
        },
        value_objects::submissions::{EditSubmissionModel, SubmitDailyModel, UploadedFile},
    },
    infrastructure::{
        axum_http::{
            auth::AuthUser,
            extractors::{ApiMultipart, ApiPath},
        },
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{daily_submissions::DailySubmissionPostgres, goals::GoalPostgres},
        },
        storages::SubmissionFileStorage,
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, storage: Arc<SubmissionFileStorage>) -> Router {
    let usecase = SubmissionsUseCase::new(
        Arc::new(GoalPostgres::new(Arc::clone(&db_pool))),
        Arc::new(DailySubmissionPostgres::new(Arc::clone(&db_pool))),
        storage,
    );

    // Upload size is governed by the server-wide RequestBodyLimitLayer.
    Router::new()
        .route("/", post(submit_daily))
        .route("/:submission_id", patch(edit_submission))
        .layer(DefaultBodyLimit::disable())
        .with_state(Arc::new(usecase))
}

/// Fields of the submission forms; unknown parts are skipped.
#[derive(Debug, Default)]
struct SubmissionForm {
    goal_id: Option<String>,
    content: Option<String>,
    utc_offset_minutes: Option<String>,
    file: Option<UploadedFile>,
}

async fn read_form(mut multipart: Multipart) -> UseCaseResult<SubmissionForm> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| UseCaseError::Validation(format!("invalid multipart body: {err}")))?
    {
        match field.name().unwrap_or_default() {
            "goalId" => form.goal_id = Some(read_text(field).await?),
            "content" => form.content = Some(read_text(field).await?),
            "utcOffsetMinutes" => form.utc_offset_minutes = Some(read_text(field).await?),
            "file" => form.file = read_file(field).await?,
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: Field<'_>) -> UseCaseResult<String> {
    field
        .text()
        .await
        .map_err(|err| UseCaseError::Validation(format!("invalid form field: {err}")))
}

/// An empty file part (no name, no bytes) means no file was chosen.
async fn read_file(field: Field<'_>) -> UseCaseResult<Option<UploadedFile>> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|err| UseCaseError::Validation(format!("invalid file upload: {err}")))?;

    if bytes.is_empty() && file_name.is_empty() {
        return Ok(None);
    }

    Ok(Some(UploadedFile {
        file_name: if file_name.is_empty() {
            "upload".to_string()
        } else {
            file_name
        },
        content_type,
        bytes: bytes.to_vec(),
    }))
}

impl SubmissionForm {
    fn into_submit(self) -> UseCaseResult<SubmitDailyModel> {
        let goal_id = self
            .goal_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| UseCaseError::Validation("goalId is required".to_string()))?;
        let goal_id = Uuid::parse_str(goal_id)
            .map_err(|_| UseCaseError::Validation("goalId must be a valid UUID".to_string()))?;

        let utc_offset_minutes = match self.utc_offset_minutes.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(raw) => raw.parse::<i32>().map_err(|_| {
                UseCaseError::Validation("utcOffsetMinutes must be an integer".to_string())
            })?,
        };

        Ok(SubmitDailyModel {
            goal_id,
            content: self.content.unwrap_or_default(),
            file: self.file,
            utc_offset_minutes,
        })
    }

    fn into_edit(self) -> EditSubmissionModel {
        EditSubmissionModel {
            content: self.content.unwrap_or_default(),
            file: self.file,
        }
    }
}

pub async fn submit_daily<G, S, F>(
    State(usecase): State<Arc<SubmissionsUseCase<G, S, F>>>,
    auth: AuthUser,
    ApiMultipart(multipart): ApiMultipart,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    F: FileStorage + Send + Sync + 'static,
{
    info!(user_id = %auth.user_id, "submissions: submit request received");

    let request = match read_form(multipart).await.and_then(SubmissionForm::into_submit) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };

    match usecase.submit(&auth.to_context(), request).await {
        Ok(outcome) if outcome.created => {
            (StatusCode::CREATED, Json(outcome.submission)).into_response()
        }
        Ok(outcome) => Json(outcome.submission).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn edit_submission<G, S, F>(
    State(usecase): State<Arc<SubmissionsUseCase<G, S, F>>>,
    auth: AuthUser,
    ApiPath(submission_id): ApiPath<Uuid>,
    ApiMultipart(multipart): ApiMultipart,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    F: FileStorage + Send + Sync + 'static,
{
    info!(user_id = %auth.user_id, %submission_id, "submissions: edit request received");

    let request = match read_form(multipart).await {
        Ok(form) => form.into_edit(),
        Err(err) => return err.into_response(),
    };

    match usecase
        .edit(&auth.to_context(), submission_id, request)
        .await
    {
        Ok(submission) => Json(submission).into_response(),
        Err(err) => err.into_response(),
    }
}
