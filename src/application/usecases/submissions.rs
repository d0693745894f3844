use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::errors::{UseCaseError, UseCaseResult},
    domain::{
        entities::daily_submissions::InsertDailySubmissionEntity,
        repositories::{
            daily_submissions::DailySubmissionRepository, goals::GoalRepository,
            storage::FileStorage,
        },
        value_objects::{
            due_dates::{MAX_UTC_OFFSET_MINUTES, local_day},
            enums::{
                goal_statuses::GoalStatus, roles::Capability,
                submission_statuses::SubmissionStatus,
            },
            iam::RequestContext,
            submissions::{
                EditSubmissionModel, SubmissionModel, SubmissionUpsert, SubmitDailyModel,
                SubmitOutcome, UploadedFile,
            },
        },
    },
};

pub struct SubmissionsUseCase<G, S, F>
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    F: FileStorage + Send + Sync + 'static,
{
    goal_repo: Arc<G>,
    submission_repo: Arc<S>,
    storage: Arc<F>,
}

impl<G, S, F> SubmissionsUseCase<G, S, F>
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    F: FileStorage + Send + Sync + 'static,
{
    pub fn new(goal_repo: Arc<G>, submission_repo: Arc<S>, storage: Arc<F>) -> Self {
        Self {
            goal_repo,
            submission_repo,
            storage,
        }
    }

    /// Creates today's submission, or overwrites it while it is still pending.
    /// "Today" is the owner's calendar day at the offset their client reports.
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        request: SubmitDailyModel,
    ) -> UseCaseResult<SubmitOutcome> {
        ctx.require(Capability::ManageOwnGoals)?;
        let user_id = ctx.user_id;
        let goal_id = request.goal_id;

        let content = non_empty_content(&request.content).map_err(|err| {
            warn!(%user_id, %goal_id, status = err.status_code().as_u16(), "submissions: empty content");
            err
        })?;

        let now = Utc::now();
        let day = local_day(now, request.utc_offset_minutes).ok_or_else(|| {
            UseCaseError::Validation(format!(
                "utcOffsetMinutes must be within +/-{MAX_UTC_OFFSET_MINUTES}"
            ))
        })?;

        let goal = self
            .goal_repo
            .find_by_id(goal_id)
            .await
            .map_err(|err| {
                error!(%user_id, %goal_id, db_error = ?err, "submissions: failed to load goal");
                UseCaseError::Internal(err)
            })?
            .filter(|goal| goal.user_id == user_id)
            .ok_or_else(|| {
                warn!(%user_id, %goal_id, status = 404, "submissions: goal not found for owner");
                UseCaseError::NotFound("goal")
            })?;

        if goal.goal_status()? != GoalStatus::Active {
            let err = UseCaseError::InvalidState("goal is not active".to_string());
            warn!(
                %user_id,
                %goal_id,
                goal_status = %goal.status,
                status = err.status_code().as_u16(),
                "submissions: submit on inactive goal"
            );
            return Err(err);
        }

        let file_url = self.store_file(user_id, request.file).await?;

        let upsert = self
            .submission_repo
            .upsert_for_day(InsertDailySubmissionEntity {
                goal_id,
                submission_date: now,
                submission_day: day,
                content,
                file_url,
                status: SubmissionStatus::Pending.to_string(),
            })
            .await
            .map_err(|err| {
                error!(%user_id, %goal_id, %day, db_error = ?err, "submissions: failed to upsert submission");
                UseCaseError::Internal(err)
            })?;

        match upsert {
            SubmissionUpsert::Created(submission) => {
                info!(%user_id, %goal_id, %day, submission_id = %submission.id, "submissions: created");
                Ok(SubmitOutcome {
                    submission: SubmissionModel::from(submission),
                    created: true,
                })
            }
            SubmissionUpsert::Updated(submission) => {
                info!(%user_id, %goal_id, %day, submission_id = %submission.id, "submissions: replaced today's submission");
                Ok(SubmitOutcome {
                    submission: SubmissionModel::from(submission),
                    created: false,
                })
            }
            SubmissionUpsert::AlreadyReviewed(submission) => {
                let err = UseCaseError::InvalidState(
                    "today's submission has already been reviewed".to_string(),
                );
                warn!(
                    %user_id,
                    %goal_id,
                    submission_id = %submission.id,
                    status = err.status_code().as_u16(),
                    "submissions: resubmission after review"
                );
                Err(err)
            }
        }
    }

    pub async fn edit(
        &self,
        ctx: &RequestContext,
        submission_id: Uuid,
        request: EditSubmissionModel,
    ) -> UseCaseResult<SubmissionModel> {
        ctx.require(Capability::ManageOwnGoals)?;
        let user_id = ctx.user_id;

        let content = non_empty_content(&request.content)?;

        let submission = self
            .submission_repo
            .find_by_id(submission_id)
            .await
            .map_err(|err| {
                error!(%user_id, %submission_id, db_error = ?err, "submissions: failed to load submission");
                UseCaseError::Internal(err)
            })?
            .ok_or(UseCaseError::NotFound("submission"))?;

        let goal = self
            .goal_repo
            .find_by_id(submission.goal_id)
            .await
            .map_err(|err| {
                error!(%user_id, %submission_id, db_error = ?err, "submissions: failed to load goal");
                UseCaseError::Internal(err)
            })?
            .ok_or(UseCaseError::NotFound("goal"))?;

        if goal.user_id != user_id {
            let err = UseCaseError::Forbidden("only the goal owner can edit".to_string());
            warn!(%user_id, %submission_id, status = err.status_code().as_u16(), "submissions: edit by non-owner");
            return Err(err);
        }
        if submission.submission_status()? != SubmissionStatus::Pending {
            let err = UseCaseError::InvalidState("submission was already reviewed".to_string());
            warn!(%user_id, %submission_id, status = err.status_code().as_u16(), "submissions: edit after review");
            return Err(err);
        }
        if goal.goal_status()? != GoalStatus::Active {
            let err = UseCaseError::InvalidState("goal is not active".to_string());
            warn!(%user_id, %submission_id, status = err.status_code().as_u16(), "submissions: edit on inactive goal");
            return Err(err);
        }

        let file_url = self
            .store_file(user_id, request.file)
            .await?
            .or(submission.file_url);

        let edited = self
            .submission_repo
            .update_pending_content(submission_id, content, file_url, Utc::now())
            .await
            .map_err(|err| {
                error!(%user_id, %submission_id, db_error = ?err, "submissions: failed to edit submission");
                UseCaseError::Internal(err)
            })?
            .ok_or_else(|| UseCaseError::InvalidState("submission was already reviewed".to_string()))?;

        info!(%user_id, %submission_id, "submissions: edited");
        Ok(SubmissionModel::from(edited))
    }

    async fn store_file(
        &self,
        user_id: Uuid,
        file: Option<UploadedFile>,
    ) -> UseCaseResult<Option<String>> {
        let Some(file) = file else {
            return Ok(None);
        };
        let file_name = file.file_name.clone();
        let size = file.bytes.len();
        let url = self.storage.put(file).await.map_err(|err| {
            error!(%user_id, file_name = %file_name, size, error = ?err, "submissions: failed to store file");
            UseCaseError::Internal(err)
        })?;
        Ok(Some(url))
    }
}

fn non_empty_content(content: &str) -> UseCaseResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(UseCaseError::Validation("content is required".to_string()));
    }
    Ok(trimmed.to_string())
}
