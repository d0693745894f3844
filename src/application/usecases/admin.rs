use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::errors::{UseCaseError, UseCaseResult},
    domain::{
        entities::{
            goals::{AdminUpdateGoalEntity, GoalEntity},
            users::EditUserEntity,
        },
        repositories::{goals::GoalRepository, payments::PaymentRepository, users::UserRepository},
        value_objects::{
            enums::{
                goal_statuses::GoalStatus,
                payment_statuses::PaymentStatus,
                roles::{Capability, Role},
            },
            goals::{
                AdminGoalModel, AdminUpdateGoalModel, GoalModel, PaymentModel,
                checked_duration_days, end_date_after,
            },
            iam::RequestContext,
            users::{AdminUpdateUserModel, RenameUserModel, UserModel},
        },
    },
};

pub struct AdminUseCase<G, U, P>
where
    G: GoalRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
{
    goal_repo: Arc<G>,
    user_repo: Arc<U>,
    payment_repo: Arc<P>,
}

impl<G, U, P> AdminUseCase<G, U, P>
where
    G: GoalRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
{
    pub fn new(goal_repo: Arc<G>, user_repo: Arc<U>, payment_repo: Arc<P>) -> Self {
        Self {
            goal_repo,
            user_repo,
            payment_repo,
        }
    }

    pub async fn list_users(&self, ctx: &RequestContext) -> UseCaseResult<Vec<UserModel>> {
        ctx.require(Capability::Administer)?;
        let admin_id = ctx.user_id;

        let users = self.user_repo.list_all().await.map_err(|err| {
            error!(%admin_id, db_error = ?err, "admin: failed to list users");
            UseCaseError::Internal(err)
        })?;
        Ok(users.into_iter().map(UserModel::from).collect())
    }

    pub async fn get_user(&self, ctx: &RequestContext, user_id: Uuid) -> UseCaseResult<UserModel> {
        ctx.require(Capability::Administer)?;
        let admin_id = ctx.user_id;

        self.user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%admin_id, %user_id, db_error = ?err, "admin: failed to load user");
                UseCaseError::Internal(err)
            })?
            .map(UserModel::from)
            .ok_or(UseCaseError::NotFound("user"))
    }

    pub async fn update_user(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        request: AdminUpdateUserModel,
    ) -> UseCaseResult<UserModel> {
        ctx.require(Capability::Administer)?;
        let admin_id = ctx.user_id;

        if let Some(email) = request.email.as_deref() {
            if email.trim().is_empty() || !email.contains('@') {
                return Err(UseCaseError::Validation(
                    "email must be a valid address".to_string(),
                ));
            }
        }

        let updated = self
            .user_repo
            .update(user_id, request.to_entity())
            .await
            .map_err(|err| {
                error!(%admin_id, %user_id, db_error = ?err, "admin: failed to update user");
                UseCaseError::Internal(err)
            })?
            .ok_or(UseCaseError::NotFound("user"))?;

        info!(%admin_id, %user_id, role = %updated.role, "admin: user updated");
        Ok(UserModel::from(updated))
    }

    pub async fn rename_user(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        request: RenameUserModel,
    ) -> UseCaseResult<UserModel> {
        ctx.require(Capability::Administer)?;
        let admin_id = ctx.user_id;

        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| UseCaseError::Validation("name is required".to_string()))?
            .to_string();

        let changes = EditUserEntity {
            name: Some(Some(name)),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };

        let updated = self
            .user_repo
            .update(user_id, changes)
            .await
            .map_err(|err| {
                error!(%admin_id, %user_id, db_error = ?err, "admin: failed to rename user");
                UseCaseError::Internal(err)
            })?
            .ok_or(UseCaseError::NotFound("user"))?;

        Ok(UserModel::from(updated))
    }

    /// Users still tied to goals stay; their goals reference them.
    pub async fn delete_user(&self, ctx: &RequestContext, user_id: Uuid) -> UseCaseResult<()> {
        ctx.require(Capability::Administer)?;
        let admin_id = ctx.user_id;

        if user_id == admin_id {
            return Err(UseCaseError::InvalidState(
                "admins cannot delete themselves".to_string(),
            ));
        }

        let involved = self
            .goal_repo
            .count_involving_user(user_id)
            .await
            .map_err(|err| {
                error!(%admin_id, %user_id, db_error = ?err, "admin: failed to count user goals");
                UseCaseError::Internal(err)
            })?;
        if involved > 0 {
            let err = UseCaseError::InvalidState(format!(
                "user still owns or instructs {involved} goal(s)"
            ));
            warn!(%admin_id, %user_id, involved, status = err.status_code().as_u16(), "admin: user delete refused");
            return Err(err);
        }

        let deleted = self.user_repo.delete(user_id).await.map_err(|err| {
            error!(%admin_id, %user_id, db_error = ?err, "admin: failed to delete user");
            UseCaseError::Internal(err)
        })?;
        if !deleted {
            return Err(UseCaseError::NotFound("user"));
        }

        info!(%admin_id, %user_id, "admin: user deleted");
        Ok(())
    }

    pub async fn list_goals(&self, ctx: &RequestContext) -> UseCaseResult<Vec<AdminGoalModel>> {
        ctx.require(Capability::Administer)?;
        let admin_id = ctx.user_id;

        let goals = self.goal_repo.list_all().await.map_err(|err| {
            error!(%admin_id, db_error = ?err, "admin: failed to list goals");
            UseCaseError::Internal(err)
        })?;
        Ok(goals
            .into_iter()
            .map(|(goal, payment)| AdminGoalModel {
                goal: GoalModel::from(goal),
                payment: payment.map(PaymentModel::from),
            })
            .collect())
    }

    pub async fn get_goal(&self, ctx: &RequestContext, goal_id: Uuid) -> UseCaseResult<AdminGoalModel> {
        ctx.require(Capability::Administer)?;
        let admin_id = ctx.user_id;

        let goal = self.load_goal(admin_id, goal_id).await?;
        let payment = self
            .payment_repo
            .find_by_goal_id(goal_id)
            .await
            .map_err(|err| {
                error!(%admin_id, %goal_id, db_error = ?err, "admin: failed to load payment");
                UseCaseError::Internal(err)
            })?;

        Ok(AdminGoalModel {
            goal: GoalModel::from(goal),
            payment: payment.map(PaymentModel::from),
        })
    }

    pub async fn update_goal(
        &self,
        ctx: &RequestContext,
        goal_id: Uuid,
        request: AdminUpdateGoalModel,
    ) -> UseCaseResult<GoalModel> {
        ctx.require(Capability::Administer)?;
        let admin_id = ctx.user_id;

        let goal = self.load_goal(admin_id, goal_id).await?;

        if let Some(instructor_id) = request.instructor_id {
            let instructor = self
                .user_repo
                .find_by_id(instructor_id)
                .await
                .map_err(|err| {
                    error!(%admin_id, %instructor_id, db_error = ?err, "admin: failed to load instructor");
                    UseCaseError::Internal(err)
                })?
                .ok_or(UseCaseError::NotFound("instructor"))?;
            let role = Role::from_str(&instructor.role).unwrap_or_default();
            if !role.allows(Capability::Instruct) {
                return Err(UseCaseError::Validation(format!(
                    "user {instructor_id} is not an instructor"
                )));
            }
        }

        let changes = plan_goal_update(&goal, &request, Utc::now()).map_err(|err| {
            warn!(
                %admin_id,
                %goal_id,
                status = err.status_code().as_u16(),
                error = %err,
                "admin: goal update rejected"
            );
            err
        })?;

        let updated = self
            .goal_repo
            .admin_update(goal_id, changes)
            .await
            .map_err(|err| {
                error!(%admin_id, %goal_id, db_error = ?err, "admin: failed to update goal");
                UseCaseError::Internal(err)
            })?
            .ok_or(UseCaseError::NotFound("goal"))?;

        info!(%admin_id, %goal_id, goal_status = %updated.status, "admin: goal updated");
        Ok(GoalModel::from(updated))
    }

    /// A goal whose stake is still held has money attached and is not deleted.
    pub async fn delete_goal(&self, ctx: &RequestContext, goal_id: Uuid) -> UseCaseResult<()> {
        ctx.require(Capability::Administer)?;
        let admin_id = ctx.user_id;

        let payment = self
            .payment_repo
            .find_by_goal_id(goal_id)
            .await
            .map_err(|err| {
                error!(%admin_id, %goal_id, db_error = ?err, "admin: failed to load payment");
                UseCaseError::Internal(err)
            })?;
        if let Some(payment) = payment {
            if payment.payment_status()? == PaymentStatus::Held {
                let err = UseCaseError::InvalidState(
                    "goal still has a held stake; finalize it first".to_string(),
                );
                warn!(%admin_id, %goal_id, status = err.status_code().as_u16(), "admin: goal delete refused");
                return Err(err);
            }
        }

        let deleted = self.goal_repo.delete(goal_id).await.map_err(|err| {
            error!(%admin_id, %goal_id, db_error = ?err, "admin: failed to delete goal");
            UseCaseError::Internal(err)
        })?;
        if !deleted {
            return Err(UseCaseError::NotFound("goal"));
        }

        info!(%admin_id, %goal_id, "admin: goal deleted");
        Ok(())
    }

    async fn load_goal(&self, admin_id: Uuid, goal_id: Uuid) -> UseCaseResult<GoalEntity> {
        self.goal_repo
            .find_by_id(goal_id)
            .await
            .map_err(|err| {
                error!(%admin_id, %goal_id, db_error = ?err, "admin: failed to load goal");
                UseCaseError::Internal(err)
            })?
            .ok_or(UseCaseError::NotFound("goal"))
    }
}

/// Turns an admin edit into a changeset that keeps the row consistent:
/// terminal statuses only come from finalizing, ASSIGNED and ACTIVE need an
/// instructor, and ACTIVE needs a start and end.
fn plan_goal_update(
    goal: &GoalEntity,
    request: &AdminUpdateGoalModel,
    now: DateTime<Utc>,
) -> UseCaseResult<AdminUpdateGoalEntity> {
    let current = goal.goal_status()?;
    let mut changes = AdminUpdateGoalEntity {
        updated_at: Some(now),
        ..Default::default()
    };

    if let Some(title) = request.title.as_deref() {
        let title = title.trim();
        if title.is_empty() {
            return Err(UseCaseError::Validation("title cannot be empty".to_string()));
        }
        changes.title = Some(title.to_string());
    }
    if let Some(description) = request.description.as_deref() {
        let description = description.trim();
        if description.is_empty() {
            return Err(UseCaseError::Validation(
                "description cannot be empty".to_string(),
            ));
        }
        changes.description = Some(description.to_string());
    }

    let duration_days = match request.duration_days {
        None => goal.duration_days,
        Some(days) => checked_duration_days(days).map_err(UseCaseError::Validation)?,
    };
    if request.duration_days.is_some() {
        changes.duration_days = Some(duration_days);
    }

    let touches_lifecycle = request.status.is_some() || request.instructor_id.is_some();
    if touches_lifecycle && current.is_terminal() {
        return Err(UseCaseError::InvalidState(format!(
            "goal is {current}; its status and instructor are final"
        )));
    }

    if let Some(instructor_id) = request.instructor_id {
        if instructor_id == goal.user_id {
            return Err(UseCaseError::SelfAssignment);
        }
    }
    let instructor_id = request.instructor_id.or(goal.instructor_id);
    let target = request.status.unwrap_or(current);

    match target {
        GoalStatus::Completed | GoalStatus::Failed => {
            if request.status.is_some() {
                return Err(UseCaseError::InvalidState(
                    "goals are completed or failed only by their instructor".to_string(),
                ));
            }
        }
        GoalStatus::PendingInstructorAssignment => {
            if request.instructor_id.is_some() {
                return Err(UseCaseError::Validation(
                    "a goal awaiting assignment cannot have an instructor".to_string(),
                ));
            }
            if request.status.is_some() {
                changes.status = Some(target.to_string());
                changes.instructor_id = Some(None);
                changes.started_at = Some(None);
                changes.end_date = Some(None);
            }
        }
        GoalStatus::Assigned => {
            if instructor_id.is_none() {
                return Err(UseCaseError::Validation(
                    "an assigned goal needs an instructor".to_string(),
                ));
            }
            changes.instructor_id = request.instructor_id.map(Some);
            if request.status.is_some() {
                changes.status = Some(target.to_string());
                changes.started_at = Some(None);
                changes.end_date = Some(None);
            }
        }
        GoalStatus::Active => {
            if instructor_id.is_none() {
                return Err(UseCaseError::Validation(
                    "an active goal needs an instructor".to_string(),
                ));
            }
            changes.instructor_id = request.instructor_id.map(Some);
            let started_at = goal.started_at.unwrap_or(now);
            let end_date = end_date_after(started_at, duration_days).ok_or_else(|| {
                UseCaseError::Validation("durationDays is out of range".to_string())
            })?;
            if request.status.is_some() {
                changes.status = Some(target.to_string());
            }
            if goal.started_at.is_none() {
                changes.started_at = Some(Some(started_at));
            }
            if goal.end_date != Some(end_date) {
                changes.end_date = Some(Some(end_date));
            }
        }
    }

    Ok(changes)
}
