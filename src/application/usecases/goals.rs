use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::errors::{UseCaseError, UseCaseResult},
    domain::{
        entities::{goals::InsertGoalEntity, payments::InsertPaymentEntity},
        repositories::{
            daily_submissions::DailySubmissionRepository, goals::GoalRepository,
            payment_gateways::PaymentGateway, users::UserRepository,
        },
        value_objects::{
            due_dates::{MAX_UTC_OFFSET_MINUTES, next_due_for_goal},
            enums::{
                goal_statuses::GoalStatus, payment_statuses::PaymentStatus,
                payment_types::PaymentType, roles::Capability, sort_order::SortOrder,
            },
            goal_lifecycle::GoalAction,
            goals::{
                CreateGoalModel, CreatedGoalModel, GoalDetailModel, GoalModel,
                GoalWithSubmissionsModel, PaymentModel, StartGoalModel, end_date_after,
            },
            iam::RequestContext,
            payments::{HoldRequest, idempotency_key},
            submissions::SubmissionModel,
            users::insert_entity_from_context,
        },
    },
};

pub const STRIPE_PROVIDER: &str = "stripe";

pub struct GoalsUseCase<G, S, U, Gw>
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    goal_repo: Arc<G>,
    submission_repo: Arc<S>,
    user_repo: Arc<U>,
    gateway: Arc<Gw>,
    currency: String,
}

impl<G, S, U, Gw> GoalsUseCase<G, S, U, Gw>
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        goal_repo: Arc<G>,
        submission_repo: Arc<S>,
        user_repo: Arc<U>,
        gateway: Arc<Gw>,
        currency: String,
    ) -> Self {
        Self {
            goal_repo,
            submission_repo,
            user_repo,
            gateway,
            currency,
        }
    }

    /// Holds the stake first and only then writes the goal. A failed write
    /// releases the hold again.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        request: CreateGoalModel,
    ) -> UseCaseResult<CreatedGoalModel> {
        ctx.require(Capability::ManageOwnGoals)?;
        let user_id = ctx.user_id;

        let goal = request.validate().map_err(|message| {
            let err = UseCaseError::Validation(message);
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                error = %err,
                "goals: invalid create request"
            );
            err
        })?;

        let seed = insert_entity_from_context(ctx).ok_or_else(|| {
            let err = UseCaseError::Validation("session has no email address".to_string());
            warn!(%user_id, status = err.status_code().as_u16(), "goals: cannot seed owner row");
            err
        })?;
        self.user_repo.ensure_exists(seed).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "goals: failed to ensure owner row");
            UseCaseError::Internal(err)
        })?;

        let goal_id = Uuid::new_v4();
        info!(
            %user_id,
            %goal_id,
            stake_amount_minor = goal.stake_amount_minor,
            duration_days = goal.duration_days,
            "goals: holding stake"
        );

        let charge_id = self
            .gateway
            .hold(HoldRequest {
                amount_minor: goal.stake_amount_minor,
                currency: self.currency.clone(),
                source_token: goal.payment_token.clone(),
                description: format!("Stake for goal: {}", goal.title),
                user_id,
                idempotency_key: idempotency_key(goal_id, "hold"),
            })
            .await
            .map_err(|err| {
                let mapped = UseCaseError::from_gateway(err);
                warn!(
                    %user_id,
                    %goal_id,
                    status = mapped.status_code().as_u16(),
                    error = %mapped,
                    "goals: stake hold rejected"
                );
                mapped
            })?;

        let insert_goal = InsertGoalEntity {
            id: goal_id,
            title: goal.title,
            description: goal.description,
            duration_days: goal.duration_days,
            stake_amount_minor: goal.stake_amount_minor,
            currency: self.currency.clone(),
            start_date: Utc::now(),
            status: GoalStatus::PendingInstructorAssignment.to_string(),
            user_id,
        };
        let insert_payment = InsertPaymentEntity {
            goal_id,
            provider: STRIPE_PROVIDER.to_string(),
            stripe_charge_id: charge_id.clone(),
            amount_minor: goal.stake_amount_minor,
            currency: self.currency.clone(),
            status: PaymentStatus::Held.to_string(),
            type_: PaymentType::Stake.to_string(),
            recipient_id: user_id,
        };

        let (goal, payment) = match self
            .goal_repo
            .create_with_stake(insert_goal, insert_payment)
            .await
        {
            Ok(created) => created,
            Err(err) => {
                error!(
                    %user_id,
                    %goal_id,
                    charge_id = %charge_id,
                    db_error = ?err,
                    "goals: failed to persist goal, releasing hold"
                );
                if let Err(refund_err) = self
                    .gateway
                    .refund(charge_id.clone(), idempotency_key(goal_id, "release"))
                    .await
                {
                    error!(
                        %user_id,
                        %goal_id,
                        charge_id = %charge_id,
                        error = ?refund_err,
                        "goals: failed to release hold after persist failure"
                    );
                }
                return Err(UseCaseError::Internal(err));
            }
        };

        info!(%user_id, %goal_id, "goals: goal created with held stake");
        Ok(CreatedGoalModel {
            goal: GoalModel::from(goal),
            payment: PaymentModel::from(payment),
        })
    }

    pub async fn list(&self, ctx: &RequestContext) -> UseCaseResult<Vec<GoalWithSubmissionsModel>> {
        ctx.require(Capability::ManageOwnGoals)?;
        let user_id = ctx.user_id;

        let goals = self.goal_repo.list_by_owner(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "goals: failed to list goals");
            UseCaseError::Internal(err)
        })?;
        if goals.is_empty() {
            return Ok(Vec::new());
        }

        let goal_ids = goals.iter().map(|goal| goal.id).collect::<Vec<_>>();
        let submissions = self
            .submission_repo
            .list_by_goals(goal_ids)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "goals: failed to load submissions");
                UseCaseError::Internal(err)
            })?;

        let mut by_goal: HashMap<Uuid, Vec<SubmissionModel>> = HashMap::new();
        for submission in submissions {
            by_goal
                .entry(submission.goal_id)
                .or_default()
                .push(SubmissionModel::from(submission));
        }

        info!(%user_id, goal_count = goals.len(), "goals: listed");
        Ok(goals
            .into_iter()
            .map(|goal| {
                let submissions = by_goal.remove(&goal.id).unwrap_or_default();
                GoalWithSubmissionsModel {
                    goal: GoalModel::from(goal),
                    submissions,
                }
            })
            .collect())
    }

    pub async fn get(&self, ctx: &RequestContext, goal_id: Uuid) -> UseCaseResult<GoalDetailModel> {
        ctx.require(Capability::ManageOwnGoals)?;
        let user_id = ctx.user_id;

        let goal = self
            .goal_repo
            .find_by_id(goal_id)
            .await
            .map_err(|err| {
                error!(%user_id, %goal_id, db_error = ?err, "goals: failed to load goal");
                UseCaseError::Internal(err)
            })?
            .filter(|goal| goal.user_id == user_id)
            .ok_or_else(|| {
                warn!(%user_id, %goal_id, status = 404, "goals: goal not found for owner");
                UseCaseError::NotFound("goal")
            })?;

        let submissions = self
            .submission_repo
            .list_by_goal(goal_id, SortOrder::Desc)
            .await
            .map_err(|err| {
                error!(%user_id, %goal_id, db_error = ?err, "goals: failed to load submissions");
                UseCaseError::Internal(err)
            })?;

        let latest_day = submissions
            .iter()
            .map(|submission| submission.submission_day)
            .max();
        let next_due_date = next_due_for_goal(
            goal.goal_status()?,
            goal.started_at,
            goal.end_date,
            goal.utc_offset_minutes,
            latest_day,
        );

        Ok(GoalDetailModel {
            goal: GoalModel::from(goal),
            submissions: submissions.into_iter().map(SubmissionModel::from).collect(),
            next_due_date,
        })
    }

    pub async fn start(
        &self,
        ctx: &RequestContext,
        goal_id: Uuid,
        request: StartGoalModel,
    ) -> UseCaseResult<GoalModel> {
        ctx.require(Capability::ManageOwnGoals)?;
        let user_id = ctx.user_id;

        let utc_offset_minutes = request.utc_offset_minutes.unwrap_or(0);
        if utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            warn!(%user_id, %goal_id, utc_offset_minutes, status = 400, "goals: invalid start offset");
            return Err(UseCaseError::Validation(format!(
                "utcOffsetMinutes must be within +/-{MAX_UTC_OFFSET_MINUTES}"
            )));
        }

        let goal = self
            .goal_repo
            .find_by_id(goal_id)
            .await
            .map_err(|err| {
                error!(%user_id, %goal_id, db_error = ?err, "goals: failed to load goal");
                UseCaseError::Internal(err)
            })?
            .filter(|goal| goal.user_id == user_id)
            .ok_or_else(|| {
                warn!(%user_id, %goal_id, status = 404, "goals: start on unknown goal");
                UseCaseError::NotFound("goal")
            })?;

        goal.goal_status()?.apply(GoalAction::Start).map_err(|err| {
            let err = UseCaseError::from(err);
            warn!(
                %user_id,
                %goal_id,
                status = err.status_code().as_u16(),
                error = %err,
                "goals: start rejected"
            );
            err
        })?;

        let started_at = Utc::now();
        let end_date = end_date_after(started_at, goal.duration_days).ok_or_else(|| {
            warn!(
                %user_id,
                %goal_id,
                duration_days = goal.duration_days,
                status = 400,
                "goals: end date out of range"
            );
            UseCaseError::Validation("durationDays is out of range".to_string())
        })?;

        let started = self
            .goal_repo
            .start(goal_id, user_id, started_at, end_date, utc_offset_minutes)
            .await
            .map_err(|err| {
                error!(%user_id, %goal_id, db_error = ?err, "goals: failed to start goal");
                UseCaseError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = UseCaseError::InvalidState("goal is no longer awaiting start".to_string());
                warn!(
                    %user_id,
                    %goal_id,
                    status = err.status_code().as_u16(),
                    "goals: goal changed before start"
                );
                err
            })?;

        info!(%user_id, %goal_id, %end_date, "goals: goal started");
        Ok(GoalModel::from(started))
    }
}
