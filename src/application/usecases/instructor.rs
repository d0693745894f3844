use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::errors::{UseCaseError, UseCaseResult},
    domain::{
        repositories::{
            daily_submissions::DailySubmissionRepository, goals::GoalRepository,
            payment_gateways::PaymentGateway, payments::PaymentRepository,
            users::UserRepository,
        },
        value_objects::{
            enums::{
                goal_statuses::GoalStatus,
                payment_statuses::Settlement,
                roles::Capability,
                sort_order::SortOrder,
                submission_statuses::SubmissionStatus,
            },
            goal_lifecycle::{GoalAction, GoalOutcome},
            goals::{
                AssignGoalModel, FinalizeGoalModel, GoalModel, InstructorGoalDetailModel,
                InstructorGoalModel,
            },
            iam::RequestContext,
            payments::idempotency_key,
            submission_review::ReviewDecision,
            submissions::{
                PendingSubmissionGoalModel, PendingSubmissionModel, ReviewSubmissionModel,
                SubmissionModel,
            },
            users::{UserSummaryModel, insert_entity_from_context},
        },
    },
};

const ACCEPT_ACTION: &str = "accept";

pub struct InstructorUseCase<G, S, P, U, Gw>
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    goal_repo: Arc<G>,
    submission_repo: Arc<S>,
    payment_repo: Arc<P>,
    user_repo: Arc<U>,
    gateway: Arc<Gw>,
}

impl<G, S, P, U, Gw> InstructorUseCase<G, S, P, U, Gw>
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        goal_repo: Arc<G>,
        submission_repo: Arc<S>,
        payment_repo: Arc<P>,
        user_repo: Arc<U>,
        gateway: Arc<Gw>,
    ) -> Self {
        Self {
            goal_repo,
            submission_repo,
            payment_repo,
            user_repo,
            gateway,
        }
    }

    pub async fn pending_goals(
        &self,
        ctx: &RequestContext,
    ) -> UseCaseResult<Vec<InstructorGoalModel>> {
        ctx.require(Capability::Instruct)?;
        let instructor_id = ctx.user_id;

        let goals = self
            .goal_repo
            .list_pending_assignment(instructor_id)
            .await
            .map_err(|err| {
                error!(%instructor_id, db_error = ?err, "instructor: failed to list pending goals");
                UseCaseError::Internal(err)
            })?;

        info!(%instructor_id, goal_count = goals.len(), "instructor: pending goals listed");
        Ok(goals
            .into_iter()
            .map(|(goal, owner)| InstructorGoalModel {
                goal: GoalModel::from(goal),
                user: UserSummaryModel::from(owner),
            })
            .collect())
    }

    pub async fn assigned_goals(
        &self,
        ctx: &RequestContext,
    ) -> UseCaseResult<Vec<InstructorGoalModel>> {
        ctx.require(Capability::Instruct)?;
        let instructor_id = ctx.user_id;

        let goals = self
            .goal_repo
            .list_assigned_to(instructor_id)
            .await
            .map_err(|err| {
                error!(%instructor_id, db_error = ?err, "instructor: failed to list assigned goals");
                UseCaseError::Internal(err)
            })?;

        Ok(goals
            .into_iter()
            .map(|(goal, owner)| InstructorGoalModel {
                goal: GoalModel::from(goal),
                user: UserSummaryModel::from(owner),
            })
            .collect())
    }

    /// Claims a goal awaiting assignment. The write only lands if the goal is
    /// still unclaimed, so two instructors racing for it cannot both win.
    pub async fn accept(
        &self,
        ctx: &RequestContext,
        goal_id: Uuid,
        request: AssignGoalModel,
    ) -> UseCaseResult<GoalModel> {
        ctx.require(Capability::Instruct)?;
        let instructor_id = ctx.user_id;

        if request.action.as_deref().map(str::trim) != Some(ACCEPT_ACTION) {
            let err = UseCaseError::Validation("action must be \"accept\"".to_string());
            warn!(
                %instructor_id,
                %goal_id,
                status = err.status_code().as_u16(),
                "instructor: unknown goal action"
            );
            return Err(err);
        }

        let goal = self
            .goal_repo
            .find_by_id(goal_id)
            .await
            .map_err(|err| {
                error!(%instructor_id, %goal_id, db_error = ?err, "instructor: failed to load goal");
                UseCaseError::Internal(err)
            })?
            .ok_or(UseCaseError::NotFound("goal"))?;

        goal.goal_status()?.apply(GoalAction::Assign).map_err(|err| {
            let err = UseCaseError::from(err);
            warn!(
                %instructor_id,
                %goal_id,
                status = err.status_code().as_u16(),
                error = %err,
                "instructor: goal is not awaiting assignment"
            );
            err
        })?;

        if goal.user_id == instructor_id {
            let err = UseCaseError::SelfAssignment;
            warn!(
                %instructor_id,
                %goal_id,
                status = err.status_code().as_u16(),
                "instructor: attempted to claim own goal"
            );
            return Err(err);
        }

        let seed = insert_entity_from_context(ctx).ok_or_else(|| {
            let err = UseCaseError::Validation("session has no email address".to_string());
            warn!(
                %instructor_id,
                status = err.status_code().as_u16(),
                "instructor: cannot seed instructor row"
            );
            err
        })?;
        self.user_repo.ensure_exists(seed).await.map_err(|err| {
            error!(%instructor_id, db_error = ?err, "instructor: failed to ensure instructor row");
            UseCaseError::Internal(err)
        })?;

        let assigned = self
            .goal_repo
            .assign_instructor(goal_id, instructor_id)
            .await
            .map_err(|err| {
                error!(%instructor_id, %goal_id, db_error = ?err, "instructor: failed to assign goal");
                UseCaseError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = UseCaseError::InvalidState("goal was already claimed".to_string());
                warn!(
                    %instructor_id,
                    %goal_id,
                    status = err.status_code().as_u16(),
                    "instructor: lost race for goal"
                );
                err
            })?;

        info!(%instructor_id, %goal_id, "instructor: goal assigned");
        Ok(GoalModel::from(assigned))
    }

    /// Settles the stake with the gateway first and then records payment and
    /// goal status together. A gateway failure changes nothing.
    pub async fn finalize(
        &self,
        ctx: &RequestContext,
        goal_id: Uuid,
        request: FinalizeGoalModel,
    ) -> UseCaseResult<GoalModel> {
        ctx.require(Capability::Instruct)?;
        let instructor_id = ctx.user_id;

        let outcome = request
            .status
            .as_deref()
            .map(str::trim)
            .and_then(GoalStatus::from_str)
            .and_then(GoalOutcome::from_status)
            .ok_or_else(|| {
                UseCaseError::Validation("status must be COMPLETED or FAILED".to_string())
            })?;

        let goal = self
            .goal_repo
            .find_by_id(goal_id)
            .await
            .map_err(|err| {
                error!(%instructor_id, %goal_id, db_error = ?err, "instructor: failed to load goal");
                UseCaseError::Internal(err)
            })?
            .ok_or(UseCaseError::NotFound("goal"))?;

        if goal.instructor_id != Some(instructor_id) {
            let err = UseCaseError::Forbidden("only the assigned instructor can finalize".to_string());
            warn!(
                %instructor_id,
                %goal_id,
                status = err.status_code().as_u16(),
                "instructor: finalize by non-assigned instructor"
            );
            return Err(err);
        }

        goal.goal_status()?.apply(outcome.action()).map_err(|err| {
            let err = UseCaseError::from(err);
            warn!(
                %instructor_id,
                %goal_id,
                status = err.status_code().as_u16(),
                error = %err,
                "instructor: goal cannot be finalized"
            );
            err
        })?;

        let payment = self
            .payment_repo
            .find_by_goal_id(goal_id)
            .await
            .map_err(|err| {
                error!(%instructor_id, %goal_id, db_error = ?err, "instructor: failed to load payment");
                UseCaseError::Internal(err)
            })?
            .ok_or_else(|| {
                error!(%instructor_id, %goal_id, "instructor: active goal has no payment");
                UseCaseError::PaymentState("goal has no payment to settle".to_string())
            })?;

        let settlement = outcome.settlement();
        let settled_status = payment
            .payment_status()?
            .settle(settlement)
            .ok_or_else(|| {
                error!(
                    %instructor_id,
                    %goal_id,
                    payment_status = %payment.status,
                    "instructor: payment is not held"
                );
                UseCaseError::PaymentState(format!("payment is {} instead of HELD", payment.status))
            })?;

        let key = idempotency_key(goal_id, settlement.as_str());
        let charge_id = payment.stripe_charge_id.clone();
        let gateway_result = match settlement {
            Settlement::Refund => self.gateway.refund(charge_id, key).await,
            Settlement::Capture => self.gateway.capture(charge_id, key).await,
        };
        gateway_result.map_err(|err| {
            let mapped = UseCaseError::from_gateway(err);
            error!(
                %instructor_id,
                %goal_id,
                settlement = settlement.as_str(),
                status = mapped.status_code().as_u16(),
                error = %mapped,
                "instructor: gateway settlement failed"
            );
            mapped
        })?;

        let settled = self
            .goal_repo
            .settle(goal_id, outcome.status().to_string(), settled_status.to_string())
            .await
            .map_err(|err| {
                error!(
                    %instructor_id,
                    %goal_id,
                    settlement = settlement.as_str(),
                    db_error = ?err,
                    "instructor: gateway settled but database update failed"
                );
                UseCaseError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = UseCaseError::InvalidState("goal was already finalized".to_string());
                warn!(
                    %instructor_id,
                    %goal_id,
                    status = err.status_code().as_u16(),
                    "instructor: goal changed during finalize"
                );
                err
            })?;

        info!(
            %instructor_id,
            %goal_id,
            goal_status = %outcome.status(),
            payment_status = %settled_status,
            "instructor: goal finalized"
        );
        Ok(GoalModel::from(settled))
    }

    pub async fn goal_submissions(
        &self,
        ctx: &RequestContext,
        goal_id: Uuid,
    ) -> UseCaseResult<InstructorGoalDetailModel> {
        ctx.require(Capability::Instruct)?;
        let instructor_id = ctx.user_id;

        let (goal, owner) = self
            .goal_repo
            .find_with_owner(goal_id)
            .await
            .map_err(|err| {
                error!(%instructor_id, %goal_id, db_error = ?err, "instructor: failed to load goal");
                UseCaseError::Internal(err)
            })?
            .ok_or(UseCaseError::NotFound("goal"))?;

        if goal.instructor_id != Some(instructor_id) {
            warn!(%instructor_id, %goal_id, status = 403, "instructor: goal not assigned to caller");
            return Err(UseCaseError::Forbidden(
                "goal is not assigned to you".to_string(),
            ));
        }

        let submissions = self
            .submission_repo
            .list_by_goal(goal_id, SortOrder::Asc)
            .await
            .map_err(|err| {
                error!(%instructor_id, %goal_id, db_error = ?err, "instructor: failed to load submissions");
                UseCaseError::Internal(err)
            })?;

        Ok(InstructorGoalDetailModel {
            goal: GoalModel::from(goal),
            user: UserSummaryModel::from(owner),
            submissions: submissions.into_iter().map(SubmissionModel::from).collect(),
        })
    }

    pub async fn pending_submissions(
        &self,
        ctx: &RequestContext,
    ) -> UseCaseResult<Vec<PendingSubmissionModel>> {
        ctx.require(Capability::Instruct)?;
        let instructor_id = ctx.user_id;

        let rows = self
            .submission_repo
            .list_pending_for_instructor(instructor_id)
            .await
            .map_err(|err| {
                error!(%instructor_id, db_error = ?err, "instructor: failed to list pending submissions");
                UseCaseError::Internal(err)
            })?;

        Ok(rows
            .into_iter()
            .map(|(submission, goal, owner)| PendingSubmissionModel {
                submission: SubmissionModel::from(submission),
                goal: PendingSubmissionGoalModel {
                    id: goal.id,
                    title: goal.title,
                    user: UserSummaryModel::from(owner),
                },
            })
            .collect())
    }

    pub async fn review(
        &self,
        ctx: &RequestContext,
        submission_id: Uuid,
        request: ReviewSubmissionModel,
    ) -> UseCaseResult<SubmissionModel> {
        ctx.require(Capability::Instruct)?;
        let instructor_id = ctx.user_id;

        let decision = ReviewDecision::parse(
            request.status.as_deref(),
            request.reviewer_comment.as_deref(),
        )
        .map_err(|message| {
            let err = UseCaseError::Validation(message);
            warn!(
                %instructor_id,
                %submission_id,
                status = err.status_code().as_u16(),
                error = %err,
                "instructor: invalid review"
            );
            err
        })?;

        let submission = self
            .submission_repo
            .find_by_id(submission_id)
            .await
            .map_err(|err| {
                error!(%instructor_id, %submission_id, db_error = ?err, "instructor: failed to load submission");
                UseCaseError::Internal(err)
            })?
            .ok_or(UseCaseError::NotFound("submission"))?;

        let goal = self
            .goal_repo
            .find_by_id(submission.goal_id)
            .await
            .map_err(|err| {
                error!(%instructor_id, %submission_id, db_error = ?err, "instructor: failed to load goal");
                UseCaseError::Internal(err)
            })?
            .ok_or(UseCaseError::NotFound("goal"))?;

        if goal.instructor_id != Some(instructor_id) {
            let err = UseCaseError::Forbidden("only the assigned instructor can review".to_string());
            warn!(
                %instructor_id,
                %submission_id,
                status = err.status_code().as_u16(),
                "instructor: review by non-assigned instructor"
            );
            return Err(err);
        }

        if submission.submission_status()? != SubmissionStatus::Pending {
            let err = UseCaseError::InvalidState("submission was already reviewed".to_string());
            warn!(
                %instructor_id,
                %submission_id,
                status = err.status_code().as_u16(),
                "instructor: submission already reviewed"
            );
            return Err(err);
        }

        let reviewed = self
            .submission_repo
            .review(submission_id, decision.to_entity(instructor_id, Utc::now()))
            .await
            .map_err(|err| {
                error!(%instructor_id, %submission_id, db_error = ?err, "instructor: failed to record review");
                UseCaseError::Internal(err)
            })?
            .ok_or_else(|| UseCaseError::InvalidState("submission was already reviewed".to_string()))?;

        info!(
            %instructor_id,
            %submission_id,
            decision = %decision.status(),
            "instructor: submission reviewed"
        );
        Ok(SubmissionModel::from(reviewed))
    }
}
