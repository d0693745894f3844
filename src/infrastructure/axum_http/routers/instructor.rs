use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, patch, put},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    application::usecases::instructor::InstructorUseCase,
    domain::{
        repositories::{
            daily_submissions::DailySubmissionRepository, goals::GoalRepository,
            payment_gateways::PaymentGateway, payments::PaymentRepository,
            users::UserRepository,
        },
        value_objects::{
            goals::{AssignGoalModel, FinalizeGoalModel},
            submissions::ReviewSubmissionModel,
        },
    },
    infrastructure::{
        axum_http::{
            auth::AuthUser,
            extractors::{ApiJson, ApiPath},
        },
        payments::stripe_client::StripeClient,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                daily_submissions::DailySubmissionPostgres, goals::GoalPostgres,
                payments::PaymentPostgres, users::UserPostgres,
            },
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, stripe: Arc<StripeClient>) -> Router {
    let usecase = InstructorUseCase::new(
        Arc::new(GoalPostgres::new(Arc::clone(&db_pool))),
        Arc::new(DailySubmissionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PaymentPostgres::new(Arc::clone(&db_pool))),
        Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
        stripe,
    );

    Router::new()
        .route("/pending-goals", get(pending_goals))
        .route("/assigned-goals", get(assigned_goals))
        .route("/goals/:goal_id", put(accept_goal).patch(finalize_goal))
        .route("/goals/:goal_id/submissions", get(goal_submissions))
        .route("/submissions", get(pending_submissions))
        .route("/submissions/:submission_id", patch(review_submission))
        .with_state(Arc::new(usecase))
}

pub async fn pending_goals<G, S, P, U, Gw>(
    State(usecase): State<Arc<InstructorUseCase<G, S, P, U, Gw>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    match usecase.pending_goals(&auth.to_context()).await {
        Ok(goals) => Json(goals).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn assigned_goals<G, S, P, U, Gw>(
    State(usecase): State<Arc<InstructorUseCase<G, S, P, U, Gw>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    match usecase.assigned_goals(&auth.to_context()).await {
        Ok(goals) => Json(goals).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn accept_goal<G, S, P, U, Gw>(
    State(usecase): State<Arc<InstructorUseCase<G, S, P, U, Gw>>>,
    auth: AuthUser,
    ApiPath(goal_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<AssignGoalModel>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    info!(instructor_id = %auth.user_id, %goal_id, "instructor: accept request received");

    match usecase.accept(&auth.to_context(), goal_id, request).await {
        Ok(goal) => Json(goal).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn finalize_goal<G, S, P, U, Gw>(
    State(usecase): State<Arc<InstructorUseCase<G, S, P, U, Gw>>>,
    auth: AuthUser,
    ApiPath(goal_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<FinalizeGoalModel>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    info!(instructor_id = %auth.user_id, %goal_id, "instructor: finalize request received");

    match usecase.finalize(&auth.to_context(), goal_id, request).await {
        Ok(goal) => Json(goal).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn goal_submissions<G, S, P, U, Gw>(
    State(usecase): State<Arc<InstructorUseCase<G, S, P, U, Gw>>>,
    auth: AuthUser,
    ApiPath(goal_id): ApiPath<Uuid>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    match usecase.goal_submissions(&auth.to_context(), goal_id).await {
        Ok(detail) => Json(detail).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn pending_submissions<G, S, P, U, Gw>(
    State(usecase): State<Arc<InstructorUseCase<G, S, P, U, Gw>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    match usecase.pending_submissions(&auth.to_context()).await {
        Ok(submissions) => Json(submissions).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn review_submission<G, S, P, U, Gw>(
    State(usecase): State<Arc<InstructorUseCase<G, S, P, U, Gw>>>,
    auth: AuthUser,
    ApiPath(submission_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ReviewSubmissionModel>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    info!(instructor_id = %auth.user_id, %submission_id, "instructor: review request received");

    match usecase
        .review(&auth.to_context(), submission_id, request)
        .await
    {
        Ok(submission) => Json(submission).into_response(),
        Err(err) => err.into_response(),
    }
}
