use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    application::usecases::admin::AdminUseCase,
    domain::{
        repositories::{
            goals::GoalRepository, payments::PaymentRepository, users::UserRepository,
        },
        value_objects::{
            goals::AdminUpdateGoalModel,
            users::{AdminUpdateUserModel, RenameUserModel},
        },
    },
    infrastructure::{
        axum_http::{
            auth::AuthUser,
            extractors::{ApiJson, ApiPath},
        },
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{goals::GoalPostgres, payments::PaymentPostgres, users::UserPostgres},
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let usecase = AdminUseCase::new(
        Arc::new(GoalPostgres::new(Arc::clone(&db_pool))),
        Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PaymentPostgres::new(Arc::clone(&db_pool))),
    );

    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:user_id",
            get(get_user)
                .put(update_user)
                .patch(rename_user)
                .delete(delete_user),
        )
        .route("/goals", get(list_goals))
        .route(
            "/goals/:goal_id",
            get(get_goal).put(update_goal).delete(delete_goal),
        )
        .with_state(Arc::new(usecase))
}

pub async fn list_users<G, U, P>(
    State(usecase): State<Arc<AdminUseCase<G, U, P>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
{
    match usecase.list_users(&auth.to_context()).await {
        Ok(users) => Json(users).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_user<G, U, P>(
    State(usecase): State<Arc<AdminUseCase<G, U, P>>>,
    auth: AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
{
    match usecase.get_user(&auth.to_context(), user_id).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn update_user<G, U, P>(
    State(usecase): State<Arc<AdminUseCase<G, U, P>>>,
    auth: AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<AdminUpdateUserModel>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
{
    info!(admin_id = %auth.user_id, %user_id, "admin: update user request received");

    match usecase
        .update_user(&auth.to_context(), user_id, request)
        .await
    {
        Ok(user) => Json(user).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn rename_user<G, U, P>(
    State(usecase): State<Arc<AdminUseCase<G, U, P>>>,
    auth: AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<RenameUserModel>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
{
    match usecase
        .rename_user(&auth.to_context(), user_id, request)
        .await
    {
        Ok(user) => Json(user).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn delete_user<G, U, P>(
    State(usecase): State<Arc<AdminUseCase<G, U, P>>>,
    auth: AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
{
    info!(admin_id = %auth.user_id, %user_id, "admin: delete user request received");

    match usecase.delete_user(&auth.to_context(), user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn list_goals<G, U, P>(
    State(usecase): State<Arc<AdminUseCase<G, U, P>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
{
    match usecase.list_goals(&auth.to_context()).await {
        Ok(goals) => Json(goals).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_goal<G, U, P>(
    State(usecase): State<Arc<AdminUseCase<G, U, P>>>,
    auth: AuthUser,
    ApiPath(goal_id): ApiPath<Uuid>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
{
    match usecase.get_goal(&auth.to_context(), goal_id).await {
        Ok(goal) => Json(goal).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn update_goal<G, U, P>(
    State(usecase): State<Arc<AdminUseCase<G, U, P>>>,
    auth: AuthUser,
    ApiPath(goal_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<AdminUpdateGoalModel>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
{
    info!(admin_id = %auth.user_id, %goal_id, "admin: update goal request received");

    match usecase
        .update_goal(&auth.to_context(), goal_id, request)
        .await
    {
        Ok(goal) => Json(goal).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn delete_goal<G, U, P>(
    State(usecase): State<Arc<AdminUseCase<G, U, P>>>,
    auth: AuthUser,
    ApiPath(goal_id): ApiPath<Uuid>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
{
    info!(admin_id = %auth.user_id, %goal_id, "admin: delete goal request received");

    match usecase.delete_goal(&auth.to_context(), goal_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
