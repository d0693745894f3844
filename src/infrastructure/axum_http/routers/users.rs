use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use tracing::info;

use crate::{
    application::usecases::users::UsersUseCase,
    domain::repositories::users::UserRepository,
    infrastructure::{
        axum_http::auth::AuthUser,
        postgres::{postgres_connection::PgPoolSquad, repositories::users::UserPostgres},
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let usecase = UsersUseCase::new(Arc::new(UserPostgres::new(Arc::clone(&db_pool))));

    Router::new()
        .route("/request-instructor", post(request_instructor))
        .with_state(Arc::new(usecase))
}

pub async fn request_instructor<U>(
    State(usecase): State<Arc<UsersUseCase<U>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
{
    info!(user_id = %auth.user_id, "users: instructor role requested");

    match usecase.request_instructor(&auth.to_context()).await {
        Ok(change) => Json(change).into_response(),
        Err(err) => err.into_response(),
    }
}
