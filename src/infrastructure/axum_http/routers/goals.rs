use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    application::usecases::goals::GoalsUseCase,
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::{
            daily_submissions::DailySubmissionRepository, goals::GoalRepository,
            payment_gateways::PaymentGateway, users::UserRepository,
        },
        value_objects::goals::{CreateGoalModel, StartGoalModel},
    },
    infrastructure::{
        axum_http::{
            auth::AuthUser,
            extractors::{ApiJson, ApiPath, ApiQuery},
        },
        payments::stripe_client::StripeClient,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                daily_submissions::DailySubmissionPostgres, goals::GoalPostgres,
                users::UserPostgres,
            },
        },
    },
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    stripe: Arc<StripeClient>,
    config: Arc<DotEnvyConfig>,
) -> Router {
    let goal_repository = GoalPostgres::new(Arc::clone(&db_pool));
    let submission_repository = DailySubmissionPostgres::new(Arc::clone(&db_pool));
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));

    let usecase = GoalsUseCase::new(
        Arc::new(goal_repository),
        Arc::new(submission_repository),
        Arc::new(user_repository),
        stripe,
        config.stripe.currency.clone(),
    );

    Router::new()
        .route("/", post(create_goal).get(list_goals))
        .route("/:goal_id", get(get_goal))
        .route("/:goal_id/start", post(start_goal))
        .with_state(Arc::new(usecase))
}

pub async fn create_goal<G, S, U, Gw>(
    State(usecase): State<Arc<GoalsUseCase<G, S, U, Gw>>>,
    auth: AuthUser,
    ApiJson(request): ApiJson<CreateGoalModel>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    info!(user_id = %auth.user_id, "goals: create request received");

    match usecase.create(&auth.to_context(), request).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn list_goals<G, S, U, Gw>(
    State(usecase): State<Arc<GoalsUseCase<G, S, U, Gw>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    match usecase.list(&auth.to_context()).await {
        Ok(goals) => Json(goals).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_goal<G, S, U, Gw>(
    State(usecase): State<Arc<GoalsUseCase<G, S, U, Gw>>>,
    auth: AuthUser,
    ApiPath(goal_id): ApiPath<Uuid>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    match usecase.get(&auth.to_context(), goal_id).await {
        Ok(goal) => Json(goal).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn start_goal<G, S, U, Gw>(
    State(usecase): State<Arc<GoalsUseCase<G, S, U, Gw>>>,
    auth: AuthUser,
    ApiPath(goal_id): ApiPath<Uuid>,
    ApiQuery(request): ApiQuery<StartGoalModel>,
) -> impl IntoResponse
where
    G: GoalRepository + Send + Sync + 'static,
    S: DailySubmissionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    info!(user_id = %auth.user_id, %goal_id, "goals: start request received");

    match usecase.start(&auth.to_context(), goal_id, request).await {
        Ok(goal) => Json(goal).into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::repositories::{
            daily_submissions::MockDailySubmissionRepository, goals::MockGoalRepository,
            payment_gateways::MockPaymentGateway, users::MockUserRepository,
        },
        infrastructure::axum_http::auth::SessionClaims,
    };
    use axum::{
        body::Body,
        http::{
            Request,
            header::{AUTHORIZATION, CONTENT_TYPE},
        },
        response::Response,
    };
    use jsonwebtoken::{EncodingKey, Header, encode};
    use tower::ServiceExt;

    const SECRET: &str = "supersecretjwtsecretforunittesting123";

    fn bearer() -> String {
        unsafe {
            std::env::set_var("JWT_SESSION_SECRET", SECRET);
        }
        let claims = SessionClaims {
            sub: Uuid::new_v4().to_string(),
            role: "STUDENT".to_string(),
            email: Some("student@example.com".to_string()),
            name: None,
            exp: 9999999999,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        format!("Bearer {token}")
    }

    /// Nothing reaches the repositories or the gateway here.
    fn app() -> Router {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_hold().never();

        let usecase = GoalsUseCase::new(
            Arc::new(MockGoalRepository::new()),
            Arc::new(MockDailySubmissionRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(gateway),
            "usd".to_string(),
        );

        Router::new()
            .route(
                "/",
                post(
                    create_goal::<
                        MockGoalRepository,
                        MockDailySubmissionRepository,
                        MockUserRepository,
                        MockPaymentGateway,
                    >,
                ),
            )
            .route(
                "/:goal_id/start",
                post(
                    start_goal::<
                        MockGoalRepository,
                        MockDailySubmissionRepository,
                        MockUserRepository,
                        MockPaymentGateway,
                    >,
                ),
            )
            .with_state(Arc::new(usecase))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn malformed_create_body_is_a_400_json_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(AUTHORIZATION, bearer())
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"Run","durationDays":"seven"}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[CONTENT_TYPE].to_str().unwrap(),
            "application/json"
        );
        let body = body_json(response).await;
        assert_eq!(body["code"], 400);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn non_uuid_goal_id_is_a_400_json_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/not-a-goal/start")
            .header(AUTHORIZATION, bearer())
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], 400);
    }

    #[tokio::test]
    async fn non_numeric_start_offset_is_a_400_json_error() {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/{}/start?utcOffsetMinutes=east", Uuid::new_v4()))
            .header(AUTHORIZATION, bearer())
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], 400);
    }
}
