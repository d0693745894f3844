use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::application::usecases::errors::UseCaseError;

/// `Json` whose rejection is a 400 `{code, message}` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejection is a 400 `{code, message}` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

/// `Multipart` whose rejection is a 400 `{code, message}` body.
pub struct ApiMultipart(pub Multipart);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = UseCaseError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                warn!(status = 400, error = %rejection.body_text(), "http: invalid json body");
                UseCaseError::Validation(rejection.body_text())
            })?;
        Ok(ApiJson(value))
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = UseCaseError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                warn!(status = 400, error = %rejection.body_text(), "http: invalid path parameter");
                UseCaseError::Validation(rejection.body_text())
            })?;
        Ok(ApiPath(value))
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = UseCaseError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                warn!(status = 400, error = %rejection.body_text(), "http: invalid query string");
                UseCaseError::Validation(rejection.body_text())
            })?;
        Ok(ApiQuery(value))
    }
}

#[async_trait]
impl<S> FromRequest<S> for ApiMultipart
where
    S: Send + Sync,
{
    type Rejection = UseCaseError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| {
                warn!(status = 400, error = %rejection.body_text(), "http: invalid multipart body");
                UseCaseError::Validation(rejection.body_text())
            })?;
        Ok(ApiMultipart(multipart))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header::CONTENT_TYPE},
        response::{IntoResponse, Response},
        routing::post,
    };
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    struct Echo {
        name: String,
    }

    async fn echo(ApiPath(id): ApiPath<Uuid>, ApiJson(body): ApiJson<Echo>) -> impl IntoResponse {
        format!("{id}:{}", body.name)
    }

    fn app() -> Router {
        Router::new().route("/items/:id", post(echo))
    }

    async fn send(uri: &str, content_type: Option<&str>, body: &str) -> Response {
        let mut builder = axum::http::Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        app()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn well_formed_request_passes_through() {
        let id = Uuid::new_v4();
        let response = send(
            &format!("/items/{id}"),
            Some("application/json"),
            r#"{"name":"ok"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_body_is_a_json_validation_error() {
        let uri = format!("/items/{}", Uuid::new_v4());

        for (content_type, body) in [
            (Some("application/json"), r#"{"name":"#),
            (Some("application/json"), r#"{"name":7}"#),
            (None, r#"{"name":"ok"}"#),
        ] {
            let response = send(&uri, content_type, body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                response.headers()[CONTENT_TYPE].to_str().unwrap(),
                "application/json"
            );
            assert_eq!(body_json(response).await["code"], 400);
        }
    }

    #[tokio::test]
    async fn non_uuid_path_is_a_json_validation_error() {
        let response = send("/items/not-a-uuid", Some("application/json"), r#"{"name":"ok"}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], 400);
        assert!(body["message"].is_string());
    }
}
