use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    config::config_model::{DotEnvyConfig, Storage},
    infrastructure::{
        axum_http::{default_routers, routers},
        payments::{paypal_client::PaypalClient, stripe_client::StripeClient},
        postgres::postgres_connection::PgPoolSquad,
        storages::{
            SubmissionFileStorage,
            local::LocalFileStorage,
            s3::{S3FileStorage, S3StorageConfig},
        },
    },
};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let payment_timeout = Duration::from_secs(config.stripe.timeout_secs);
    let stripe = Arc::new(StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.api_base.clone(),
        payment_timeout,
    )?);
    let paypal = Arc::new(PaypalClient::new(
        config.paypal.client_id.clone(),
        config.paypal.client_secret.clone(),
        config.paypal.api_base.clone(),
        payment_timeout,
    )?);
    let storage = Arc::new(build_storage(&config.storage).await?);
    info!("Payment clients and file storage are ready");

    let mut app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/goals",
            routers::goals::routes(Arc::clone(&db_pool), Arc::clone(&stripe), Arc::clone(&config)),
        )
        .nest(
            "/api/v1/submissions",
            routers::submissions::routes(Arc::clone(&db_pool), Arc::clone(&storage)),
        )
        .nest(
            "/api/v1/instructor",
            routers::instructor::routes(Arc::clone(&db_pool), Arc::clone(&stripe)),
        )
        .nest("/api/v1/admin", routers::admin::routes(Arc::clone(&db_pool)))
        .nest("/api/v1/user", routers::users::routes(Arc::clone(&db_pool)))
        .nest(
            "/api/v1/paypal",
            routers::paypal::routes(Arc::clone(&paypal), Arc::clone(&config)),
        )
        .route("/api/v1/health-check", get(default_routers::health_check));

    // Local uploads are served back at UPLOAD_PUBLIC_BASE_URL, expected to end in /uploads.
    if let Storage::Local { upload_dir, .. } = &config.storage {
        app = app.nest_service("/uploads", ServeDir::new(upload_dir));
    }

    let app = app
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout)))
        .layer(RequestBodyLimitLayer::new(
            (config.server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn build_storage(storage: &Storage) -> Result<SubmissionFileStorage> {
    match storage {
        Storage::Local {
            upload_dir,
            public_base_url,
        } => {
            info!(upload_dir = %upload_dir.display(), "Submission files are stored locally");
            Ok(SubmissionFileStorage::Local(
                LocalFileStorage::new(upload_dir.clone(), public_base_url.clone()).await?,
            ))
        }
        Storage::S3(s3) => {
            info!(bucket = %s3.bucket, "Submission files are stored in s3");
            Ok(SubmissionFileStorage::S3(
                S3FileStorage::new(S3StorageConfig {
                    endpoint: s3.endpoint.clone(),
                    region: s3.region.clone(),
                    bucket: s3.bucket.clone(),
                    access_key: s3.access_key_id.clone(),
                    secret_key: s3.secret_access_key.clone(),
                    prefix: s3.prefix.clone(),
                    public_base_url: s3.public_base_url.clone(),
                    connect_timeout_secs: 10,
                    read_timeout_secs: 60,
                })
                .await?,
            ))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
