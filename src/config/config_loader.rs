use anyhow::{Context, Result, bail};

use super::config_model::{
    Auth, Database, DotEnvyConfig, Paypal, S3, Server, Storage, Stripe,
};

const PAYPAL_SANDBOX: &str = "https://api-m.sandbox.paypal.com";
const STRIPE_API: &str = "https://api.stripe.com";

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: required("SERVER_PORT")?
            .parse()
            .context("SERVER_PORT is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: optional("DATABASE_MAX_CONNECTIONS")
            .map(|value| value.parse::<u32>())
            .transpose()
            .context("DATABASE_MAX_CONNECTIONS is invalid")?
            .unwrap_or(10),
    };

    let auth = get_auth()?;

    let stripe = Stripe {
        secret_key: required("STRIPE_SECRET_KEY")?,
        currency: optional("STRIPE_CURRENCY")
            .unwrap_or_else(|| "usd".to_string())
            .to_lowercase(),
        api_base: optional("STRIPE_API_BASE").unwrap_or_else(|| STRIPE_API.to_string()),
        timeout_secs: optional("PAYMENT_HTTP_TIMEOUT")
            .map(|value| value.parse::<u64>())
            .transpose()
            .context("PAYMENT_HTTP_TIMEOUT is invalid")?
            .unwrap_or(15),
    };

    let paypal = Paypal {
        client_id: required("PAYPAL_CLIENT_ID")?,
        client_secret: required("PAYPAL_CLIENT_SECRET")?,
        api_base: optional("PAYPAL_API_BASE").unwrap_or_else(|| PAYPAL_SANDBOX.to_string()),
    };

    let storage = load_storage()?;

    Ok(DotEnvyConfig {
        server,
        database,
        auth,
        stripe,
        paypal,
        storage,
    })
}

/// Only the token secret, for the request extractor.
pub fn get_auth() -> Result<Auth> {
    dotenvy::dotenv().ok();

    Ok(Auth {
        jwt_secret: required("JWT_SESSION_SECRET")?,
    })
}

fn load_storage() -> Result<Storage> {
    let kind = optional("FILE_STORAGE").unwrap_or_else(|| "local".to_string());

    match kind.to_lowercase().as_str() {
        "local" => Ok(Storage::Local {
            upload_dir: optional("UPLOAD_DIR")
                .unwrap_or_else(|| "uploads".to_string())
                .into(),
            public_base_url: required("UPLOAD_PUBLIC_BASE_URL")?,
        }),
        "s3" => Ok(Storage::S3(S3 {
            endpoint: required("S3_ENDPOINT")?,
            region: required("S3_REGION")?,
            bucket: required("S3_BUCKET")?,
            access_key_id: required("S3_ACCESS_KEY_ID")?,
            secret_access_key: required("S3_SECRET_ACCESS_KEY")?,
            prefix: optional("S3_PREFIX").unwrap_or_else(|| "submissions".to_string()),
            public_base_url: required("S3_PUBLIC_BASE_URL")?,
        })),
        other => bail!("FILE_STORAGE must be `local` or `s3`, got `{other}`"),
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} is invalid"))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
