//! photo-cascade -- Lambda function run for S3 object removal events.
//!
//! Configuration, the S3 client and the database pool are built once per
//! process and reused by every invocation the runtime delivers.

use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::info;

use photo_cascade::config::{Config, LogFormat};
use photo_cascade::metadata::postgres::{create_pool, PostgresPhotoStore};
use photo_cascade::storage::aws::S3DerivedStore;
use photo_cascade::{CascadeHandler, S3Event};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_env()?;
    init_tracing(&config);

    photo_cascade::metrics::describe_metrics();

    let storage = S3DerivedStore::connect(
        config.resized_photos_bucket.clone(),
        config.s3_endpoint_url.clone(),
        config.s3_force_path_style,
    )
    .await;

    let database = config.database();
    let pool = create_pool(&database)?;
    info!(
        "Photo metadata pool configured: host={} port={} db={} max_connections={}",
        database.host, database.port, database.name, database.max_connections
    );
    let metadata = PostgresPhotoStore::new(pool, database.idle_timeout);

    let handler = CascadeHandler::new(Arc::new(storage), Arc::new(metadata));

    lambda_runtime::run(service_fn(|event: LambdaEvent<S3Event>| {
        invoke(event, &handler)
    }))
    .await
}

/// Run the cascade for one invocation.  Skipped keys answer `null`.
async fn invoke(
    event: LambdaEvent<S3Event>,
    handler: &CascadeHandler,
) -> Result<Option<String>, Error> {
    let (payload, context) = event.into_parts();
    info!(request_id = %context.request_id, "Invocation started");

    let outcome = handler.handle(&payload).await?;
    Ok(outcome.message())
}

/// Install the tracing subscriber.  `RUST_LOG` takes precedence over
/// `LOG_LEVEL`.
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}
