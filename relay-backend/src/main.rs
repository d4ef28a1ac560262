mod config;
mod routes;
mod upstream;

use anyhow::Context as _;
use axum::http::HeaderValue;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = config::Config::from_env()?;
    log::info!("Starting relay with {config:?}");

    let allowed_origin = HeaderValue::from_str(&config.allowed_origin)
        .with_context(|| format!("RELAY_ALLOWED_ORIGIN={:?}", config.allowed_origin))?;
    let backend = upstream::OpenAiCompatible::new(&config)?;
    let app = routes::build_app(backend, allowed_origin);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("could not bind {}", config.bind))?;
    log::info!("Listening on {}", config.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
