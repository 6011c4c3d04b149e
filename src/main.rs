mod cache;
mod config;
mod fetcher;
mod handlers;
mod i18n;
mod loader;
mod locale;
mod merge;
mod metrics;
mod models;
#[cfg(test)]
mod test_support;

use crate::config::LoaderConfig;
use crate::handlers::AppState;
use crate::loader::MessageLoader;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health_check,
        handlers::get_complete_messages,
        handlers::get_tier_messages,
        handlers::translate_key,
        handlers::revalidate,
        handlers::get_metrics,
        handlers::reset_metrics
    ),
    components(schemas(
        models::ApiError,
        models::EmptyApiResponse,
        models::MessagesApiResponse,
        models::MessagesPayload,
        models::TranslateQuery,
        models::TranslateResult,
        models::RevalidateRequest,
        models::RevalidateResult,
        models::HealthCheckResponse,
        metrics::MetricsSnapshot,
        locale::Locale,
        locale::Tier,
        config::RuntimeMode
    ))
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    dotenv::from_filename(format!("{}/.env.local", manifest_dir)).ok();
    dotenv::from_filename(format!("{}/.env", manifest_dir)).ok();
    dotenv::from_filename(".env.local").ok();
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_address = format!("{}:{}", host, port);

    let config = LoaderConfig::from_env();
    log::info!(
        "Message loader mode={} base_url={} public_dir={} source_dir={} revalidate={:?}",
        config.mode.as_str(),
        config.base_url,
        config.public_dir.display(),
        config.source_dir.display(),
        config.cache_ttl()
    );

    let state = Arc::new(AppState::new(MessageLoader::new(config)?));

    log::info!("Starting message service at http://{}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .wrap(cors)
            .service(SwaggerUi::new("/api/docs/{_:.*}").url("/api/openapi.json", ApiDoc::openapi()))
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
