use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use course_booking_api::application::schema_service::SchemaService;
use course_booking_api::infrastructure::config::{ConfigService, config_path_from_env};
use course_booking_api::infrastructure::logging::init_logging;
use course_booking_api::presentation::handlers::{AppState, not_found};
use course_booking_api::presentation::middleware::{
    JwtAuthMiddleware, RequestIdMiddleware, TimingMiddleware,
};
use course_booking_api::presentation::routes::configure_routes;
use std::sync::Arc;
use tracing::{error, info, instrument};

#[tokio::main]
#[instrument]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    init_logging();
    info!("Logging initialized successfully");

    let schema_service = match SchemaService::bundled() {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!(error = %e, "Failed to compile JSON schemas");
            return Err(std::io::Error::other(e.to_string()));
        }
    };
    info!("JSON schemas compiled");

    let config_service = ConfigService::new(config_path_from_env(), schema_service.clone());
    let config = config_service.get_configuration().await.clone();
    info!(path = %config_service.path().display(), "Configuration ready");

    let jwt_secret = config.jwt.clone();
    let state = web::Data::new(AppState::in_memory(jwt_secret.clone(), schema_service));
    info!("Application state initialized");

    let server = HttpServer::new(move || {
        tracing::trace!("Creating new application instance");
        let cors = Cors::default()
            .allowed_origin_fn(|_, _| true)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(JwtAuthMiddleware::new(jwt_secret.clone()))
            .wrap(cors)
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .service(web::scope("/api/v1").configure(configure_routes))
            .default_service(web::to(not_found))
    });

    let (host, port) = config.bind_address();
    info!(host = %host, port = port, "Binding server to address");
    let server = server.bind((host.as_str(), port))?;

    info!(host = %host, port = port, "Starting HTTP server");
    server.run().await
}
