use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use storage::Database;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod app_state;
mod config;
mod error;
mod features;
mod middleware;
mod notifier;
mod qr;
mod stripe;

use app_state::AppState;
use config::Config;
use notifier::Notifier;
use stripe::StripeClient;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::events::handlers::list_events,
        features::events::handlers::list_my_events,
        features::events::handlers::get_event,
        features::events::handlers::create_event,
        features::events::handlers::save_draft,
        features::events::handlers::update_event,
        features::events::handlers::publish_event,
        features::events::handlers::cancel_event,
        features::events::handlers::join_event,
        features::events::handlers::leave_event,
        features::events::handlers::check_in,
        features::events::handlers::get_participants,
        features::events::handlers::get_ticket,
        features::payments::handlers::checkout,
        features::payments::handlers::webhook,
    ),
    components(
        schemas(
            storage::dto::event::CreateEventRequest,
            storage::dto::event::UpdateEventRequest,
            storage::dto::event::EventResponse,
            storage::dto::participation::ParticipationResponse,
            storage::dto::participation::ParticipantDetail,
            storage::dto::participation::CheckInRequest,
            storage::dto::participation::CheckInResponse,
            storage::dto::participation::TicketResponse,
            storage::dto::payment::CheckoutRequest,
            storage::dto::payment::CheckoutResponse,
            storage::dto::common::PaginationMeta,
            storage::dto::common::PaginatedResponse<storage::dto::event::EventResponse>,
            storage::models::Event,
            storage::models::EventStatus,
            storage::models::EventCategory,
            storage::models::Participation,
            storage::models::ParticipationStatus,
            storage::models::Payment,
            storage::models::PaymentStatus,
        )
    ),
    tags(
        (name = "events", description = "Event lifecycle endpoints"),
        (name = "participation", description = "Join, leave, tickets and check-in"),
        (name = "payments", description = "Paid-seat checkout and provider webhooks"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "auth_proxy",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(
                            middleware::auth::USER_ID_HEADER,
                        ),
                    ),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting Blizko API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let notifier = Notifier::spawn(config.notify_url.clone());
    let stripe = StripeClient::new(config.stripe_secret_key.clone());

    let bind_address = format!("{}:{}", config.host, config.port);

    let state = AppState {
        db,
        notifier,
        stripe,
        config: Arc::new(config),
    };

    let app = Router::new()
        .nest("/api/events", features::events::routes::routes())
        .nest("/api/payments", features::payments::routes::routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(middleware::auth::authenticate))
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .context("Failed to bind server address")?;

    axum::serve(listener, app).await?;

    Ok(())
}
