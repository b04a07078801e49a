use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use scribe_api::auth::TokenService;
use scribe_api::config::{AppConfig, Environment};
use scribe_api::email::{Mailer, MockMailer, SmtpMailer};
use scribe_api::handlers;
use scribe_api::kv::VerificationStore;
use scribe_api::middleware::require_auth;
use scribe_api::services::{
    ArticleService, AuthService, CategoryService, CommentService, UploadService,
};
use scribe_api::state::AppState;
use scribe_api::storage::{ObjectStore, S3ObjectStore};

// Multipart overhead on top of the 10 MiB image cap
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // Production log collectors choke on ANSI escapes; keep colors for
    // local development only.
    let subscriber = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    match config.server.environment {
        Environment::Production => subscriber.with_ansi(false).init(),
        Environment::Development => subscriber.init(),
    }

    // Lazy pool: the first query connects, so a database that is still coming
    // up does not prevent the server from binding its port.
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_lazy(&config.database.url)?;

    let tokens = Arc::new(TokenService::new(&config.jwt)?);
    let verification = VerificationStore::new(&config.redis)?;

    let mailer: Arc<dyn Mailer> = if config.smtp.password.is_empty() {
        tracing::warn!("SMTP_PASSWORD not set; verification emails will only be logged");
        Arc::new(MockMailer)
    } else {
        Arc::new(SmtpMailer::new(&config.smtp)?)
    };

    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(config.object_store.clone()));

    let state = AppState {
        pool: pool.clone(),
        tokens: tokens.clone(),
        auth: AuthService::new(pool.clone(), tokens.clone(), verification, mailer),
        articles: ArticleService::new(pool.clone()),
        comments: CommentService::new(pool.clone()),
        categories: CategoryService::new(pool),
        uploads: UploadService::new(store),
    };

    let app = router(state, tokens);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.server.port)).await?;
    tracing::info!(port = config.server.port, "scribe-api listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: AppState, tokens: Arc<TokenService>) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/verification-code", post(handlers::auth::send_verification_code))
        .route("/auth/verify-code", post(handlers::auth::verify_code))
        .route("/articles", get(handlers::articles::list))
        .route("/articles/top/views", get(handlers::articles::top_by_views))
        .route("/articles/:id", get(handlers::articles::get))
        .route("/articles/:id/comments", get(handlers::comments::list_by_article))
        .route("/categories", get(handlers::categories::list))
        .route("/categories/:id", get(handlers::categories::get));

    let guarded = Router::new()
        .route("/auth/profile", get(handlers::auth::profile))
        .route("/articles", post(handlers::articles::create))
        .route(
            "/articles/:id",
            put(handlers::articles::update).delete(handlers::articles::delete),
        )
        .route("/comments", post(handlers::comments::create))
        .route(
            "/comments/:id",
            put(handlers::comments::update).delete(handlers::comments::delete),
        )
        .route("/categories", post(handlers::categories::create))
        .route(
            "/categories/:id",
            put(handlers::categories::update).delete(handlers::categories::delete),
        )
        .route(
            "/upload/image",
            post(handlers::upload::upload_image).delete(handlers::upload::delete_image),
        )
        .route_layer(from_fn_with_state(tokens, require_auth));

    public
        .merge(guarded)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

// Last-resort net under the handlers: a panic still answers with the
// standard error shape instead of a dropped connection.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(%detail, "request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "code": 500, "message": "Internal Server Error" })),
    )
        .into_response()
}
