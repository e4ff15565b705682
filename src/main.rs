use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use quizbank_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let admin_api = Router::new()
        .route(
            "/api/admin/blocks",
            get(routes::taxonomy::list_blocks).post(routes::taxonomy::create_block),
        )
        .route(
            "/api/admin/blocks/:id",
            delete(routes::taxonomy::delete_block),
        )
        .route(
            "/api/admin/disciplines",
            get(routes::taxonomy::list_disciplines).post(routes::taxonomy::create_discipline),
        )
        .route(
            "/api/admin/disciplines/:id",
            delete(routes::taxonomy::delete_discipline),
        )
        .route(
            "/api/admin/competences",
            get(routes::taxonomy::list_competences).post(routes::taxonomy::create_competence),
        )
        .route(
            "/api/admin/competences/:id",
            delete(routes::taxonomy::delete_competence),
        )
        .route(
            "/api/admin/questions",
            get(routes::question_routes::list_questions).post(routes::question_routes::create_question),
        )
        .route(
            "/api/admin/questions/import",
            post(routes::transfer::import_questions),
        )
        .route(
            "/api/admin/questions/:id",
            get(routes::question_routes::get_question)
                .patch(routes::question_routes::update_question)
                .delete(routes::question_routes::delete_question),
        )
        .route(
            "/api/admin/tests",
            get(routes::test_routes::list_tests).post(routes::test_routes::create_test),
        )
        .route(
            "/api/admin/tests/smart",
            post(routes::test_routes::create_smart_test),
        )
        .route("/api/admin/tests/import", post(routes::transfer::import_test))
        .route(
            "/api/admin/tests/:id",
            get(routes::test_routes::get_test)
                .patch(routes::test_routes::update_test)
                .delete(routes::test_routes::delete_test),
        )
        .route(
            "/api/admin/tests/:id/export",
            get(routes::transfer::export_test),
        )
        .route("/api/admin/results", get(routes::result_routes::list_results))
        .route(
            "/api/admin/results/:id",
            get(routes::result_routes::get_result)
                .patch(routes::result_routes::update_result)
                .delete(routes::result_routes::delete_result),
        );

    let public_api = Router::new()
        .route("/api/tests", get(routes::public::list_tests))
        .route("/api/tests/:id", get(routes::public::get_test))
        .route(
            "/api/tests/:id/passcode",
            post(routes::public::verify_passcode),
        )
        .route("/api/submit", post(routes::public::submit_test));

    let app = base_routes
        .merge(admin_api)
        .merge(public_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.max_upload_mb * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
