// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{self, admin, attempt, auth, content, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, staff_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * Public routes: health, register, login.
/// * Authenticated routes are grouped by portal; role gates sit inside the auth layer.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);
    let staff = middleware::from_fn(staff_middleware);
    let student = middleware::from_fn(student_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(auth.clone()),
        );

    // Reading is open to every portal; writing needs a teacher or admin.
    let content_routes = Router::new()
        .route(
            "/",
            get(content::list_contents)
                .merge(post(content::create_content).route_layer(staff.clone())),
        )
        .route(
            "/{id}",
            get(content::get_content).merge(
                put(content::update_content)
                    .delete(content::delete_content)
                    .route_layer(staff.clone()),
            ),
        )
        .layer(auth.clone());

    let quiz_routes = Router::new()
        .route("/{id}", get(quiz::get_quiz))
        .route(
            "/{id}/questions",
            post(quiz::add_question).route_layer(staff.clone()),
        )
        .route(
            "/{id}/attempts",
            get(quiz::list_quiz_attempts)
                .route_layer(staff)
                .merge(post(attempt::begin_attempt).route_layer(student.clone())),
        )
        .layer(auth.clone());

    let attempt_routes = Router::new()
        .route("/", get(attempt::list_my_attempts))
        .route("/{id}", put(attempt::save_progress))
        .route("/{id}/complete", post(attempt::complete_attempt))
        .route_layer(student)
        .layer(auth.clone());

    // Double middleware protection: Auth first, then Admin check
    let admin_routes = Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/attempts", delete(admin::reset_attempts))
        .layer(middleware::from_fn(admin_middleware))
        .layer(auth);

    Router::new()
        .route("/api/health", get(handlers::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/contents", content_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

