pub mod admin;
pub mod auth;
pub mod bookings;
pub mod content;
pub mod envelope;
pub mod extract;
pub mod form;
pub mod middleware;
pub mod payments;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::warn;

use middleware::require_admin;
use state::AppState;

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin).allow_credentials(true),
        Err(_) => {
            warn!("Ignoring invalid CORS_ORIGIN {:?}", origin);
            layer
        }
    }
}

/// Builds the full application router: public routes, admin routes behind
/// `require_admin`, and the uploaded files.
pub fn router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/availability", get(bookings::availability_handler))
        .route("/bookings", post(bookings::create_booking_handler))
        .route(
            "/payment/initialize/{booking_id}",
            post(payments::initialize_payment_handler),
        )
        .route(
            "/payment/verify/{booking_id}",
            get(payments::verify_payment_handler),
        )
        .route(
            "/testimonials",
            get(content::list_testimonials_handler).post(content::submit_testimonial_handler),
        )
        .route("/blog", get(content::list_blog_posts_handler))
        .route("/blog/{slug}", get(content::get_blog_post_handler))
        .route("/about", get(content::get_about_handler))
        .route("/contact", post(content::submit_contact_handler))
        .route("/admin/login", post(auth::login_handler));

    let protected_routes = Router::new()
        .route("/admin/logout", post(auth::logout_handler))
        .route("/bookings/{booking_id}/status", put(bookings::update_status_handler))
        .route("/admin/bookings", get(admin::list_bookings_handler))
        .route("/admin/testimonials", get(admin::list_testimonials_handler))
        .route(
            "/admin/testimonials/{testimonial_id}/approve",
            post(admin::approve_testimonial_handler),
        )
        .route(
            "/admin/testimonials/{testimonial_id}",
            delete(admin::delete_testimonial_handler),
        )
        .route(
            "/admin/blog-posts",
            get(admin::list_blog_posts_handler).post(admin::create_blog_post_handler),
        )
        .route(
            "/admin/blog-posts/{post_id}",
            put(admin::update_blog_post_handler).delete(admin::delete_blog_post_handler),
        )
        .route("/admin/about", put(admin::update_about_handler))
        .route(
            "/admin/contact-messages",
            get(admin::list_contact_messages_handler),
        )
        .route(
            "/admin/contact-messages/{message_id}",
            get(admin::get_contact_message_handler).delete(admin::delete_contact_message_handler),
        )
        .route("/admin/payment-link", post(admin::create_payment_link_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    let mut app = Router::new().merge(public_routes).merge(protected_routes);

    let prefix = state.config.uploads_url_prefix.trim_end_matches('/');
    if prefix.starts_with('/') && prefix.len() > 1 {
        app = app.nest_service(prefix, ServeDir::new(&state.config.uploads_dir));
    }

    app.layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors_layer(&state.config.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
