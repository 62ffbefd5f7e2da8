//! services/api/src/web/admin.rs
//!
//! Admin dashboard endpoints. Every route here sits behind `require_admin`,
//! which puts the caller's `AdminIdentity` into the request extensions.

use crate::error::ApiResult;
use crate::web::envelope::{
    views, AboutView, BlogPostView, BookingView, ContactMessageView, Envelope,
    PaymentSessionView, TestimonialView,
};
use crate::web::extract::{ApiJson, ApiPath};
use crate::web::form::FormInput;
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use consultancy_core::{AboutForm, AdminIdentity, BlogPostForm, PaymentLinkRequest};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// Bookings
//=========================================================================================

/// GET /admin/bookings
pub async fn list_bookings_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
) -> ApiResult<impl IntoResponse> {
    let bookings = state.moderation.list_bookings(&admin).await?;
    Ok(Json(Envelope::ok(views::<_, BookingView>(bookings))))
}

//=========================================================================================
// Testimonials
//=========================================================================================

/// GET /admin/testimonials - approved and pending
pub async fn list_testimonials_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
) -> ApiResult<impl IntoResponse> {
    let testimonials = state.moderation.list_testimonials(&admin).await?;
    Ok(Json(Envelope::ok(views::<_, TestimonialView>(testimonials))))
}

/// POST /admin/testimonials/{id}/approve
pub async fn approve_testimonial_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    ApiPath(testimonial_id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let testimonial = state
        .moderation
        .approve_testimonial(&admin, testimonial_id)
        .await?;
    Ok(Json(
        Envelope::ok(TestimonialView::from(testimonial)).with_message("Testimonial approved"),
    ))
}

/// DELETE /admin/testimonials/{id}
pub async fn delete_testimonial_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    ApiPath(testimonial_id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state
        .moderation
        .delete_testimonial(&admin, testimonial_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Blog
//=========================================================================================

fn blog_form(form: &FormInput, image_url: Option<String>) -> BlogPostForm {
    BlogPostForm {
        title: form.text("title"),
        content: form.text("content"),
        tags: form.text("tags"),
        image_url,
    }
}

/// GET /admin/blog-posts
pub async fn list_blog_posts_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
) -> ApiResult<impl IntoResponse> {
    let posts = state.content.admin_blog_posts(&admin).await?;
    Ok(Json(Envelope::ok(views::<_, BlogPostView>(posts))))
}

/// POST /admin/blog-posts - multipart (with an optional `image`) or JSON
pub async fn create_blog_post_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    form: FormInput,
) -> ApiResult<impl IntoResponse> {
    let image_url = form.save_file(state.files.as_ref(), "image").await?;
    let post = state
        .content
        .create_blog_post(&admin, blog_form(&form, image_url))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(BlogPostView::from(post)).with_message("Blog post created")),
    ))
}

/// PUT /admin/blog-posts/{id}
pub async fn update_blog_post_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    ApiPath(post_id): ApiPath<Uuid>,
    form: FormInput,
) -> ApiResult<impl IntoResponse> {
    let image_url = form.save_file(state.files.as_ref(), "image").await?;
    let post = state
        .content
        .update_blog_post(&admin, post_id, blog_form(&form, image_url))
        .await?;
    Ok(Json(
        Envelope::ok(BlogPostView::from(post)).with_message("Blog post updated"),
    ))
}

/// DELETE /admin/blog-posts/{id}
pub async fn delete_blog_post_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    ApiPath(post_id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.moderation.delete_blog_post(&admin, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// About
//=========================================================================================

/// PUT /admin/about - multipart (with an optional `image`) or JSON
pub async fn update_about_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    form: FormInput,
) -> ApiResult<impl IntoResponse> {
    let image_url = form.save_file(state.files.as_ref(), "image").await?;
    let about = state
        .content
        .update_about(
            &admin,
            AboutForm {
                content: form.text("content"),
                image_url,
            },
        )
        .await?;
    Ok(Json(
        Envelope::ok(AboutView::from(about)).with_message("About page updated"),
    ))
}

//=========================================================================================
// Contact messages
//=========================================================================================

/// GET /admin/contact-messages
pub async fn list_contact_messages_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
) -> ApiResult<impl IntoResponse> {
    let messages = state.content.contact_messages(&admin).await?;
    Ok(Json(Envelope::ok(views::<_, ContactMessageView>(messages))))
}

/// GET /admin/contact-messages/{id}
pub async fn get_contact_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    ApiPath(message_id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let message = state.content.contact_message(&admin, message_id).await?;
    Ok(Json(Envelope::ok(ContactMessageView::from(message))))
}

/// DELETE /admin/contact-messages/{id}
pub async fn delete_contact_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    ApiPath(message_id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state
        .moderation
        .delete_contact_message(&admin, message_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Payment links
//=========================================================================================

#[derive(Deserialize)]
pub struct PaymentLinkBody {
    pub client_name: Option<String>,
    /// Naira.
    pub amount: Option<f64>,
    pub purpose: Option<String>,
    pub email: Option<String>,
}

/// POST /admin/payment-link
pub async fn create_payment_link_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    ApiJson(body): ApiJson<PaymentLinkBody>,
) -> ApiResult<impl IntoResponse> {
    let session = state
        .moderation
        .create_payment_link(
            &admin,
            PaymentLinkRequest {
                client_name: body.client_name,
                amount_naira: body.amount,
                purpose: body.purpose,
                email: body.email,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(PaymentSessionView::from(session))),
    ))
}
