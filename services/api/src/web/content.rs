//! services/api/src/web/content.rs
//!
//! Public site content: testimonials, the blog, the about page and the
//! contact form.

use crate::error::ApiResult;
use crate::web::envelope::{
    views, AboutView, BlogPostView, ContactMessageView, Envelope, TestimonialView,
};
use crate::web::extract::ApiPath;
use crate::web::form::FormInput;
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use consultancy_core::{ContactForm, TestimonialForm};
use std::sync::Arc;

/// GET /testimonials - approved only
pub async fn list_testimonials_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let testimonials = state.content.approved_testimonials().await?;
    Ok(Json(Envelope::ok(views::<_, TestimonialView>(testimonials))))
}

/// POST /testimonials - multipart (with an optional `photo`) or JSON
pub async fn submit_testimonial_handler(
    State(state): State<Arc<AppState>>,
    form: FormInput,
) -> ApiResult<impl IntoResponse> {
    let photo_url = form.save_file(state.files.as_ref(), "photo").await?;
    let testimonial = state
        .content
        .submit_testimonial(TestimonialForm {
            name: form.text("name"),
            org: form.text("org"),
            rating: form.text("rating"),
            text: form.text("text"),
            photo_url,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(
            Envelope::ok(TestimonialView::from(testimonial))
                .with_message("Thank you! Your testimonial will appear once approved."),
        ),
    ))
}

/// GET /blog
pub async fn list_blog_posts_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let posts = state.content.list_blog_posts().await?;
    Ok(Json(Envelope::ok(views::<_, BlogPostView>(posts))))
}

/// GET /blog/{slug}
pub async fn get_blog_post_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    let post = state.content.blog_post(&slug).await?;
    Ok(Json(Envelope::ok(BlogPostView::from(post))))
}

/// GET /about
pub async fn get_about_handler(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let about = state.content.about().await?;
    Ok(Json(Envelope::ok(AboutView::from(about))))
}

/// POST /contact
pub async fn submit_contact_handler(
    State(state): State<Arc<AppState>>,
    form: FormInput,
) -> ApiResult<impl IntoResponse> {
    let message = state
        .content
        .submit_contact_message(ContactForm {
            name: form.text("name"),
            email: form.text("email"),
            phone: form.text("phone"),
            subject: form.text("subject"),
            message: form.text("message"),
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(ContactMessageView::from(message)).with_message("Message sent")),
    ))
}
