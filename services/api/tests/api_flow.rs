//! End-to-end request flows through the router, backed by the in-memory adapters.

use api_lib::{
    config::Config,
    web::{auth::hash_password, router, state::AppState},
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use consultancy_core::domain::GatewayTransactionStatus;
use consultancy_core::mocks::{FixedClock, InMemoryDatabase, MemoryFileStore, MockPaymentGateway};
use consultancy_core::ports::DatabaseService;
use consultancy_core::BookingStatus;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const FEE_KOBO: u64 = 2_500_000;

struct TestApp {
    app: Router,
    db: Arc<InMemoryDatabase>,
    payments: Arc<MockPaymentGateway>,
    files: Arc<MemoryFileStore>,
}

fn test_app() -> TestApp {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused".to_string()),
        "CONSULTATION_FEE_KOBO" => Some(FEE_KOBO.to_string()),
        "PAYMENT_CALLBACK_URL" => Some("https://site.test/booking/success".to_string()),
        _ => None,
    })
    .unwrap();

    let clock = Arc::new(FixedClock::at("2025-06-01T08:00:00Z"));
    let db = Arc::new(InMemoryDatabase::with_clock(clock.clone()));
    let payments = Arc::new(MockPaymentGateway::new());
    let files = Arc::new(MemoryFileStore::new());
    let state = AppState::new(
        Arc::new(config),
        db.clone(),
        payments.clone(),
        files.clone(),
        clock,
    );

    TestApp {
        app: router(Arc::new(state)),
        db,
        payments,
        files,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn book(&self, start: &str) -> (StatusCode, Value) {
        self.json(Method::POST, "/bookings", None, booking_body(start)).await
    }

    async fn login(&self) -> String {
        let hashed = hash_password("s3cret-pass").unwrap();
        self.db.upsert_admin("admin@firm.test", &hashed).await.unwrap();
        let (status, body) = self
            .json(
                Method::POST,
                "/admin/login",
                None,
                json!({ "email": "Admin@Firm.test", "password": "s3cret-pass" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }
}

fn booking_body(start: &str) -> Value {
    json!({
        "name": "Ada Obi",
        "email": "ada@example.com",
        "phone": "+2348012345678",
        "service": "Brand Storytelling",
        "date": start,
        "notes": "Launch in Q3"
    })
}

fn multipart_body(boundary: &str, fields: &[(&str, &str)], file: (&str, &str, &str, &[u8])) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    let (field, file_name, content_type, bytes) = file;
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            boundary, field, file_name, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[tokio::test]
async fn health_reports_ok() {
    let t = test_app();
    let (status, body) = t.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn booking_a_slot_removes_it_from_availability() {
    let t = test_app();

    let (status, body) = t.get("/availability?date=2025-06-10").await;
    assert_eq!(status, StatusCode::OK);
    let slots = body["data"]["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 3);
    assert!(slots.iter().all(|s| s["available"] == true));

    let (status, body) = t.book("2025-06-10T09:00:00Z").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["payment_status"], "unpaid");

    let (_, body) = t.get("/availability?date=2025-06-10").await;
    let slots = body["data"]["slots"].as_array().unwrap();
    assert_eq!(slots[0]["available"], false);
    assert_eq!(slots[1]["available"], true);
    assert_eq!(slots[2]["available"], true);

    let (status, body) = t.book("2025-06-10T09:00:00Z").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 2);
    assert!(suggestions.iter().all(|s| s["available"] == true));
}

#[tokio::test]
async fn malformed_availability_date_is_a_bad_request() {
    let t = test_app();
    let (status, body) = t.get("/availability?date=10-06-2025").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = t.get("/availability").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_email_creates_nothing() {
    let t = test_app();
    let mut body = booking_body("2025-06-10T12:00:00Z");
    body.as_object_mut().unwrap().remove("email");

    let (status, body) = t.json(Method::POST, "/bookings", None, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(t.db.list_bookings().await.unwrap().is_empty());
}

#[tokio::test]
async fn multipart_booking_keeps_the_uploaded_brief() {
    let t = test_app();
    let boundary = "booking-boundary";
    let body = multipart_body(
        boundary,
        &[
            ("name", "Ada Obi"),
            ("email", "ada@example.com"),
            ("phone", "+2348012345678"),
            ("service", "Crisis Communication Management"),
            ("date", "2025-06-10T15:00:00Z"),
        ],
        ("file", "brief.pdf", "application/pdf", b"%PDF-1.4 brief"),
    );
    let request = Request::post("/bookings")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = t.send(request).await;
    assert_eq!(status, StatusCode::CREATED);
    let file_url = body["data"]["file_url"].as_str().unwrap();
    assert!(file_url.starts_with("/uploads/") && file_url.ends_with(".pdf"));
    assert!(t.files.contains(file_url).await);
}

#[tokio::test]
async fn concurrent_bookings_for_one_slot_admit_exactly_one() {
    let t = test_app();
    let ((a, _), (b, _)) = futures::future::join(
        t.book("2025-06-10T12:00:00Z"),
        t.book("2025-06-10T12:00:00Z"),
    )
    .await;

    let mut statuses = [a, b];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::UNPROCESSABLE_ENTITY]);
    assert_eq!(t.db.list_bookings().await.unwrap().len(), 1);
}

#[tokio::test]
async fn status_change_requires_an_admin_token() {
    let t = test_app();
    let (_, body) = t.book("2025-06-10T09:00:00Z").await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/bookings/{}/status", id);

    let (status, body) = t
        .json(Method::PUT, &uri, None, json!({ "status": "confirmed" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = t
        .json(Method::PUT, &uri, Some("not-a-real-token"), json!({ "status": "confirmed" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let bookings = t.db.list_bookings().await.unwrap();
    assert_eq!(bookings[0].status, BookingStatus::Pending);
}

#[tokio::test]
async fn admin_can_change_status_and_rejects_unknown_values() {
    let t = test_app();
    let (_, body) = t.book("2025-06-10T09:00:00Z").await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/bookings/{}/status", id);
    let token = t.login().await;

    let (status, body) = t
        .json(Method::PUT, &uri, Some(&token), json!({ "status": "maybe" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = t
        .json(Method::PUT, &uri, Some(&token), json!({ "status": "confirmed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "confirmed");

    let (status, body) = t
        .send(
            Request::get("/admin/bookings")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn wrong_password_and_logout_invalidate_access() {
    let t = test_app();
    let token = t.login().await;

    let (status, body) = t
        .json(
            Method::POST,
            "/admin/login",
            None,
            json!({ "email": "admin@firm.test", "password": "guess" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, _) = t.json(Method::POST, "/admin/logout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t
        .send(
            Request::get("/admin/bookings")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verifying_a_payment_twice_confirms_once() {
    let t = test_app();
    let (_, body) = t.book("2025-06-10T09:00:00Z").await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = t
        .send(
            Request::post(format!("/payment/initialize/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let reference = body["data"]["reference"].as_str().unwrap().to_string();
    assert!(body["data"]["payment_url"].as_str().is_some());
    assert_eq!(body["data"]["amount_kobo"], FEE_KOBO);

    let verify_uri = format!("/payment/verify/{}?reference={}", id, reference);

    let (status, body) = t.get(&verify_uri).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);

    t.payments
        .settle(&reference, GatewayTransactionStatus::Success, FEE_KOBO)
        .await;

    for _ in 0..2 {
        let (status, body) = t.get(&verify_uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["verified"], true);
        assert_eq!(body["data"]["booking"]["status"], "confirmed");
        assert_eq!(body["data"]["booking"]["payment_status"], "paid");
    }
    assert_eq!(t.db.paid_transitions().await, 1);
}

#[tokio::test]
async fn declined_payment_leaves_booking_pending() {
    let t = test_app();
    let (_, body) = t.book("2025-06-10T12:00:00Z").await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (_, body) = t
        .send(
            Request::post(format!("/payment/initialize/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let reference = body["data"]["reference"].as_str().unwrap().to_string();
    t.payments
        .settle(&reference, GatewayTransactionStatus::Failed, FEE_KOBO)
        .await;

    let (status, body) = t
        .get(&format!("/payment/verify/{}?reference={}", id, reference))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["verified"], false);
    assert_eq!(body["data"]["booking"]["status"], "pending");
}

#[tokio::test]
async fn testimonials_are_public_only_after_approval() {
    let t = test_app();
    let (status, body) = t
        .json(
            Method::POST,
            "/testimonials",
            None,
            json!({ "name": "Chidi", "org": "Acme", "rating": 5, "text": "Superb guidance." }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = t.get("/testimonials").await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let token = t.login().await;
    let (status, _) = t
        .json(
            Method::POST,
            &format!("/admin/testimonials/{}/approve", id),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = t.get("/testimonials").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = t
        .send(
            Request::delete(format!("/admin/testimonials/{}", id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn admin_blog_posts_are_served_by_slug() {
    let t = test_app();
    let token = t.login().await;

    let (status, body) = t
        .json(
            Method::POST,
            "/admin/blog-posts",
            Some(&token),
            json!({ "title": "Media Training 101", "content": "Stay on message.", "tags": "PR, Media" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["slug"], "media-training-101");
    assert_eq!(body["data"]["tags"], json!(["PR", "Media"]));

    let (status, body) = t.get("/blog/media-training-101").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Media Training 101");

    let (status, _) = t.get("/blog/no-such-post").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_messages_reach_the_admin_inbox() {
    let t = test_app();
    let (status, _) = t
        .json(
            Method::POST,
            "/contact",
            None,
            json!({
                "name": "Bola",
                "email": "bola@example.com",
                "subject": "Retainer",
                "message": "Can we talk about a monthly retainer?"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let token = t.login().await;
    let (status, body) = t
        .send(
            Request::get("/admin/contact-messages")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["subject"], "Retainer");
}

#[tokio::test]
async fn unknown_paths_are_not_found_rather_than_unauthorized() {
    let t = test_app();
    let (status, _) = t.get("/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t.get("/admin/bookings").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_ids_and_bodies_use_the_json_envelope() {
    let t = test_app();

    let (status, body) = t
        .send(
            Request::post("/payment/initialize/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some());

    let (status, body) = t
        .send(
            Request::post("/admin/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let token = t.login().await;
    let (status, body) = t
        .json(
            Method::PUT,
            "/bookings/42/status",
            Some(&token),
            json!({ "status": "confirmed" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
