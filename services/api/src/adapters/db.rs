//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use consultancy_core::domain::{
    About, AdminCredentials, AdminSession, BlogPost, BlogPostDraft, Booking, BookingStatus,
    ContactMessage, NewBooking, NewContactMessage, NewTestimonial, PaymentSession, PaymentStatus,
    Testimonial,
};
use consultancy_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps a `sqlx` failure onto the port's error vocabulary.
fn map_err(what: &str) -> impl Fn(sqlx::Error) -> PortError + '_ {
    move |e| match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what)),
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            PortError::Conflict(format!("{} already exists: {}", what, db_err.message()))
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn kobo_to_db(amount_kobo: u64) -> PortResult<i64> {
    i64::try_from(amount_kobo)
        .map_err(|_| PortError::Invalid(format!("amount {} is out of range", amount_kobo)))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const BOOKING_COLUMNS: &str = "id, name, email, phone, service, slot_start, slot_end, notes, \
     file_url, status, payment_status, payment_reference, created_at";

#[derive(FromRow)]
struct BookingRecord {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    service: String,
    slot_start: DateTime<Utc>,
    slot_end: DateTime<Utc>,
    notes: Option<String>,
    file_url: Option<String>,
    status: String,
    payment_status: String,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
}
impl BookingRecord {
    fn to_domain(self) -> PortResult<Booking> {
        Ok(Booking {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            service: self.service,
            slot_start: self.slot_start,
            slot_end: self.slot_end,
            notes: self.notes,
            file_url: self.file_url,
            status: self.status.parse::<BookingStatus>().map_err(PortError::Unexpected)?,
            payment_status: self
                .payment_status
                .parse::<PaymentStatus>()
                .map_err(PortError::Unexpected)?,
            payment_reference: self.payment_reference,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct AdminRecord {
    id: Uuid,
    email: String,
    password_hash: String,
}
impl AdminRecord {
    fn to_domain(self) -> AdminCredentials {
        AdminCredentials {
            admin_id: self.id,
            email: self.email,
            hashed_password: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct AdminSessionRecord {
    token: String,
    admin_id: Uuid,
    email: String,
    expires_at: DateTime<Utc>,
}
impl AdminSessionRecord {
    fn to_domain(self) -> AdminSession {
        AdminSession {
            token: self.token,
            admin_id: self.admin_id,
            email: self.email,
            expires_at: self.expires_at,
        }
    }
}

#[derive(FromRow)]
struct PaymentSessionRecord {
    reference: String,
    booking_id: Option<Uuid>,
    payment_url: String,
    amount_kobo: i64,
    created_at: DateTime<Utc>,
}
impl PaymentSessionRecord {
    fn to_domain(self) -> PaymentSession {
        PaymentSession {
            booking_id: self.booking_id,
            reference: self.reference,
            payment_url: self.payment_url,
            amount_kobo: self.amount_kobo.max(0) as u64,
            created_at: self.created_at,
        }
    }
}

const TESTIMONIAL_COLUMNS: &str = "id, name, org, rating, text, photo, approved, created_at";

#[derive(FromRow)]
struct TestimonialRecord {
    id: Uuid,
    name: String,
    org: Option<String>,
    rating: Option<i32>,
    text: String,
    photo: Option<String>,
    approved: bool,
    created_at: DateTime<Utc>,
}
impl TestimonialRecord {
    fn to_domain(self) -> Testimonial {
        Testimonial {
            id: self.id,
            name: self.name,
            org: self.org,
            rating: self.rating,
            text: self.text,
            photo: self.photo,
            approved: self.approved,
            created_at: self.created_at,
        }
    }
}

const BLOG_COLUMNS: &str = "id, title, slug, content, image, tags, created_at";

#[derive(FromRow)]
struct BlogPostRecord {
    id: Uuid,
    title: String,
    slug: String,
    content: String,
    image: Option<String>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
}
impl BlogPostRecord {
    fn to_domain(self) -> BlogPost {
        BlogPost {
            id: self.id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            image: self.image,
            tags: self.tags,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct AboutRecord {
    id: Uuid,
    content: String,
    image: Option<String>,
    updated_at: DateTime<Utc>,
}
impl AboutRecord {
    fn to_domain(self) -> About {
        About {
            id: self.id,
            content: self.content,
            image: self.image,
            updated_at: self.updated_at,
        }
    }
}

const CONTACT_COLUMNS: &str = "id, name, email, phone, subject, message, created_at";

#[derive(FromRow)]
struct ContactMessageRecord {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    subject: String,
    message: String,
    created_at: DateTime<Utc>,
}
impl ContactMessageRecord {
    fn to_domain(self) -> ContactMessage {
        ContactMessage {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            subject: self.subject,
            message: self.message,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Administrators ---

    async fn upsert_admin(&self, email: &str, hashed_password: &str) -> PortResult<Uuid> {
        let (admin_id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO admins (id, email, password_hash) VALUES ($1, $2, $3) \
             ON CONFLICT (email) DO UPDATE SET password_hash = EXCLUDED.password_hash \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Admin"))?;
        Ok(admin_id)
    }

    async fn get_admin_by_email(&self, email: &str) -> PortResult<AdminCredentials> {
        let record: AdminRecord =
            sqlx::query_as("SELECT id, email, password_hash FROM admins WHERE email = $1")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .map_err(map_err("Admin"))?;
        Ok(record.to_domain())
    }

    async fn create_admin_session(
        &self,
        token: &str,
        admin_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO admin_sessions (token, admin_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(admin_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_err("Session"))?;
        Ok(())
    }

    async fn get_admin_session(&self, token: &str) -> PortResult<AdminSession> {
        let record: AdminSessionRecord = sqlx::query_as(
            "SELECT s.token, s.admin_id, a.email, s.expires_at \
             FROM admin_sessions s JOIN admins a ON a.id = s.admin_id \
             WHERE s.token = $1",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Session"))?;
        Ok(record.to_domain())
    }

    async fn delete_admin_session(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM admin_sessions WHERE token = $1 OR expires_at < now()")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(map_err("Session"))?;
        Ok(())
    }

    // --- Bookings ---

    async fn insert_booking(&self, booking: NewBooking) -> PortResult<Booking> {
        let record: BookingRecord = sqlx::query_as(&format!(
            "INSERT INTO bookings (id, name, email, phone, service, slot_start, slot_end, notes, file_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&booking.name)
        .bind(&booking.email)
        .bind(&booking.phone)
        .bind(&booking.service)
        .bind(booking.slot_start)
        .bind(booking.slot_end)
        .bind(&booking.notes)
        .bind(&booking.file_url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Booking for this slot"))?;
        record.to_domain()
    }

    async fn get_booking(&self, booking_id: Uuid) -> PortResult<Booking> {
        let record: BookingRecord = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Booking"))?;
        record.to_domain()
    }

    async fn list_bookings(&self) -> PortResult<Vec<Booking>> {
        let records: Vec<BookingRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_err("Booking"))?;
        records.into_iter().map(BookingRecord::to_domain).collect()
    }

    async fn occupied_slot_starts(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> PortResult<Vec<DateTime<Utc>>> {
        let rows: Vec<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT slot_start FROM bookings \
             WHERE slot_start >= $1 AND slot_start < $2 AND status <> 'cancelled'",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err("Booking"))?;
        Ok(rows.into_iter().map(|(start,)| start).collect())
    }

    async fn set_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> PortResult<Booking> {
        let record: BookingRecord = sqlx::query_as(&format!(
            "UPDATE bookings SET status = $2 WHERE id = $1 RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Booking"))?;
        record.to_domain()
    }

    async fn mark_booking_paid(
        &self,
        booking_id: Uuid,
        reference: &str,
    ) -> PortResult<Option<Booking>> {
        let record: Option<BookingRecord> = sqlx::query_as(&format!(
            "UPDATE bookings \
             SET payment_status = 'paid', status = 'confirmed', payment_reference = $2 \
             WHERE id = $1 AND payment_status = 'unpaid' RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err("Booking"))?;
        match record {
            Some(record) => record.to_domain().map(Some),
            // Distinguish "already paid" from "no such booking".
            None => self.get_booking(booking_id).await.map(|_| None),
        }
    }

    async fn cancel_stale_bookings(&self, created_before: DateTime<Utc>) -> PortResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "UPDATE bookings SET status = 'cancelled' \
             WHERE status = 'pending' AND payment_status = 'unpaid' AND created_at < $1 \
             AND NOT EXISTS ( \
                 SELECT 1 FROM payment_sessions p \
                 WHERE p.booking_id = bookings.id AND p.created_at >= $1 \
             ) \
             RETURNING id",
        )
        .bind(created_before)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err("Booking"))?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    // --- Payment sessions ---

    async fn save_payment_session(&self, session: &PaymentSession) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO payment_sessions (reference, booking_id, payment_url, amount_kobo, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&session.reference)
        .bind(session.booking_id)
        .bind(&session.payment_url)
        .bind(kobo_to_db(session.amount_kobo)?)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err("Payment session"))?;
        Ok(())
    }

    async fn find_payment_session(
        &self,
        booking_id: Uuid,
        reference: &str,
    ) -> PortResult<Option<PaymentSession>> {
        let record: Option<PaymentSessionRecord> = sqlx::query_as(
            "SELECT reference, booking_id, payment_url, amount_kobo, created_at \
             FROM payment_sessions WHERE booking_id = $1 AND reference = $2",
        )
        .bind(booking_id)
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err("Payment session"))?;
        Ok(record.map(PaymentSessionRecord::to_domain))
    }

    // --- Testimonials ---

    async fn create_testimonial(&self, testimonial: NewTestimonial) -> PortResult<Testimonial> {
        let record: TestimonialRecord = sqlx::query_as(&format!(
            "INSERT INTO testimonials (id, name, org, rating, text, photo) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            TESTIMONIAL_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&testimonial.name)
        .bind(&testimonial.org)
        .bind(testimonial.rating)
        .bind(&testimonial.text)
        .bind(&testimonial.photo)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Testimonial"))?;
        Ok(record.to_domain())
    }

    async fn list_testimonials(&self, approved_only: bool) -> PortResult<Vec<Testimonial>> {
        let records: Vec<TestimonialRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM testimonials WHERE approved OR NOT $1 ORDER BY created_at DESC",
            TESTIMONIAL_COLUMNS
        ))
        .bind(approved_only)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err("Testimonial"))?;
        Ok(records.into_iter().map(TestimonialRecord::to_domain).collect())
    }

    async fn approve_testimonial(&self, testimonial_id: Uuid) -> PortResult<Testimonial> {
        let record: TestimonialRecord = sqlx::query_as(&format!(
            "UPDATE testimonials SET approved = TRUE WHERE id = $1 RETURNING {}",
            TESTIMONIAL_COLUMNS
        ))
        .bind(testimonial_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Testimonial"))?;
        Ok(record.to_domain())
    }

    async fn delete_testimonial(&self, testimonial_id: Uuid) -> PortResult<Testimonial> {
        let record: TestimonialRecord = sqlx::query_as(&format!(
            "DELETE FROM testimonials WHERE id = $1 RETURNING {}",
            TESTIMONIAL_COLUMNS
        ))
        .bind(testimonial_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Testimonial"))?;
        Ok(record.to_domain())
    }

    // --- Blog ---

    async fn create_blog_post(&self, draft: BlogPostDraft) -> PortResult<BlogPost> {
        let record: BlogPostRecord = sqlx::query_as(&format!(
            "INSERT INTO blog_posts (id, title, slug, content, image, tags) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            BLOG_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.content)
        .bind(&draft.image)
        .bind(&draft.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Blog post"))?;
        Ok(record.to_domain())
    }

    async fn update_blog_post(&self, post_id: Uuid, draft: BlogPostDraft) -> PortResult<BlogPost> {
        let record: BlogPostRecord = sqlx::query_as(&format!(
            "UPDATE blog_posts SET title = $2, slug = $3, content = $4, image = $5, tags = $6 \
             WHERE id = $1 RETURNING {}",
            BLOG_COLUMNS
        ))
        .bind(post_id)
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.content)
        .bind(&draft.image)
        .bind(&draft.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Blog post"))?;
        Ok(record.to_domain())
    }

    async fn get_blog_post(&self, post_id: Uuid) -> PortResult<BlogPost> {
        let record: BlogPostRecord =
            sqlx::query_as(&format!("SELECT {} FROM blog_posts WHERE id = $1", BLOG_COLUMNS))
                .bind(post_id)
                .fetch_one(&self.pool)
                .await
                .map_err(map_err("Blog post"))?;
        Ok(record.to_domain())
    }

    async fn get_blog_post_by_slug(&self, slug: &str) -> PortResult<BlogPost> {
        let record: BlogPostRecord =
            sqlx::query_as(&format!("SELECT {} FROM blog_posts WHERE slug = $1", BLOG_COLUMNS))
                .bind(slug)
                .fetch_one(&self.pool)
                .await
                .map_err(map_err("Blog post"))?;
        Ok(record.to_domain())
    }

    async fn list_blog_posts(&self) -> PortResult<Vec<BlogPost>> {
        let records: Vec<BlogPostRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM blog_posts ORDER BY created_at DESC",
            BLOG_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_err("Blog post"))?;
        Ok(records.into_iter().map(BlogPostRecord::to_domain).collect())
    }

    async fn delete_blog_post(&self, post_id: Uuid) -> PortResult<BlogPost> {
        let record: BlogPostRecord = sqlx::query_as(&format!(
            "DELETE FROM blog_posts WHERE id = $1 RETURNING {}",
            BLOG_COLUMNS
        ))
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Blog post"))?;
        Ok(record.to_domain())
    }

    // --- About ---

    async fn get_about(&self) -> PortResult<Option<About>> {
        let record: Option<AboutRecord> =
            sqlx::query_as("SELECT id, content, image, updated_at FROM about")
                .fetch_optional(&self.pool)
                .await
                .map_err(map_err("About"))?;
        Ok(record.map(AboutRecord::to_domain))
    }

    async fn save_about(&self, content: &str, image: Option<&str>) -> PortResult<About> {
        let record: AboutRecord = sqlx::query_as(
            "INSERT INTO about (id, content, image) VALUES ($1, $2, $3) \
             ON CONFLICT (singleton) DO UPDATE \
             SET content = EXCLUDED.content, image = EXCLUDED.image, updated_at = now() \
             RETURNING id, content, image, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(content)
        .bind(image)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("About"))?;
        Ok(record.to_domain())
    }

    // --- Contact messages ---

    async fn create_contact_message(&self, message: NewContactMessage) -> PortResult<ContactMessage> {
        let record: ContactMessageRecord = sqlx::query_as(&format!(
            "INSERT INTO contact_messages (id, name, email, phone, subject, message) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            CONTACT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.phone)
        .bind(&message.subject)
        .bind(&message.message)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Contact message"))?;
        Ok(record.to_domain())
    }

    async fn list_contact_messages(&self) -> PortResult<Vec<ContactMessage>> {
        let records: Vec<ContactMessageRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM contact_messages ORDER BY created_at DESC",
            CONTACT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_err("Contact message"))?;
        Ok(records.into_iter().map(ContactMessageRecord::to_domain).collect())
    }

    async fn get_contact_message(&self, message_id: Uuid) -> PortResult<ContactMessage> {
        let record: ContactMessageRecord = sqlx::query_as(&format!(
            "SELECT {} FROM contact_messages WHERE id = $1",
            CONTACT_COLUMNS
        ))
        .bind(message_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Contact message"))?;
        Ok(record.to_domain())
    }

    async fn delete_contact_message(&self, message_id: Uuid) -> PortResult<ContactMessage> {
        let record: ContactMessageRecord = sqlx::query_as(&format!(
            "DELETE FROM contact_messages WHERE id = $1 RETURNING {}",
            CONTACT_COLUMNS
        ))
        .bind(message_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err("Contact message"))?;
        Ok(record.to_domain())
    }
}
