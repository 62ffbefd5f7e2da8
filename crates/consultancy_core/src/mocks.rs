//! crates/consultancy_core/src/mocks.rs
//!
//! In-memory implementations of the ports, used by unit tests here and by the
//! API crate's integration tests (through the `test-util` feature).

use crate::domain::{
    About, AdminCredentials, AdminSession, BlogPost, BlogPostDraft, Booking, BookingStatus,
    ContactMessage, GatewayTransaction, GatewayTransactionStatus, HostedCheckout, NewBooking,
    NewContactMessage, NewTestimonial, PaymentRequest, PaymentSession, PaymentStatus,
    Testimonial, Upload,
};
use crate::ports::{
    Clock, DatabaseService, FileStore, PaymentGateway, PortError, PortResult, SystemClock,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

//=========================================================================================
// Clock
//=========================================================================================

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    /// Panics on a malformed RFC 3339 timestamp; test input only.
    pub fn at(rfc3339: &str) -> Self {
        let at = DateTime::parse_from_rfc3339(rfc3339)
            .expect("FixedClock::at needs an RFC 3339 timestamp")
            .with_timezone(&Utc);
        Self {
            millis: AtomicI64::new(at.timestamp_millis()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis.load(Ordering::SeqCst))
            .single()
            .unwrap_or_else(Utc::now)
    }
}

//=========================================================================================
// Database
//=========================================================================================

#[derive(Default)]
struct Store {
    admins: Vec<AdminCredentials>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    bookings: Vec<Booking>,
    payment_sessions: Vec<PaymentSession>,
    testimonials: Vec<Testimonial>,
    blog_posts: Vec<BlogPost>,
    about: Option<About>,
    contact_messages: Vec<ContactMessage>,
    hide_next_occupancy_read: bool,
    paid_transitions: usize,
}

impl Store {
    fn slot_taken(&self, start: DateTime<Utc>, except: Option<Uuid>) -> bool {
        self.bookings.iter().any(|b| {
            b.slot_start == start && b.status.occupies_slot() && Some(b.id) != except
        })
    }

    fn booking_mut(&mut self, booking_id: Uuid) -> PortResult<&mut Booking> {
        self.bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| PortError::NotFound(format!("Booking {} not found", booking_id)))
    }
}

/// Newest first; ties keep the most recently inserted first.
fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = items.iter().rev().cloned().collect();
    out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    out
}

/// A `DatabaseService` backed by vectors behind one mutex. It enforces the
/// same uniqueness rules as the Postgres schema.
pub struct InMemoryDatabase {
    store: Mutex<Store>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Stamps `created_at` columns from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            clock,
        }
    }

    /// When set, the next occupancy read reports an empty day, as if it had
    /// run just before a concurrent insert committed.
    pub async fn hide_occupancy(&self, hide: bool) {
        self.store.lock().await.hide_next_occupancy_read = hide;
    }

    /// How many times a booking moved from unpaid to paid.
    pub async fn paid_transitions(&self) -> usize {
        self.store.lock().await.paid_transitions
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn upsert_admin(&self, email: &str, hashed_password: &str) -> PortResult<Uuid> {
        let mut store = self.store.lock().await;
        if let Some(admin) = store.admins.iter_mut().find(|a| a.email == email) {
            admin.hashed_password = hashed_password.to_string();
            return Ok(admin.admin_id);
        }
        let admin_id = Uuid::new_v4();
        store.admins.push(AdminCredentials {
            admin_id,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(admin_id)
    }

    async fn get_admin_by_email(&self, email: &str) -> PortResult<AdminCredentials> {
        let store = self.store.lock().await;
        store
            .admins
            .iter()
            .find(|a| a.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Admin {} not found", email)))
    }

    async fn create_admin_session(
        &self,
        token: &str,
        admin_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut store = self.store.lock().await;
        store
            .sessions
            .insert(token.to_string(), (admin_id, expires_at));
        Ok(())
    }

    async fn get_admin_session(&self, token: &str) -> PortResult<AdminSession> {
        let store = self.store.lock().await;
        let (admin_id, expires_at) = *store
            .sessions
            .get(token)
            .ok_or_else(|| PortError::NotFound("Session not found".to_string()))?;
        let admin = store
            .admins
            .iter()
            .find(|a| a.admin_id == admin_id)
            .ok_or(PortError::Unauthorized)?;
        Ok(AdminSession {
            token: token.to_string(),
            admin_id,
            email: admin.email.clone(),
            expires_at,
        })
    }

    async fn delete_admin_session(&self, token: &str) -> PortResult<()> {
        self.store.lock().await.sessions.remove(token);
        Ok(())
    }

    async fn insert_booking(&self, booking: NewBooking) -> PortResult<Booking> {
        let mut store = self.store.lock().await;
        if store.slot_taken(booking.slot_start, None) {
            return Err(PortError::Conflict(format!(
                "slot {} is already booked",
                booking.slot_start
            )));
        }
        let booking = Booking {
            id: Uuid::new_v4(),
            name: booking.name,
            email: booking.email,
            phone: booking.phone,
            service: booking.service,
            slot_start: booking.slot_start,
            slot_end: booking.slot_end,
            notes: booking.notes,
            file_url: booking.file_url,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_reference: None,
            created_at: self.clock.now(),
        };
        store.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, booking_id: Uuid) -> PortResult<Booking> {
        let mut store = self.store.lock().await;
        store.booking_mut(booking_id).map(|b| b.clone())
    }

    async fn list_bookings(&self) -> PortResult<Vec<Booking>> {
        let store = self.store.lock().await;
        Ok(newest_first(&store.bookings, |b| b.created_at))
    }

    async fn occupied_slot_starts(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> PortResult<Vec<DateTime<Utc>>> {
        let mut store = self.store.lock().await;
        if store.hide_next_occupancy_read {
            store.hide_next_occupancy_read = false;
            return Ok(Vec::new());
        }
        Ok(store
            .bookings
            .iter()
            .filter(|b| b.status.occupies_slot() && b.slot_start >= from && b.slot_start < to)
            .map(|b| b.slot_start)
            .collect())
    }

    async fn set_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> PortResult<Booking> {
        let mut store = self.store.lock().await;
        let start = store.booking_mut(booking_id)?.slot_start;
        if status.occupies_slot() && store.slot_taken(start, Some(booking_id)) {
            return Err(PortError::Conflict(format!("slot {} is already booked", start)));
        }
        let booking = store.booking_mut(booking_id)?;
        booking.status = status;
        Ok(booking.clone())
    }

    async fn mark_booking_paid(
        &self,
        booking_id: Uuid,
        reference: &str,
    ) -> PortResult<Option<Booking>> {
        let mut store = self.store.lock().await;
        let booking = store.booking_mut(booking_id)?;
        if booking.payment_status == PaymentStatus::Paid {
            return Ok(None);
        }
        booking.payment_status = PaymentStatus::Paid;
        booking.status = BookingStatus::Confirmed;
        booking.payment_reference = Some(reference.to_string());
        let confirmed = booking.clone();
        store.paid_transitions += 1;
        Ok(Some(confirmed))
    }

    async fn cancel_stale_bookings(&self, created_before: DateTime<Utc>) -> PortResult<Vec<Uuid>> {
        let mut guard = self.store.lock().await;
        let store = &mut *guard;
        let mut cancelled = Vec::new();
        for booking in store.bookings.iter_mut() {
            let checkout_open = store
                .payment_sessions
                .iter()
                .any(|s| s.booking_id == Some(booking.id) && s.created_at >= created_before);
            if booking.status == BookingStatus::Pending
                && booking.payment_status == PaymentStatus::Unpaid
                && booking.created_at < created_before
                && !checkout_open
            {
                booking.status = BookingStatus::Cancelled;
                cancelled.push(booking.id);
            }
        }
        Ok(cancelled)
    }

    async fn save_payment_session(&self, session: &PaymentSession) -> PortResult<()> {
        let mut store = self.store.lock().await;
        if store
            .payment_sessions
            .iter()
            .any(|s| s.reference == session.reference)
        {
            return Err(PortError::Conflict(format!(
                "payment reference {} already exists",
                session.reference
            )));
        }
        store.payment_sessions.push(session.clone());
        Ok(())
    }

    async fn find_payment_session(
        &self,
        booking_id: Uuid,
        reference: &str,
    ) -> PortResult<Option<PaymentSession>> {
        let store = self.store.lock().await;
        Ok(store
            .payment_sessions
            .iter()
            .find(|s| s.booking_id == Some(booking_id) && s.reference == reference)
            .cloned())
    }

    async fn create_testimonial(&self, testimonial: NewTestimonial) -> PortResult<Testimonial> {
        let mut store = self.store.lock().await;
        let testimonial = Testimonial {
            id: Uuid::new_v4(),
            name: testimonial.name,
            org: testimonial.org,
            rating: testimonial.rating,
            text: testimonial.text,
            photo: testimonial.photo,
            approved: false,
            created_at: self.clock.now(),
        };
        store.testimonials.push(testimonial.clone());
        Ok(testimonial)
    }

    async fn list_testimonials(&self, approved_only: bool) -> PortResult<Vec<Testimonial>> {
        let store = self.store.lock().await;
        let mut out = newest_first(&store.testimonials, |t| t.created_at);
        if approved_only {
            out.retain(|t| t.approved);
        }
        Ok(out)
    }

    async fn approve_testimonial(&self, testimonial_id: Uuid) -> PortResult<Testimonial> {
        let mut store = self.store.lock().await;
        let testimonial = store
            .testimonials
            .iter_mut()
            .find(|t| t.id == testimonial_id)
            .ok_or_else(|| PortError::NotFound("Testimonial not found".to_string()))?;
        testimonial.approved = true;
        Ok(testimonial.clone())
    }

    async fn delete_testimonial(&self, testimonial_id: Uuid) -> PortResult<Testimonial> {
        let mut store = self.store.lock().await;
        let index = store
            .testimonials
            .iter()
            .position(|t| t.id == testimonial_id)
            .ok_or_else(|| PortError::NotFound("Testimonial not found".to_string()))?;
        Ok(store.testimonials.remove(index))
    }

    async fn create_blog_post(&self, draft: BlogPostDraft) -> PortResult<BlogPost> {
        let mut store = self.store.lock().await;
        if store.blog_posts.iter().any(|p| p.slug == draft.slug) {
            return Err(PortError::Conflict(format!("slug {} already exists", draft.slug)));
        }
        let post = BlogPost {
            id: Uuid::new_v4(),
            title: draft.title,
            slug: draft.slug,
            content: draft.content,
            image: draft.image,
            tags: draft.tags,
            created_at: self.clock.now(),
        };
        store.blog_posts.push(post.clone());
        Ok(post)
    }

    async fn update_blog_post(&self, post_id: Uuid, draft: BlogPostDraft) -> PortResult<BlogPost> {
        let mut store = self.store.lock().await;
        if store
            .blog_posts
            .iter()
            .any(|p| p.slug == draft.slug && p.id != post_id)
        {
            return Err(PortError::Conflict(format!("slug {} already exists", draft.slug)));
        }
        let post = store
            .blog_posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| PortError::NotFound("Blog post not found".to_string()))?;
        post.title = draft.title;
        post.slug = draft.slug;
        post.content = draft.content;
        post.image = draft.image;
        post.tags = draft.tags;
        Ok(post.clone())
    }

    async fn get_blog_post(&self, post_id: Uuid) -> PortResult<BlogPost> {
        let store = self.store.lock().await;
        store
            .blog_posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Blog post not found".to_string()))
    }

    async fn get_blog_post_by_slug(&self, slug: &str) -> PortResult<BlogPost> {
        let store = self.store.lock().await;
        store
            .blog_posts
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Blog post not found".to_string()))
    }

    async fn list_blog_posts(&self) -> PortResult<Vec<BlogPost>> {
        let store = self.store.lock().await;
        Ok(newest_first(&store.blog_posts, |p| p.created_at))
    }

    async fn delete_blog_post(&self, post_id: Uuid) -> PortResult<BlogPost> {
        let mut store = self.store.lock().await;
        let index = store
            .blog_posts
            .iter()
            .position(|p| p.id == post_id)
            .ok_or_else(|| PortError::NotFound("Blog post not found".to_string()))?;
        Ok(store.blog_posts.remove(index))
    }

    async fn get_about(&self) -> PortResult<Option<About>> {
        Ok(self.store.lock().await.about.clone())
    }

    async fn save_about(&self, content: &str, image: Option<&str>) -> PortResult<About> {
        let mut store = self.store.lock().await;
        let id = store.about.as_ref().map(|a| a.id).unwrap_or_else(Uuid::new_v4);
        let about = About {
            id,
            content: content.to_string(),
            image: image.map(str::to_string),
            updated_at: self.clock.now(),
        };
        store.about = Some(about.clone());
        Ok(about)
    }

    async fn create_contact_message(&self, message: NewContactMessage) -> PortResult<ContactMessage> {
        let mut store = self.store.lock().await;
        let message = ContactMessage {
            id: Uuid::new_v4(),
            name: message.name,
            email: message.email,
            phone: message.phone,
            subject: message.subject,
            message: message.message,
            created_at: self.clock.now(),
        };
        store.contact_messages.push(message.clone());
        Ok(message)
    }

    async fn list_contact_messages(&self) -> PortResult<Vec<ContactMessage>> {
        let store = self.store.lock().await;
        Ok(newest_first(&store.contact_messages, |m| m.created_at))
    }

    async fn get_contact_message(&self, message_id: Uuid) -> PortResult<ContactMessage> {
        let store = self.store.lock().await;
        store
            .contact_messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Message not found".to_string()))
    }

    async fn delete_contact_message(&self, message_id: Uuid) -> PortResult<ContactMessage> {
        let mut store = self.store.lock().await;
        let index = store
            .contact_messages
            .iter()
            .position(|m| m.id == message_id)
            .ok_or_else(|| PortError::NotFound("Message not found".to_string()))?;
        Ok(store.contact_messages.remove(index))
    }
}

//=========================================================================================
// Payment Gateway
//=========================================================================================

#[derive(Default)]
struct GatewayState {
    initialized: Vec<PaymentRequest>,
    settled: HashMap<String, GatewayTransaction>,
    fail_initialize: bool,
}

/// Records checkout requests; `verify` only knows references passed to `settle`.
#[derive(Default)]
pub struct MockPaymentGateway {
    state: Mutex<GatewayState>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn initialized(&self) -> Vec<PaymentRequest> {
        self.state.lock().await.initialized.clone()
    }

    pub async fn fail_initialize(&self, fail: bool) {
        self.state.lock().await.fail_initialize = fail;
    }

    /// Makes the gateway report `status` and `amount_kobo` for `reference`.
    pub async fn settle(&self, reference: &str, status: GatewayTransactionStatus, amount_kobo: u64) {
        let gateway_response = match status {
            GatewayTransactionStatus::Success => "Approved",
            GatewayTransactionStatus::Failed => "Declined",
            GatewayTransactionStatus::Abandoned => "Abandoned",
            GatewayTransactionStatus::Pending => "Pending",
        };
        self.state.lock().await.settled.insert(
            reference.to_string(),
            GatewayTransaction {
                reference: reference.to_string(),
                status,
                amount_kobo,
                gateway_response: Some(gateway_response.to_string()),
            },
        );
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn initialize(&self, request: &PaymentRequest) -> PortResult<HostedCheckout> {
        let mut state = self.state.lock().await;
        if state.fail_initialize {
            return Err(PortError::Unexpected("gateway unavailable".to_string()));
        }
        state.initialized.push(request.clone());
        Ok(HostedCheckout {
            authorization_url: format!("https://checkout.test/{}", request.reference),
            reference: request.reference.clone(),
        })
    }

    async fn verify(&self, reference: &str) -> PortResult<GatewayTransaction> {
        self.state
            .lock()
            .await
            .settled
            .get(reference)
            .cloned()
            .ok_or_else(|| PortError::Unexpected(format!("no transaction for {}", reference)))
    }
}

//=========================================================================================
// File Store
//=========================================================================================

#[derive(Default)]
struct FileState {
    paths: HashSet<String>,
    fail_deletes: bool,
}

#[derive(Default)]
pub struct MemoryFileStore {
    state: Mutex<FileState>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, public_path: &str) -> bool {
        self.state.lock().await.paths.contains(public_path)
    }

    pub async fn fail_deletes(&self, fail: bool) {
        self.state.lock().await.fail_deletes = fail;
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn save(&self, upload: &Upload) -> PortResult<String> {
        let extension = upload
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{}", ext))
            .unwrap_or_default();
        let path = format!("/uploads/{}{}", Uuid::new_v4(), extension);
        self.state.lock().await.paths.insert(path.clone());
        Ok(path)
    }

    async fn delete(&self, public_path: &str) -> PortResult<()> {
        let mut state = self.state.lock().await;
        if state.fail_deletes {
            return Err(PortError::Unexpected("disk unavailable".to_string()));
        }
        if state.paths.remove(public_path) {
            Ok(())
        } else {
            Err(PortError::NotFound(public_path.to_string()))
        }
    }
}
