//! services/api/src/web/state.rs
//!
//! Defines the application's shared state: the adapters and the core services
//! built on top of them.

use crate::config::Config;
use chrono::Duration;
use consultancy_core::availability::{AvailabilityCalculator, SlotTemplate};
use consultancy_core::ports::{Clock, DatabaseService, FileStore, PaymentGateway};
use consultancy_core::{
    ContentService, ModerationService, ReservationService, ReservationSettings, SeedContent,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub files: Arc<dyn FileStore>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
    pub reservations: ReservationService,
    pub moderation: ModerationService,
    pub content: ContentService,
}

impl AppState {
    /// Wires the core services to the given adapters.
    pub fn new(
        config: Arc<Config>,
        db: Arc<dyn DatabaseService>,
        payments: Arc<dyn PaymentGateway>,
        files: Arc<dyn FileStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let availability = AvailabilityCalculator::new(
            db.clone(),
            clock.clone(),
            SlotTemplate::default(),
            config.booking_lookahead_days,
        );
        let reservations = ReservationService::new(
            db.clone(),
            payments.clone(),
            files.clone(),
            clock.clone(),
            availability,
            ReservationSettings {
                consultation_fee_kobo: config.consultation_fee_kobo,
                callback_url: config.payment_callback_url.clone(),
                pending_expiry: config.pending_expiry_minutes.map(Duration::minutes),
            },
        );
        let moderation =
            ModerationService::new(db.clone(), files.clone(), payments, clock.clone());
        let seed = config
            .seed_content
            .then(|| SeedContent::demonstration(clock.now()));
        let content = ContentService::new(db.clone(), files.clone(), seed);

        Self {
            db,
            files,
            clock,
            config,
            reservations,
            moderation,
            content,
        }
    }

    /// How long an admin bearer token stays valid.
    pub fn admin_session_ttl(&self) -> Duration {
        Duration::hours(self.config.admin_session_hours)
    }
}
