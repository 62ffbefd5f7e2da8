//! crates/consultancy_core/src/availability.rs
//!
//! Computes a day's bookable slots from the fixed daily template and the
//! bookings currently holding them. Nothing here is cached: every query reads
//! occupancy from the database.

use crate::domain::TimeSlot;
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{Clock, DatabaseService};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;

/// Default number of days ahead a booking may be placed.
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 120;

//=========================================================================================
// Slot Template
//=========================================================================================

/// One entry of the daily template, as minutes after midnight UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDefinition {
    pub start_minute: u32,
    pub duration_minutes: u32,
}

/// The slots offered every day. Identical for all days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTemplate {
    slots: Vec<SlotDefinition>,
}

impl Default for SlotTemplate {
    /// 09:00, 12:00 and 15:00, one hour each.
    fn default() -> Self {
        Self::new(vec![
            SlotDefinition { start_minute: 9 * 60, duration_minutes: 60 },
            SlotDefinition { start_minute: 12 * 60, duration_minutes: 60 },
            SlotDefinition { start_minute: 15 * 60, duration_minutes: 60 },
        ])
    }
}

impl SlotTemplate {
    /// Builds a template; slots are kept sorted by start time.
    pub fn new(mut slots: Vec<SlotDefinition>) -> Self {
        slots.sort_by_key(|s| s.start_minute);
        slots.dedup_by_key(|s| s.start_minute);
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The `(start, end)` windows of the template on `date`, in template order.
    pub fn windows_for(&self, date: NaiveDate) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
        self.slots
            .iter()
            .map(|slot| {
                let start = midnight + Duration::minutes(i64::from(slot.start_minute));
                (start, start + Duration::minutes(i64::from(slot.duration_minutes)))
            })
            .collect()
    }

    /// The template window starting exactly at `start`, if there is one.
    pub fn window_starting_at(&self, start: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.windows_for(start.date_naive())
            .into_iter()
            .find(|(slot_start, _)| *slot_start == start)
    }
}

/// Marks each template slot of `date` unavailable when its start is in `occupied`.
pub fn mark_availability(
    template: &SlotTemplate,
    date: NaiveDate,
    occupied: &[DateTime<Utc>],
) -> Vec<TimeSlot> {
    template
        .windows_for(date)
        .into_iter()
        .map(|(start, end)| TimeSlot {
            start,
            end,
            available: !occupied.contains(&start),
        })
        .collect()
}

/// UTC bounds `[midnight, next midnight)` of a calendar day.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
    (start, start + Duration::days(1))
}

//=========================================================================================
// Availability Calculator
//=========================================================================================

#[derive(Clone)]
pub struct AvailabilityCalculator {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
    template: SlotTemplate,
    lookahead_days: i64,
}

impl AvailabilityCalculator {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        clock: Arc<dyn Clock>,
        template: SlotTemplate,
        lookahead_days: i64,
    ) -> Self {
        Self {
            db,
            clock,
            template,
            lookahead_days,
        }
    }

    pub fn template(&self) -> &SlotTemplate {
        &self.template
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// The day's slots in template order. Dates before today are rejected.
    pub async fn availability(&self, date: NaiveDate) -> ServiceResult<Vec<TimeSlot>> {
        if date < self.today() {
            return Err(ServiceError::InvalidDate(format!(
                "{} is in the past",
                date
            )));
        }
        self.slots_on(date).await
    }

    /// The day's slots without any date-range check.
    pub(crate) async fn slots_on(&self, date: NaiveDate) -> ServiceResult<Vec<TimeSlot>> {
        let (from, to) = day_bounds(date);
        let occupied = self.db.occupied_slot_starts(from, to).await?;
        Ok(mark_availability(&self.template, date, &occupied))
    }

    /// The slots of `date` that are still free.
    pub(crate) async fn free_slots_on(&self, date: NaiveDate) -> ServiceResult<Vec<TimeSlot>> {
        Ok(self
            .slots_on(date)
            .await?
            .into_iter()
            .filter(|slot| slot.available)
            .collect())
    }

    /// Resolves a requested start to its template window, enforcing the
    /// booking window: not in the past and at most `lookahead_days` ahead.
    pub fn bookable_window(
        &self,
        start: DateTime<Utc>,
    ) -> ServiceResult<(DateTime<Utc>, DateTime<Utc>)> {
        let now = self.clock.now();
        if start < now {
            return Err(ServiceError::InvalidDate(
                "The selected time slot is in the past".to_string(),
            ));
        }
        let last_day = now.date_naive() + Duration::days(self.lookahead_days);
        if start.date_naive() > last_day {
            return Err(ServiceError::InvalidDate(format!(
                "Bookings can be made at most {} days ahead",
                self.lookahead_days
            )));
        }
        self.template.window_starting_at(start).ok_or_else(|| {
            ServiceError::InvalidDate(format!("{} is not a bookable time slot", start))
        })
    }
}

//=========================================================================================
// Tests
//=========================================================================================
