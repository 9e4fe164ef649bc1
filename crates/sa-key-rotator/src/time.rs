//! Day-granularity time utilities.
//!
//! Every date the rotator compares or formats is anchored on the start of
//! the current calendar day, so a clock only has to answer `today()`.

use chrono::{DateTime, Days, FixedOffset, Local, NaiveDate, TimeZone, Utc};

use crate::error::{Result, RotatorError};

/// Supplies the anchor for all rotation date math.
pub trait Clock: Send + Sync {
    /// Midnight at the start of the current calendar day.
    fn today(&self) -> DateTime<FixedOffset>;
}

/// Clock backed by the process's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DateTime<FixedOffset> {
        let midnight = Local::now().date_naive().and_time(chrono::NaiveTime::MIN);
        match Local.from_local_datetime(&midnight).earliest() {
            Some(dt) => dt.fixed_offset(),
            // local midnight skipped by a DST transition
            None => Utc.from_utc_datetime(&midnight).fixed_offset(),
        }
    }
}

/// Clock pinned to a single day, in UTC.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    today: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        let today = Utc
            .from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
            .fixed_offset();
        Self { today }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> DateTime<FixedOffset> {
        self.today
    }
}

/// Calendar-add `days` to `at`, keeping its offset.
pub fn add_days<Tz: TimeZone>(at: DateTime<Tz>, days: u32) -> Result<DateTime<Tz>> {
    at.checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| RotatorError::Validation(format!("{days} days is out of range")))
}

/// Calendar-subtract `days` from `at`, keeping its offset.
pub fn sub_days<Tz: TimeZone>(at: DateTime<Tz>, days: u32) -> Result<DateTime<Tz>> {
    at.checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| RotatorError::Validation(format!("{days} days is out of range")))
}

/// Parse an RFC 3339 timestamp as reported by the identity service.
pub fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RotatorError::Parse(format!("invalid timestamp '{value}': {e}")))
}

/// Date stamp used in artifact names.
///
/// Day precedes month (`YYYY-DD-MM`); existing consumers depend on it.
pub fn artifact_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%d-%m").to_string()
}

/// Convert to the representation the certificate builder expects.
pub(crate) fn to_offset_date_time<Tz: TimeZone>(
    at: &DateTime<Tz>,
) -> Result<::time::OffsetDateTime> {
    ::time::OffsetDateTime::from_unix_timestamp(at.timestamp())
        .map_err(|e| RotatorError::Crypto(format!("validity bound out of range: {e}")))
}
