//! Shift boundary resolution and business-local time projection.
//!
//! Shift configuration arrives as `HH:mm` strings in business-local time.
//! This module turns them into minute-of-day boundaries (unwrapped past
//! midnight for overnight shifts) and projects instants between UTC and the
//! business timezone. Projection never relies on the host's local zone: the
//! requested IANA zone is tried first, then a fixed offset table for the
//! system's primary zones, then the injected default zone, and only as a
//! last resort host-local time, flagged as degraded.

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use tracing::warn;

use crate::config::{Defaults, ShiftConfig};
use crate::error::{EngineError, EngineResult};

/// Minutes in a day.
const DAY_MINUTES: i64 = 24 * 60;

/// Fixed UTC offsets (in minutes) for zones the engine must keep resolving
/// even when the timezone database lookup fails on a misspelled or
/// differently-cased name.
const OFFSET_TABLE: &[(&str, i64)] = &[
    ("Asia/Dhaka", 360),
    ("Asia/Kolkata", 330),
    ("Asia/Karachi", 300),
    ("UTC", 0),
];

/// Parses a `HH:mm` business-local time string.
///
/// # Example
///
/// ```
/// use chrono::NaiveTime;
/// use leave_engine::schedule::parse_hhmm;
///
/// let t = parse_hhmm("14:30").unwrap();
/// assert_eq!(t, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
/// assert!(parse_hhmm("25:99").is_err());
/// ```
pub fn parse_hhmm(value: &str) -> EngineResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| EngineError::InvalidTime {
        value: value.to_string(),
    })
}

/// Renders an unwrapped minute-of-day value back to `HH:mm`.
pub(crate) fn format_minute(minute: i64) -> String {
    let wrapped = minute.rem_euclid(DAY_MINUTES);
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}

fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// Resolved session boundaries for one shift.
///
/// Minutes are counted from local midnight of the shift's calendar day and
/// left unwrapped for overnight shifts, so `start < midpoint < end` always
/// holds and window comparisons need no modular arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    start_min: i64,
    mid_min: i64,
    end_min: i64,
}

impl SessionTimings {
    /// Resolves the session boundaries for a shift.
    ///
    /// The session boundary is the configured half-day midpoint when one is
    /// present and falls inside the shift; otherwise it is the arithmetic
    /// midpoint of the shift. Overnight shifts (end before start) are
    /// supported by unwrapping the end past midnight.
    ///
    /// # Example
    ///
    /// ```
    /// use leave_engine::config::ShiftConfig;
    /// use leave_engine::schedule::SessionTimings;
    ///
    /// let shift = ShiftConfig {
    ///     start_time: "10:00".to_string(),
    ///     end_time: "19:00".to_string(),
    ///     grace_minutes: 15,
    ///     half_day: None,
    /// };
    /// let timings = SessionTimings::resolve(&shift).unwrap();
    /// assert_eq!(timings.sessions_hhmm(), (
    ///     "10:00".to_string(),
    ///     "14:30".to_string(),
    ///     "14:30".to_string(),
    ///     "19:00".to_string(),
    /// ));
    /// ```
    pub fn resolve(shift: &ShiftConfig) -> EngineResult<Self> {
        let start_min = minute_of_day(parse_hhmm(&shift.start_time)?);
        let mut end_min = minute_of_day(parse_hhmm(&shift.end_time)?);
        if end_min <= start_min {
            end_min += DAY_MINUTES;
        }

        let arithmetic_mid = start_min + (end_min - start_min) / 2;
        let mid_min = match shift.half_day.as_ref().and_then(|h| h.midpoint.as_deref()) {
            Some(raw) => match parse_hhmm(raw) {
                Ok(time) => {
                    let mut candidate = minute_of_day(time);
                    if candidate < start_min {
                        candidate += DAY_MINUTES;
                    }
                    if candidate > start_min && candidate < end_min {
                        candidate
                    } else {
                        warn!(
                            midpoint = raw,
                            start = %shift.start_time,
                            end = %shift.end_time,
                            "configured midpoint falls outside the shift; using arithmetic midpoint"
                        );
                        arithmetic_mid
                    }
                }
                Err(_) => {
                    warn!(
                        midpoint = raw,
                        "configured midpoint is not a valid HH:mm value; using arithmetic midpoint"
                    );
                    arithmetic_mid
                }
            },
            None => arithmetic_mid,
        };

        Ok(Self {
            start_min,
            mid_min,
            end_min,
        })
    }

    /// Shift start in unwrapped minutes.
    pub fn start_min(&self) -> i64 {
        self.start_min
    }

    /// Session boundary (midpoint) in unwrapped minutes.
    pub fn mid_min(&self) -> i64 {
        self.mid_min
    }

    /// Shift end in unwrapped minutes; may exceed 24h for overnight shifts.
    pub fn end_min(&self) -> i64 {
        self.end_min
    }

    /// The four session boundaries as `HH:mm` strings:
    /// `(session1_start, session1_end, session2_start, session2_end)`.
    pub fn sessions_hhmm(&self) -> (String, String, String, String) {
        (
            format_minute(self.start_min),
            format_minute(self.mid_min),
            format_minute(self.mid_min),
            format_minute(self.end_min),
        )
    }

    /// Total shift length in hours, as a decimal.
    pub fn shift_hours(&self) -> Decimal {
        Decimal::from(self.end_min - self.start_min) / Decimal::from(60)
    }

    /// Maps a local wall-clock time onto the shift's unwrapped minute axis.
    ///
    /// For overnight shifts, times earlier than the shift start are taken
    /// to belong to the after-midnight portion of the shift.
    pub fn normalize_now(&self, now: NaiveTime) -> i64 {
        let minutes = minute_of_day(now);
        if self.end_min > DAY_MINUTES && minutes < self.start_min {
            minutes + DAY_MINUTES
        } else {
            minutes
        }
    }
}

/// Where a projected local time came from in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TzSource {
    /// The requested IANA zone resolved in the timezone database.
    Configured,
    /// The fixed offset table matched the requested zone name.
    OffsetTable,
    /// The injected default zone was used.
    BusinessDefault,
    /// Host-local time; the projection is degraded.
    HostLocal,
}

/// A UTC instant projected into business-local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalProjection {
    /// The business-local wall-clock date and time.
    pub local: NaiveDateTime,
    /// Which step of the fallback chain produced the projection.
    pub source: TzSource,
    /// True when only host-local time was available.
    pub degraded: bool,
}

fn offset_minutes(name: &str) -> Option<i64> {
    let wanted = name.trim();
    OFFSET_TABLE
        .iter()
        .find(|(zone, _)| zone.eq_ignore_ascii_case(wanted))
        .map(|(_, minutes)| *minutes)
}

/// Projects instants through the configured business timezone.
///
/// Construction takes explicit [`Defaults`] so tests and hosts inject their
/// own fallback zone; there is no module-level default state.
#[derive(Debug, Clone)]
pub struct TimeResolver {
    defaults: Defaults,
}

impl TimeResolver {
    /// Creates a resolver with the given fallback defaults.
    pub fn new(defaults: Defaults) -> Self {
        Self { defaults }
    }

    /// Projects a UTC instant into business-local wall-clock time.
    ///
    /// The fallback chain is: requested zone via the timezone database,
    /// fixed offset table, injected default zone, host-local (degraded).
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{DateTime, Utc};
    /// use leave_engine::config::Defaults;
    /// use leave_engine::schedule::{TimeResolver, TzSource};
    ///
    /// let resolver = TimeResolver::new(Defaults::default());
    /// let instant: DateTime<Utc> = "2026-03-02T04:00:00Z".parse().unwrap();
    /// let projected = resolver.project(instant, Some("Asia/Dhaka"));
    /// assert_eq!(projected.source, TzSource::Configured);
    /// assert_eq!(projected.local.to_string(), "2026-03-02 10:00:00");
    /// ```
    pub fn project(&self, instant: DateTime<Utc>, tz: Option<&str>) -> LocalProjection {
        if let Some(name) = tz {
            if let Ok(zone) = name.trim().parse::<Tz>() {
                return LocalProjection {
                    local: instant.with_timezone(&zone).naive_local(),
                    source: TzSource::Configured,
                    degraded: false,
                };
            }
            if let Some(minutes) = offset_minutes(name) {
                let offset = FixedOffset::east_opt((minutes * 60) as i32)
                    .expect("offset table entries are valid offsets");
                return LocalProjection {
                    local: instant.with_timezone(&offset).naive_local(),
                    source: TzSource::OffsetTable,
                    degraded: false,
                };
            }
            warn!(timezone = name, "unknown business timezone; falling back");
        }

        if let Ok(zone) = self.defaults.timezone.trim().parse::<Tz>() {
            return LocalProjection {
                local: instant.with_timezone(&zone).naive_local(),
                source: TzSource::BusinessDefault,
                degraded: false,
            };
        }

        warn!(
            timezone = %self.defaults.timezone,
            "default timezone did not resolve; using host-local time (degraded)"
        );
        LocalProjection {
            local: instant.with_timezone(&Local).naive_local(),
            source: TzSource::HostLocal,
            degraded: true,
        }
    }

    /// Maps a business-local wall time on a calendar day to a UTC instant.
    ///
    /// Uses the same fallback chain as [`TimeResolver::project`]. On a DST
    /// ambiguity the earliest instant wins; in a DST gap the wall time is
    /// interpreted as UTC.
    pub fn instant_at(&self, date: NaiveDate, time: NaiveTime, tz: Option<&str>) -> DateTime<Utc> {
        let wall = date.and_time(time);

        if let Some(name) = tz {
            if let Ok(zone) = name.trim().parse::<Tz>() {
                return resolve_local(&zone, wall);
            }
            if let Some(minutes) = offset_minutes(name) {
                let offset = FixedOffset::east_opt((minutes * 60) as i32)
                    .expect("offset table entries are valid offsets");
                return resolve_local(&offset, wall);
            }
        }

        if let Ok(zone) = self.defaults.timezone.trim().parse::<Tz>() {
            return resolve_local(&zone, wall);
        }

        resolve_local(&Local, wall)
    }
}

fn resolve_local<Z: TimeZone>(zone: &Z, wall: NaiveDateTime) -> DateTime<Utc> {
    zone.from_local_datetime(&wall)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&wall))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HalfDayConfig;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn shift(start: &str, end: &str, midpoint: Option<&str>) -> ShiftConfig {
        ShiftConfig {
            start_time: start.to_string(),
            end_time: end.to_string(),
            grace_minutes: 15,
            half_day: midpoint.map(|m| HalfDayConfig {
                midpoint: Some(m.to_string()),
                first_half_logout_grace_minutes: 0,
                second_half_login_grace_minutes: 0,
                strict_login: false,
            }),
        }
    }

    // ==========================================================================
    // HH:mm parsing
    // ==========================================================================

    #[test]
    fn test_parse_hhmm_accepts_padded_and_trimmed() {
        assert_eq!(
            parse_hhmm(" 09:05 ").unwrap(),
            NaiveTime::from_hms_opt(9, 5, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_hhmm_rejects_garbage() {
        assert!(parse_hhmm("25:99").is_err());
        assert!(parse_hhmm("noon").is_err());
        assert!(parse_hhmm("").is_err());
    }

    // ==========================================================================
    // Session boundary resolution
    // ==========================================================================

    #[test]
    fn test_arithmetic_midpoint_for_day_shift() {
        let timings = SessionTimings::resolve(&shift("10:00", "19:00", None)).unwrap();
        assert_eq!(timings.start_min(), 600);
        assert_eq!(timings.mid_min(), 870); // 14:30
        assert_eq!(timings.end_min(), 1140);
        assert_eq!(timings.shift_hours(), dec("9"));
    }

    #[test]
    fn test_explicit_midpoint_wins() {
        let timings = SessionTimings::resolve(&shift("10:00", "19:00", Some("14:00"))).unwrap();
        assert_eq!(timings.mid_min(), 840);
        let (s1, e1, s2, e2) = timings.sessions_hhmm();
        assert_eq!(s1, "10:00");
        assert_eq!(e1, "14:00");
        assert_eq!(s2, "14:00");
        assert_eq!(e2, "19:00");
    }

    #[test]
    fn test_overnight_shift_unwraps_past_midnight() {
        let timings = SessionTimings::resolve(&shift("22:00", "06:00", None)).unwrap();
        assert_eq!(timings.start_min(), 1320);
        assert_eq!(timings.mid_min(), 1560); // 02:00 next day
        assert_eq!(timings.end_min(), 1800);
        assert_eq!(timings.shift_hours(), dec("8"));

        let (s1, e1, _, e2) = timings.sessions_hhmm();
        assert_eq!(s1, "22:00");
        assert_eq!(e1, "02:00");
        assert_eq!(e2, "06:00");
    }

    #[test]
    fn test_overnight_explicit_midpoint_after_midnight() {
        let timings = SessionTimings::resolve(&shift("22:00", "06:00", Some("01:00"))).unwrap();
        assert_eq!(timings.mid_min(), 1500);
    }

    #[test]
    fn test_midpoint_outside_shift_falls_back_to_arithmetic() {
        let timings = SessionTimings::resolve(&shift("10:00", "19:00", Some("21:00"))).unwrap();
        assert_eq!(timings.mid_min(), 870);
    }

    #[test]
    fn test_unparsable_midpoint_falls_back_to_arithmetic() {
        let timings = SessionTimings::resolve(&shift("10:00", "19:00", Some("mid-day"))).unwrap();
        assert_eq!(timings.mid_min(), 870);
    }

    #[test]
    fn test_invalid_shift_time_is_an_error() {
        assert!(SessionTimings::resolve(&shift("ten", "19:00", None)).is_err());
    }

    #[test]
    fn test_normalize_now_day_shift_is_identity() {
        let timings = SessionTimings::resolve(&shift("10:00", "19:00", None)).unwrap();
        let now = NaiveTime::from_hms_opt(14, 5, 0).unwrap();
        assert_eq!(timings.normalize_now(now), 845);
    }

    #[test]
    fn test_normalize_now_overnight_wraps_early_morning() {
        let timings = SessionTimings::resolve(&shift("22:00", "06:00", None)).unwrap();
        let late_evening = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        assert_eq!(timings.normalize_now(late_evening), 1380);
        let early_morning = NaiveTime::from_hms_opt(3, 0, 0).unwrap();
        assert_eq!(timings.normalize_now(early_morning), 1620);
    }

    // ==========================================================================
    // Timezone projection fallback chain
    // ==========================================================================

    #[test]
    fn test_project_through_configured_zone() {
        let resolver = TimeResolver::new(Defaults::default());
        let instant: DateTime<Utc> = "2026-03-02T04:00:00Z".parse().unwrap();

        let projected = resolver.project(instant, Some("Asia/Dhaka"));
        assert_eq!(projected.source, TzSource::Configured);
        assert!(!projected.degraded);
        assert_eq!(projected.local.to_string(), "2026-03-02 10:00:00");
    }

    #[test]
    fn test_project_wrong_case_hits_offset_table() {
        let resolver = TimeResolver::new(Defaults::default());
        let instant: DateTime<Utc> = "2026-03-02T04:00:00Z".parse().unwrap();

        // The tz database lookup is case-sensitive; the offset table is not.
        let projected = resolver.project(instant, Some("asia/dhaka"));
        assert_eq!(projected.source, TzSource::OffsetTable);
        assert_eq!(projected.local.to_string(), "2026-03-02 10:00:00");
    }

    #[test]
    fn test_project_unknown_zone_uses_business_default() {
        let resolver = TimeResolver::new(Defaults::default());
        let instant: DateTime<Utc> = "2026-03-02T04:00:00Z".parse().unwrap();

        let projected = resolver.project(instant, Some("Not/AZone"));
        assert_eq!(projected.source, TzSource::BusinessDefault);
        assert_eq!(projected.local.to_string(), "2026-03-02 10:00:00");
    }

    #[test]
    fn test_project_no_zone_uses_business_default() {
        let resolver = TimeResolver::new(Defaults::default());
        let instant: DateTime<Utc> = "2026-03-02T04:00:00Z".parse().unwrap();

        let projected = resolver.project(instant, None);
        assert_eq!(projected.source, TzSource::BusinessDefault);
    }

    #[test]
    fn test_project_degrades_to_host_local_last() {
        let resolver = TimeResolver::new(Defaults {
            timezone: "Broken/Zone".to_string(),
            shift: ShiftConfig::default(),
        });
        let instant: DateTime<Utc> = "2026-03-02T04:00:00Z".parse().unwrap();

        let projected = resolver.project(instant, Some("Also/Broken"));
        assert_eq!(projected.source, TzSource::HostLocal);
        assert!(projected.degraded);
    }

    #[test]
    fn test_instant_at_round_trips_dhaka() {
        let resolver = TimeResolver::new(Defaults::default());
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();

        let instant = resolver.instant_at(date, time, Some("Asia/Dhaka"));
        assert_eq!(instant.to_rfc3339(), "2026-03-02T04:00:00+00:00");
    }

    #[test]
    fn test_instant_at_with_utc_table_entry() {
        let resolver = TimeResolver::new(Defaults::default());
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();

        let instant = resolver.instant_at(date, time, Some("utc"));
        assert_eq!(instant.to_rfc3339(), "2026-03-02T10:00:00+00:00");
    }
}
