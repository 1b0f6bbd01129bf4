//! Zone-aware date/time values.
//!
//! `Instant` composes the chrono primitives instead of extending them:
//! every value carries an explicit [`TimeZone`] and only the validated
//! operations are exposed, so no construction path exists that leaves
//! the zone implicit.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone as _, Timelike,
    Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A named IANA time zone.
///
/// Identity (equality, hashing) is the canonical name, never the
/// underlying offset rules: `TimeZone::get("UTC")` and
/// `TimeZone::get("Etc/UTC")` are distinct values even though they
/// resolve to the same offsets.
#[derive(Debug, Clone)]
pub struct TimeZone {
    name: String,
    tz: Tz,
}

impl TimeZone {
    /// Resolves `name` against the IANA time zone database.
    ///
    /// A 3-letter name is accepted only for "UTC"/"GMT"
    /// (case-insensitive). Any other 3-letter code ("JST", "PST", ...)
    /// fails with [`CoreError::TimeZoneNotFound`], as do names the
    /// database has no entry for.
    pub fn get(name: &str) -> CoreResult<TimeZone> {
        if name.len() == 3
            && !name.eq_ignore_ascii_case("UTC")
            && !name.eq_ignore_ascii_case("GMT")
        {
            return Err(CoreError::TimeZoneNotFound(name.to_string()));
        }

        // The database lookup is case-sensitive; the UTC/GMT aliases
        // admitted above are normalized before the lookup.
        let lookup = if name.eq_ignore_ascii_case("UTC") || name.eq_ignore_ascii_case("GMT") {
            name.to_ascii_uppercase()
        } else {
            name.to_string()
        };

        let tz: Tz = lookup
            .parse()
            .map_err(|_| CoreError::TimeZoneNotFound(name.to_string()))?;

        Ok(TimeZone {
            name: name.to_string(),
            tz,
        })
    }

    /// The UTC time zone.
    pub fn utc() -> TimeZone {
        TimeZone {
            name: "UTC".to_string(),
            tz: Tz::UTC,
        }
    }

    /// Canonical name this zone was resolved from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn tz(&self) -> Tz {
        self.tz
    }
}

impl PartialEq for TimeZone {
    fn eq(&self, other: &TimeZone) -> bool {
        self.name == other.name
    }
}

impl Eq for TimeZone {}

impl Hash for TimeZone {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A zone-aware point in time with second precision.
///
/// Equality, ordering and hashing compare the absolute instant,
/// independent of the zone the value is displayed in. All operations
/// return new values; an `Instant` never changes after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "InstantRepr", into = "InstantRepr")]
pub struct Instant {
    local: DateTime<Tz>,
    zone: TimeZone,
}

impl Instant {
    /// Constructs an instant from calendar fields in the given zone.
    ///
    /// Fails with [`CoreError::InvalidDate`] for out-of-range fields or
    /// a local time skipped by a DST transition. An ambiguous local
    /// time (DST fold) resolves to the earlier instant.
    pub fn get(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        zone: &TimeZone,
    ) -> CoreResult<Instant> {
        let local = match zone
            .tz()
            .with_ymd_and_hms(year, month, day, hour, minute, second)
        {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earlier, _) => earlier,
            LocalResult::None => {
                return Err(CoreError::InvalidDate(format!(
                    "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02} \
                     does not exist in {zone}"
                )));
            }
        };

        Ok(Instant {
            local,
            zone: zone.clone(),
        })
    }

    /// Parses free text into an instant, attaching the required zone to
    /// the parsed calendar fields.
    ///
    /// Common ISO-style formats are tried first, then a permissive
    /// natural-language parse ("tomorrow 5pm"). Empty or unparseable
    /// text fails with [`CoreError::DateTimeParse`].
    pub fn parse(text: &str, zone: &TimeZone) -> CoreResult<Instant> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CoreError::DateTimeParse {
                text: text.to_string(),
            });
        }

        let naive = parse_naive(trimmed).ok_or_else(|| CoreError::DateTimeParse {
            text: text.to_string(),
        })?;

        Instant::get(
            naive.year(),
            naive.month(),
            naive.day(),
            naive.hour(),
            naive.minute(),
            naive.second(),
            zone,
        )
    }

    /// The current instant, in UTC.
    pub fn now_utc() -> Instant {
        let now = Utc::now().with_timezone(&Tz::UTC);
        // Sub-second precision is not modeled.
        let local = now.with_nanosecond(0).unwrap_or(now);
        Instant {
            local,
            zone: TimeZone::utc(),
        }
    }

    /// The same absolute instant, displayed in `zone`.
    pub fn convert(&self, zone: &TimeZone) -> Instant {
        Instant {
            local: self.local.with_timezone(&zone.tz()),
            zone: zone.clone(),
        }
    }

    /// `self + duration`, keeping the zone attached.
    pub fn add(&self, duration: Duration) -> Instant {
        Instant {
            local: self.local + duration,
            zone: self.zone.clone(),
        }
    }

    pub fn year(&self) -> i32 {
        self.local.year()
    }

    pub fn month(&self) -> u32 {
        self.local.month()
    }

    pub fn day(&self) -> u32 {
        self.local.day()
    }

    pub fn hour(&self) -> u32 {
        self.local.hour()
    }

    pub fn minute(&self) -> u32 {
        self.local.minute()
    }

    pub fn second(&self) -> u32 {
        self.local.second()
    }

    /// The zone this instant is displayed in.
    pub fn zone(&self) -> &TimeZone {
        &self.zone
    }

    /// The absolute instant as a UTC chrono value.
    pub fn to_utc(&self) -> DateTime<Utc> {
        self.local.with_timezone(&Utc)
    }

    /// The calendar date of this instant in its own zone.
    pub fn date(&self) -> NaiveDate {
        self.local.date_naive()
    }
}

impl PartialEq for Instant {
    fn eq(&self, other: &Instant) -> bool {
        self.local == other.local
    }
}

impl Eq for Instant {}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Instant) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Instant {
    fn cmp(&self, other: &Instant) -> Ordering {
        self.local.cmp(&other.local)
    }
}

impl Hash for Instant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local.timestamp().hash(state);
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.local.format("%Y-%m-%dT%H:%M:%S"),
            self.zone.name()
        )
    }
}

/// Serialized form of an [`Instant`]: the calendar fields plus the zone
/// name. Deserialization re-validates through [`Instant::get`].
#[derive(Clone, Serialize, Deserialize)]
struct InstantRepr {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    zone: String,
}

impl From<Instant> for InstantRepr {
    fn from(instant: Instant) -> InstantRepr {
        InstantRepr {
            year: instant.year(),
            month: instant.month(),
            day: instant.day(),
            hour: instant.hour(),
            minute: instant.minute(),
            second: instant.second(),
            zone: instant.zone.name.clone(),
        }
    }
}

impl TryFrom<InstantRepr> for Instant {
    type Error = CoreError;

    fn try_from(repr: InstantRepr) -> CoreResult<Instant> {
        let zone = TimeZone::get(&repr.zone)?;
        Instant::get(
            repr.year, repr.month, repr.day, repr.hour, repr.minute, repr.second, &zone,
        )
    }
}

/// Try ISO-style formats first, then fall back to natural language.
fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];

    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    fuzzydate::parse(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn tokyo() -> TimeZone {
        TimeZone::get("Asia/Tokyo").expect("Asia/Tokyo should resolve")
    }

    #[test]
    fn test_timezone_get_resolves_iana_names() {
        for name in ["UTC", "GMT", "Asia/Tokyo", "America/New_York"] {
            let tz = TimeZone::get(name).expect("should resolve");
            assert_eq!(tz.name(), name);
        }
    }

    #[test]
    fn test_timezone_get_accepts_lowercase_utc_and_gmt() {
        assert_eq!(TimeZone::get("utc").expect("should resolve").name(), "utc");
        assert_eq!(TimeZone::get("gmt").expect("should resolve").name(), "gmt");
    }

    #[test]
    fn test_timezone_get_rejects_three_letter_abbreviations() {
        for name in ["JST", "PST", "EST", "jst"] {
            match TimeZone::get(name) {
                Err(CoreError::TimeZoneNotFound(n)) => assert_eq!(n, name),
                other => panic!("expected TimeZoneNotFound for {name}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_timezone_get_rejects_unknown_names() {
        for name in ["", "foo", "Asia/Nowhere"] {
            assert!(matches!(
                TimeZone::get(name),
                Err(CoreError::TimeZoneNotFound(_))
            ));
        }
    }

    #[test]
    fn test_timezone_equality_is_by_name() {
        assert_eq!(
            TimeZone::get("UTC").expect("should resolve"),
            TimeZone::get("UTC").expect("should resolve")
        );
        // Same offset rules, different canonical names.
        assert_ne!(
            TimeZone::get("UTC").expect("should resolve"),
            TimeZone::get("Etc/UTC").expect("should resolve")
        );
    }

    #[test]
    fn test_instant_get_exposes_the_given_fields() {
        let instant =
            Instant::get(2014, 1, 2, 3, 4, 5, &tokyo()).expect("should construct");
        assert_eq!(instant.year(), 2014);
        assert_eq!(instant.month(), 1);
        assert_eq!(instant.day(), 2);
        assert_eq!(instant.hour(), 3);
        assert_eq!(instant.minute(), 4);
        assert_eq!(instant.second(), 5);
        assert_eq!(instant.zone().name(), "Asia/Tokyo");
    }

    #[test]
    fn test_instant_get_rejects_out_of_range_fields() {
        let utc = TimeZone::utc();
        assert!(matches!(
            Instant::get(2014, 13, 1, 0, 0, 0, &utc),
            Err(CoreError::InvalidDate(_))
        ));
        assert!(matches!(
            Instant::get(2014, 2, 30, 0, 0, 0, &utc),
            Err(CoreError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_instant_get_rejects_dst_gap() {
        // US spring-forward 2014: 02:30 on March 9 did not exist.
        let eastern = TimeZone::get("America/New_York").expect("should resolve");
        assert!(matches!(
            Instant::get(2014, 3, 9, 2, 30, 0, &eastern),
            Err(CoreError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_instant_equality_is_zone_independent() {
        let utc = TimeZone::utc();
        let in_utc = Instant::get(2014, 1, 1, 0, 0, 0, &utc).expect("should construct");
        let in_tokyo = Instant::get(2014, 1, 1, 9, 0, 0, &tokyo()).expect("should construct");
        assert_eq!(in_utc, in_tokyo);
        assert!(in_utc < in_tokyo.add(Duration::seconds(1)));
    }

    #[test]
    fn test_instant_convert_recomputes_fields() {
        let utc = TimeZone::utc();
        let instant = Instant::get(2014, 1, 1, 0, 0, 0, &utc).expect("should construct");

        let converted = instant.convert(&tokyo());
        assert_eq!(converted.hour(), 9);
        assert_eq!(converted.zone().name(), "Asia/Tokyo");
        assert_eq!(converted, instant);
    }

    #[test]
    fn test_instant_self_conversion_is_identity() {
        let zone = tokyo();
        let instant = Instant::get(2014, 6, 15, 12, 30, 0, &zone).expect("should construct");
        let converted = instant.convert(&zone);
        assert_eq!(converted, instant);
        assert_eq!(converted.hour(), instant.hour());
        assert_eq!(converted.zone(), instant.zone());
    }

    #[test]
    fn test_instant_add_is_monotonic_and_associative() {
        let utc = TimeZone::utc();
        let instant = Instant::get(2014, 1, 1, 0, 0, 0, &utc).expect("should construct");

        let d1 = Duration::hours(3);
        let d2 = Duration::hours(25);

        assert!(instant.add(d1) >= instant);
        assert_eq!(instant.add(d1).add(d2), instant.add(d1 + d2));

        let later = instant.add(d2);
        assert_eq!(later.day(), 2);
        assert_eq!(later.hour(), 1);
        assert_eq!(later.zone().name(), "UTC");
    }

    #[test]
    fn test_instant_add_crosses_dst_in_absolute_time() {
        // One absolute hour across the 2014 US spring-forward skips the
        // 02:00 local hour.
        let eastern = TimeZone::get("America/New_York").expect("should resolve");
        let before = Instant::get(2014, 3, 9, 1, 30, 0, &eastern).expect("should construct");
        let after = before.add(Duration::hours(1));
        assert_eq!(after.hour(), 3);
        assert_eq!(after.minute(), 30);
    }

    #[test]
    fn test_instant_parse_iso_formats() {
        let result = Instant::parse("2014-01-02T03:04:05", &tokyo()).expect("should parse");
        let expected = Instant::get(2014, 1, 2, 3, 4, 5, &tokyo()).expect("should construct");
        assert_eq!(result, expected);

        let date_only = Instant::parse("2014-01-02", &tokyo()).expect("should parse");
        let expected = Instant::get(2014, 1, 2, 0, 0, 0, &tokyo()).expect("should construct");
        assert_eq!(date_only, expected);
    }

    #[test]
    fn test_instant_parse_attaches_the_given_zone_to_parsed_fields() {
        // The parsed fields are reattached to the zone, not shifted.
        let result = Instant::parse("2014-01-02T03:04:05Z", &tokyo()).expect("should parse");
        assert_eq!(result.hour(), 3);
        assert_eq!(result.zone().name(), "Asia/Tokyo");
    }

    #[test]
    fn test_instant_parse_rejects_garbage() {
        for text in ["", "   ", "foo", "foo-bar"] {
            match Instant::parse(text, &TimeZone::utc()) {
                Err(CoreError::DateTimeParse { text: t }) => assert_eq!(t, text),
                other => panic!("expected DateTimeParse for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_instant_now_utc_is_in_utc() {
        let now = Instant::now_utc();
        assert_eq!(now.zone().name(), "UTC");
    }

    #[test]
    fn test_instant_serde_roundtrip() {
        let instant = Instant::get(2014, 1, 2, 3, 4, 5, &tokyo()).expect("should construct");
        let json = serde_json::to_string(&instant).expect("should serialize");
        assert!(json.contains("Asia/Tokyo"));

        let back: Instant = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(back, instant);
        assert_eq!(back.zone().name(), "Asia/Tokyo");
    }

    #[test]
    fn test_instant_display() {
        let instant = Instant::get(2014, 1, 2, 3, 4, 5, &tokyo()).expect("should construct");
        assert_eq!(instant.to_string(), "2014-01-02T03:04:05 Asia/Tokyo");
    }
}
