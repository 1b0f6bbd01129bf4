//! Recurring event definitions and their expansion.
//!
//! Every repeat kind is an explicit finite generator bounded by the
//! rule's end date. Months that lack the requested occurrence (a fifth
//! Friday, a 31st day) simply contribute nothing.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::date::Instant;
use crate::error::{CoreError, CoreResult};
use crate::event::Event;

/// How a recurring event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatKind {
    /// Every calendar day.
    Day,
    /// Every Monday through Friday.
    Weekday,
    /// The `week`-th (1-5) `weekday` of each month.
    NthWeekday { week: u8, weekday: Weekday },
    /// The last `weekday` of each month.
    LastWeekday { weekday: Weekday },
    /// The given day (1-31) of each month.
    MonthDay { day: u8 },
}

impl RepeatKind {
    fn matches(self, date: NaiveDate) -> bool {
        match self {
            RepeatKind::Day => true,
            RepeatKind::Weekday => {
                !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
            }
            RepeatKind::NthWeekday { week, weekday } => {
                date.weekday() == weekday && (date.day() - 1) / 7 + 1 == u32::from(week)
            }
            RepeatKind::LastWeekday { weekday } => {
                date.weekday() == weekday && date.day() + 7 > days_in_month(date)
            }
            RepeatKind::MonthDay { day } => date.day() == u32::from(day),
        }
    }
}

/// A single repeating-event definition: a template event, a repeat
/// kind, an inclusive end date and a list of excluded intervals.
///
/// The template's start supplies the first candidate date, the
/// time-of-day of every occurrence and the zone the rule is walked in;
/// the template's end, when present, fixes the occurrence duration.
#[derive(Debug, Clone)]
pub struct RecurrenceRule {
    template: Event,
    kind: RepeatKind,
    until: Instant,
    exclusions: Vec<(Instant, Instant)>,
}

impl RecurrenceRule {
    /// Validates the rule parameters and sorts the exclusion list.
    ///
    /// Fails with [`CoreError::InvalidRepeatRule`] for out-of-range kind
    /// parameters and [`CoreError::InvalidDateTimePair`] when `until`
    /// precedes the template start or an exclusion interval is
    /// inverted.
    pub fn new(
        template: Event,
        kind: RepeatKind,
        until: Instant,
        mut exclusions: Vec<(Instant, Instant)>,
    ) -> CoreResult<RecurrenceRule> {
        match kind {
            RepeatKind::NthWeekday { week, .. } if !(1..=5).contains(&week) => {
                return Err(CoreError::InvalidRepeatRule(format!(
                    "week must be 1-5, got {week}"
                )));
            }
            RepeatKind::MonthDay { day } if !(1..=31).contains(&day) => {
                return Err(CoreError::InvalidRepeatRule(format!(
                    "day of month must be 1-31, got {day}"
                )));
            }
            _ => {}
        }

        if until < *template.start() {
            return Err(CoreError::InvalidDateTimePair {
                start: template.start().clone(),
                end: Some(until),
                all_day: false,
            });
        }

        for (excluded_start, excluded_end) in &exclusions {
            if excluded_start > excluded_end {
                return Err(CoreError::InvalidDateTimePair {
                    start: excluded_start.clone(),
                    end: Some(excluded_end.clone()),
                    all_day: false,
                });
            }
        }
        exclusions.sort_by(|(a, _), (b, _)| a.cmp(b));

        Ok(RecurrenceRule {
            template,
            kind,
            until,
            exclusions,
        })
    }

    pub fn kind(&self) -> RepeatKind {
        self.kind
    }

    pub fn until(&self) -> &Instant {
        &self.until
    }

    /// Expands the rule into concrete events.
    ///
    /// Walks the calendar days from the template's start date through
    /// the end date (both in the template's zone), emits one event per
    /// matching date and drops occurrences whose start falls inside an
    /// excluded half-open interval `[start, end)`. A start time skipped
    /// by a DST transition on some occurrence date propagates as
    /// [`CoreError::InvalidDate`].
    pub fn resolve(&self) -> CoreResult<Vec<Event>> {
        let zone = self.template.start().zone().clone();
        let duration = self
            .template
            .end()
            .map(|end| end.to_utc() - self.template.start().to_utc());

        let first = self.template.start().date();
        let last = self.until.convert(&zone).date();

        let mut events = Vec::new();
        let mut date = first;
        while date <= last {
            if self.kind.matches(date) {
                let start = Instant::get(
                    date.year(),
                    date.month(),
                    date.day(),
                    self.template.start().hour(),
                    self.template.start().minute(),
                    self.template.start().second(),
                    &zone,
                )?;

                if !self.is_excluded(&start) {
                    let end = duration.map(|d| start.add(d));
                    events.push(Event::new(
                        self.template.id(),
                        self.template.kind(),
                        self.template.title(),
                        self.template.description().map(str::to_string),
                        start,
                        end,
                        self.template.is_all_day(),
                        self.template.participants().to_vec(),
                        self.template.is_public(),
                        self.template.last_update().clone(),
                    )?);
                }
            }
            date += Duration::days(1);
        }

        Ok(events)
    }

    fn is_excluded(&self, start: &Instant) -> bool {
        // Exclusions are sorted by interval start.
        self.exclusions
            .iter()
            .take_while(|(excluded_start, _)| excluded_start <= start)
            .any(|(excluded_start, excluded_end)| {
                excluded_start <= start && start < excluded_end
            })
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map_or(31, |last| last.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::TimeZone;
    use crate::event::EventKind;

    fn instant(year: i32, month: u32, day: u32, hour: u32) -> Instant {
        Instant::get(year, month, day, hour, 0, 0, &TimeZone::utc()).expect("should construct")
    }

    fn template(start: Instant, end: Option<Instant>) -> Event {
        Event::new(
            "recurring-1",
            EventKind::Normal,
            "Standup",
            None,
            start,
            end,
            false,
            Vec::new(),
            true,
            instant(2014, 1, 1, 0),
        )
        .expect("should construct")
    }

    fn starts(events: &[Event]) -> Vec<(u32, u32)> {
        events
            .iter()
            .map(|e| (e.start().month(), e.start().day()))
            .collect()
    }

    #[test]
    fn test_daily_rule_covers_every_day_in_range() {
        let rule = RecurrenceRule::new(
            template(instant(2014, 1, 1, 10), Some(instant(2014, 1, 1, 11))),
            RepeatKind::Day,
            instant(2014, 1, 5, 10),
            Vec::new(),
        )
        .expect("should construct");

        let events = rule.resolve().expect("should resolve");
        assert_eq!(
            starts(&events),
            vec![(1, 1), (1, 2), (1, 3), (1, 4), (1, 5)]
        );

        // Duration carries over from the template.
        let first = &events[0];
        assert_eq!(first.start().hour(), 10);
        assert_eq!(first.end().expect("should have end").hour(), 11);
        assert_eq!(first.title(), "Standup");
    }

    #[test]
    fn test_weekday_rule_skips_weekends() {
        // 2014-01-04 is a Saturday, 2014-01-05 a Sunday.
        let rule = RecurrenceRule::new(
            template(instant(2014, 1, 3, 9), None),
            RepeatKind::Weekday,
            instant(2014, 1, 7, 9),
            Vec::new(),
        )
        .expect("should construct");

        let events = rule.resolve().expect("should resolve");
        assert_eq!(starts(&events), vec![(1, 3), (1, 6), (1, 7)]);
    }

    #[test]
    fn test_nth_weekday_rule_picks_one_day_per_month() {
        // Second Tuesday: 2014-01-14, 2014-02-11, 2014-03-11.
        let rule = RecurrenceRule::new(
            template(instant(2014, 1, 1, 14), None),
            RepeatKind::NthWeekday {
                week: 2,
                weekday: Weekday::Tue,
            },
            instant(2014, 3, 31, 14),
            Vec::new(),
        )
        .expect("should construct");

        let events = rule.resolve().expect("should resolve");
        assert_eq!(starts(&events), vec![(1, 14), (2, 11), (3, 11)]);
    }

    #[test]
    fn test_fifth_weekday_skips_months_without_one() {
        // Fifth Friday exists in January 2014 (the 31st) and May 2014
        // (the 30th), but not in February, March or April.
        let rule = RecurrenceRule::new(
            template(instant(2014, 1, 1, 8), None),
            RepeatKind::NthWeekday {
                week: 5,
                weekday: Weekday::Fri,
            },
            instant(2014, 5, 31, 8),
            Vec::new(),
        )
        .expect("should construct");

        let events = rule.resolve().expect("should resolve");
        assert_eq!(starts(&events), vec![(1, 31), (5, 30)]);
    }

    #[test]
    fn test_last_weekday_rule() {
        // Last Monday: 2014-01-27, 2014-02-24.
        let rule = RecurrenceRule::new(
            template(instant(2014, 1, 1, 18), None),
            RepeatKind::LastWeekday {
                weekday: Weekday::Mon,
            },
            instant(2014, 2, 28, 18),
            Vec::new(),
        )
        .expect("should construct");

        let events = rule.resolve().expect("should resolve");
        assert_eq!(starts(&events), vec![(1, 27), (2, 24)]);
    }

    #[test]
    fn test_month_day_rule_skips_short_months() {
        // The 31st exists in January and March but not in February.
        let rule = RecurrenceRule::new(
            template(instant(2014, 1, 1, 12), None),
            RepeatKind::MonthDay { day: 31 },
            instant(2014, 3, 31, 12),
            Vec::new(),
        )
        .expect("should construct");

        let events = rule.resolve().expect("should resolve");
        assert_eq!(starts(&events), vec![(1, 31), (3, 31)]);
    }

    #[test]
    fn test_exclusion_intervals_drop_occurrences() {
        // Exclude the 2nd and 3rd (half-open interval up to the 4th's
        // start time).
        let rule = RecurrenceRule::new(
            template(instant(2014, 1, 1, 10), Some(instant(2014, 1, 1, 11))),
            RepeatKind::Day,
            instant(2014, 1, 5, 10),
            vec![(instant(2014, 1, 2, 10), instant(2014, 1, 4, 10))],
        )
        .expect("should construct");

        let events = rule.resolve().expect("should resolve");
        assert_eq!(starts(&events), vec![(1, 1), (1, 4), (1, 5)]);
    }

    #[test]
    fn test_exclusion_interval_end_is_exclusive() {
        let rule = RecurrenceRule::new(
            template(instant(2014, 1, 1, 10), None),
            RepeatKind::Day,
            instant(2014, 1, 2, 10),
            vec![(instant(2014, 1, 1, 10), instant(2014, 1, 2, 10))],
        )
        .expect("should construct");

        let events = rule.resolve().expect("should resolve");
        assert_eq!(starts(&events), vec![(1, 2)]);
    }

    #[test]
    fn test_rejects_out_of_range_week() {
        for week in [0, 6] {
            let result = RecurrenceRule::new(
                template(instant(2014, 1, 1, 10), None),
                RepeatKind::NthWeekday {
                    week,
                    weekday: Weekday::Mon,
                },
                instant(2014, 2, 1, 10),
                Vec::new(),
            );
            assert!(matches!(result, Err(CoreError::InvalidRepeatRule(_))));
        }
    }

    #[test]
    fn test_rejects_out_of_range_month_day() {
        let result = RecurrenceRule::new(
            template(instant(2014, 1, 1, 10), None),
            RepeatKind::MonthDay { day: 32 },
            instant(2014, 2, 1, 10),
            Vec::new(),
        );
        assert!(matches!(result, Err(CoreError::InvalidRepeatRule(_))));
    }

    #[test]
    fn test_rejects_until_before_start() {
        let result = RecurrenceRule::new(
            template(instant(2014, 1, 10, 10), None),
            RepeatKind::Day,
            instant(2014, 1, 1, 10),
            Vec::new(),
        );
        assert!(matches!(
            result,
            Err(CoreError::InvalidDateTimePair { .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_exclusion_interval() {
        let result = RecurrenceRule::new(
            template(instant(2014, 1, 1, 10), None),
            RepeatKind::Day,
            instant(2014, 1, 5, 10),
            vec![(instant(2014, 1, 3, 10), instant(2014, 1, 2, 10))],
        );
        assert!(matches!(
            result,
            Err(CoreError::InvalidDateTimePair { .. })
        ));
    }
}
