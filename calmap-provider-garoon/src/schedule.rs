//! Conversion of Garoon `schedule_event` XML into core events.
//!
//! A `ScheduleGetEvents` response carries one `schedule_event` node per
//! event. Plain events map one-to-one; repeating events carry a
//! `repeat_info` condition and are expanded into their occurrences
//! within the queried range.

use calmap_core::{
    Event, EventKind, Instant, Participant, RecurrenceRule, RepeatKind, TimeZone,
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use roxmltree::{Document, Node};

use crate::error::{GaroonError, GaroonResult};

/// Converts every `schedule_event` node in a response document.
///
/// Nodes missing required pieces (id, title, timing, a usable repeat
/// condition) are skipped rather than failing the whole retrieval; the
/// server returns such stubs for events the user cannot fully see.
/// Repeating events are expanded and filtered to occurrences
/// overlapping `[range_start, range_end]`.
pub fn parse_schedule_events(
    doc: &Document<'_>,
    zone: &TimeZone,
    range_start: &Instant,
    range_end: &Instant,
) -> GaroonResult<Vec<Event>> {
    let mut events = Vec::new();
    for node in doc
        .descendants()
        .filter(|n| n.tag_name().name() == "schedule_event")
    {
        match parse_schedule_event(node, zone, range_start, range_end)? {
            Parsed::Single(event) => events.push(event),
            Parsed::Occurrences(occurrences) => events.extend(occurrences),
            Parsed::Skipped => {}
        }
    }
    Ok(events)
}

enum Parsed {
    Single(Event),
    Occurrences(Vec<Event>),
    Skipped,
}

fn parse_schedule_event(
    node: Node<'_, '_>,
    zone: &TimeZone,
    range_start: &Instant,
    range_end: &Instant,
) -> GaroonResult<Parsed> {
    let (Some(id), Some(title), Some(version)) = (
        node.attribute("id"),
        node.attribute("detail"),
        node.attribute("version"),
    ) else {
        return Ok(Parsed::Skipped);
    };
    if title.is_empty() {
        return Ok(Parsed::Skipped);
    }

    let last_update = instant_from_epoch(version)?;
    let description = node
        .attribute("description")
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    let public = node
        .attribute("public_type")
        .map_or(true, |p| p == "public");
    let participants = parse_participants(node);

    let kind = match node.attribute("event_type") {
        Some("normal") | None => EventKind::Normal,
        Some("banner") => EventKind::Banner,
        Some("repeat") => {
            return parse_repeat_event(
                node,
                id,
                title,
                description,
                participants,
                public,
                last_update,
                zone,
                range_start,
                range_end,
            );
        }
        // Temporary reservations and future event types.
        Some(_) => return Ok(Parsed::Skipped),
    };

    let Some(when) = node.children().find(|c| c.tag_name().name() == "when") else {
        return Ok(Parsed::Skipped);
    };

    let (start, end, all_day) = if let Some(datetime) = when
        .children()
        .find(|c| c.tag_name().name() == "datetime")
    {
        let Some(start_text) = datetime.attribute("start") else {
            return Ok(Parsed::Skipped);
        };
        let start = parse_utc_datetime(start_text)?;
        let end = datetime
            .attribute("end")
            .filter(|e| !e.is_empty())
            .map(parse_utc_datetime)
            .transpose()?;
        (start, end, false)
    } else if let Some(date) = when.children().find(|c| c.tag_name().name() == "date") {
        let Some(start_text) = date.attribute("start") else {
            return Ok(Parsed::Skipped);
        };
        let start_date = parse_date(start_text)?;
        let end_date = match date.attribute("end").filter(|e| !e.is_empty()) {
            Some(end_text) => parse_date(end_text)?,
            None => start_date,
        };
        // An all-day event spans its dates wholly, in the display zone.
        let start = instant_from_parts(start_date, midnight(), zone)?;
        let end = instant_from_parts(end_date, end_of_day(), zone)?;
        (start, Some(end), true)
    } else {
        return Ok(Parsed::Skipped);
    };

    let event = Event::new(
        id,
        kind,
        title,
        description,
        start,
        end,
        all_day,
        participants,
        public,
        last_update,
    )?;
    Ok(Parsed::Single(event))
}

#[allow(clippy::too_many_arguments)]
fn parse_repeat_event(
    node: Node<'_, '_>,
    id: &str,
    title: &str,
    description: Option<String>,
    participants: Vec<Participant>,
    public: bool,
    last_update: Instant,
    zone: &TimeZone,
    range_start: &Instant,
    range_end: &Instant,
) -> GaroonResult<Parsed> {
    let Some(condition) = node
        .descendants()
        .find(|n| n.tag_name().name() == "condition")
    else {
        return Ok(Parsed::Skipped);
    };
    let Some(kind) = parse_repeat_kind(condition) else {
        return Ok(Parsed::Skipped);
    };
    let Some(start_date_text) = condition.attribute("start_date") else {
        return Ok(Parsed::Skipped);
    };

    let start_date = parse_date(start_date_text)?;
    let start_time = match condition.attribute("start_time").filter(|t| !t.is_empty()) {
        Some(text) => parse_time(text)?,
        None => midnight(),
    };

    let start = instant_from_parts(start_date, start_time, zone)?;
    let end = condition
        .attribute("end_time")
        .filter(|t| !t.is_empty())
        .map(|text| instant_from_parts(start_date, parse_time(text)?, zone))
        .transpose()?;

    // An open-ended repeat is bounded by the query range.
    let until = match condition.attribute("end_date").filter(|d| !d.is_empty()) {
        Some(end_date_text) => {
            instant_from_parts(parse_date(end_date_text)?, start_time, zone)?
        }
        None => range_end.clone(),
    };

    let exclusions = parse_exclusions(node, zone)?;

    let template = Event::new(
        id,
        EventKind::Normal,
        title,
        description,
        start,
        end,
        false,
        participants,
        public,
        last_update,
    )?;
    let rule = RecurrenceRule::new(template, kind, until, exclusions)?;

    let occurrences = rule
        .resolve()?
        .into_iter()
        .filter(|occurrence| {
            let occurrence_end = occurrence.end().unwrap_or_else(|| occurrence.start());
            occurrence.start() <= range_end && occurrence_end >= range_start
        })
        .collect();
    Ok(Parsed::Occurrences(occurrences))
}

/// Maps a `repeat_info` condition to a repeat kind. Garoon counts
/// weekdays from 0 (Sunday) through 6 (Saturday).
fn parse_repeat_kind(condition: Node<'_, '_>) -> Option<RepeatKind> {
    match condition.attribute("type")? {
        "day" => Some(RepeatKind::Day),
        "weekday" => Some(RepeatKind::Weekday),
        nth @ ("1stweek" | "2ndweek" | "3rdweek" | "4thweek" | "5thweek") => {
            Some(RepeatKind::NthWeekday {
                week: nth.as_bytes()[0] - b'0',
                weekday: parse_weekday(condition.attribute("week")?)?,
            })
        }
        "lastweek" => Some(RepeatKind::LastWeekday {
            weekday: parse_weekday(condition.attribute("week")?)?,
        }),
        "month" => Some(RepeatKind::MonthDay {
            day: condition.attribute("day")?.parse().ok()?,
        }),
        _ => None,
    }
}

fn parse_weekday(code: &str) -> Option<Weekday> {
    match code {
        "0" => Some(Weekday::Sun),
        "1" => Some(Weekday::Mon),
        "2" => Some(Weekday::Tue),
        "3" => Some(Weekday::Wed),
        "4" => Some(Weekday::Thu),
        "5" => Some(Weekday::Fri),
        "6" => Some(Weekday::Sat),
        _ => None,
    }
}

fn parse_exclusions(
    node: Node<'_, '_>,
    zone: &TimeZone,
) -> GaroonResult<Vec<(Instant, Instant)>> {
    let mut exclusions = Vec::new();
    for excluded in node
        .descendants()
        .filter(|n| n.tag_name().name() == "exclusive_datetime")
    {
        let (Some(start), Some(end)) = (excluded.attribute("start"), excluded.attribute("end"))
        else {
            continue;
        };
        exclusions.push((
            Instant::parse(start, zone)?,
            Instant::parse(end, zone)?,
        ));
    }
    Ok(exclusions)
}

fn parse_participants(node: Node<'_, '_>) -> Vec<Participant> {
    node.descendants()
        .filter(|n| n.tag_name().name() == "user")
        .filter_map(|user| {
            let id = user.attribute("id")?;
            let name = user.attribute("name")?;
            Participant::new(id, name).ok()
        })
        .collect()
}

/// Garoon sends absolute datetimes in UTC ("2014-01-01T10:00:00Z").
fn parse_utc_datetime(text: &str) -> GaroonResult<Instant> {
    Ok(Instant::parse(text, &TimeZone::utc())?)
}

/// The `version` attribute is the last-modification time as epoch
/// seconds.
fn instant_from_epoch(text: &str) -> GaroonResult<Instant> {
    let seconds: i64 = text.parse().map_err(|_| {
        GaroonError::ResponseParse(format!("invalid version timestamp {text:?}"))
    })?;
    let utc = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        GaroonError::ResponseParse(format!("version timestamp {seconds} is out of range"))
    })?;
    Ok(Instant::get(
        utc.year(),
        utc.month(),
        utc.day(),
        utc.hour(),
        utc.minute(),
        utc.second(),
        &TimeZone::utc(),
    )?)
}

fn parse_date(text: &str) -> GaroonResult<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| GaroonError::ResponseParse(format!("invalid date {text:?}")))
}

fn parse_time(text: &str) -> GaroonResult<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .map_err(|_| GaroonError::ResponseParse(format!("invalid time {text:?}")))
}

fn instant_from_parts(date: NaiveDate, time: NaiveTime, zone: &TimeZone) -> GaroonResult<Instant> {
    Ok(Instant::get(
        date.year(),
        date.month(),
        date.day(),
        time.hour(),
        time.minute(),
        time.second(),
        zone,
    )?)
}

fn midnight() -> NaiveTime {
    NaiveTime::MIN
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}
