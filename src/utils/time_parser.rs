use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// All phrase interpretation happens in the deployment timezone (UTC+8),
/// regardless of where the service runs.
fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).expect("UTC+8 is a valid offset")
}

static HOURS_REGEX: OnceLock<Regex> = OnceLock::new();
static MINS_REGEX: OnceLock<Regex> = OnceLock::new();
static CLOCK_REGEX: OnceLock<Regex> = OnceLock::new();

fn hours_regex() -> &'static Regex {
    HOURS_REGEX.get_or_init(|| {
        Regex::new(r"^(\d+)\s*(h|hr|hrs|hour|hours)$").expect("Failed to compile hours regex")
    })
}

fn mins_regex() -> &'static Regex {
    MINS_REGEX.get_or_init(|| {
        Regex::new(r"^(\d+)\s*(m|min|mins|minute|minutes)$").expect("Failed to compile mins regex")
    })
}

fn clock_regex() -> &'static Regex {
    CLOCK_REGEX.get_or_init(|| {
        Regex::new(r"^(?:until\s+)?(\d{1,2})(?::(\d{2}))?\s*(am|pm)?$")
            .expect("Failed to compile clock regex")
    })
}

/// Result of interpreting a free-text time phrase.
///
/// `until == None` means the phrase was not understood; callers must
/// re-prompt and must not persist anything. `display_text` is quoted
/// verbatim in confirmation messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTimePhrase {
    pub until: Option<DateTime<Utc>>,
    pub display_text: String,
}

impl ParsedTimePhrase {
    fn none() -> Self {
        Self {
            until: None,
            display_text: String::new(),
        }
    }

    fn until(until: DateTime<Utc>, display_text: impl Into<String>) -> Self {
        Self {
            until: Some(until),
            display_text: display_text.into(),
        }
    }
}

/// Interpret phrases like "2h", "30m", "5pm", "until 10:30", "tonight",
/// "all day", "now". Rules are tried in order; the first match wins.
/// Deterministic given `now`.
pub fn parse_time_phrase(input: &str, now: DateTime<Utc>) -> ParsedTimePhrase {
    let input = input.trim().to_lowercase();
    let local_now = now.with_timezone(&local_offset());

    // "<N> h" — 1 to 24 hours from now. Out-of-range N falls through.
    if let Some(caps) = hours_regex().captures(&input) {
        if let Ok(hours) = caps[1].parse::<i64>() {
            if (1..=24).contains(&hours) {
                let until = now + Duration::hours(hours);
                let plural = if hours > 1 { "s" } else { "" };
                return ParsedTimePhrase::until(until, format!("for {} hour{}", hours, plural));
            }
        }
    }

    // "<N> m" — 1 to 480 minutes from now.
    if let Some(caps) = mins_regex().captures(&input) {
        if let Ok(mins) = caps[1].parse::<i64>() {
            if (1..=480).contains(&mins) {
                let until = now + Duration::minutes(mins);
                let plural = if mins > 1 { "s" } else { "" };
                return ParsedTimePhrase::until(until, format!("for {} min{}", mins, plural));
            }
        }
    }

    // "[until] H[:MM][am|pm]" — absolute clock time today, rolled to
    // tomorrow when already past.
    if let Some(caps) = clock_regex().captures(&input) {
        if let Some(parsed) = parse_clock_time(&caps, local_now) {
            return parsed;
        }
    }

    if input == "all day" || input == "today" || input == "whole day" {
        let end_of_day = local_now
            .date_naive()
            .and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("valid time"));
        let until = resolve_local(end_of_day);
        return ParsedTimePhrase::until(until, "all day");
    }

    if input == "tonight" || input == "until tonight" || input == "til tonight" {
        let mut tonight = local_now
            .date_naive()
            .and_time(NaiveTime::from_hms_opt(22, 0, 0).expect("valid time"));
        if resolve_local(tonight) <= now {
            tonight += Duration::days(1);
        }
        return ParsedTimePhrase::until(resolve_local(tonight), "until tonight");
    }

    if input == "now" || input == "rn" {
        return ParsedTimePhrase::until(now + Duration::hours(2), "for 2 hours");
    }

    ParsedTimePhrase::none()
}

fn parse_clock_time(
    caps: &regex::Captures<'_>,
    local_now: DateTime<FixedOffset>,
) -> Option<ParsedTimePhrase> {
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let meridiem = caps.get(3).map(|m| m.as_str());

    if hour > 23 || (meridiem.is_some() && hour > 12) {
        return None;
    }

    match meridiem {
        Some("pm") if hour < 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        None if hour <= 12 => {
            // Ambiguous hour: prefer PM today when that keeps the result
            // in the future; otherwise the roll-forward below lands it on
            // the same clock time tomorrow.
            let as_given = local_now
                .date_naive()
                .and_time(NaiveTime::from_hms_opt(hour, minute, 0)?);
            if resolve_local(as_given) <= local_now && hour < 12 {
                let as_pm = local_now
                    .date_naive()
                    .and_time(NaiveTime::from_hms_opt(hour + 12, minute, 0)?);
                if resolve_local(as_pm) > local_now {
                    hour += 12;
                }
            }
        }
        _ => {}
    }

    let mut target = local_now
        .date_naive()
        .and_time(NaiveTime::from_hms_opt(hour, minute, 0)?);
    if resolve_local(target) <= local_now {
        target += Duration::days(1);
    }
    let until = resolve_local(target);

    let display = format!(
        "until {}",
        until.with_timezone(&local_offset()).format("%-I:%M %p")
    );
    Some(ParsedTimePhrase::until(until, display))
}

/// Fixed offsets have exactly one mapping for every wall-clock time.
fn resolve_local(naive: chrono::NaiveDateTime) -> DateTime<Utc> {
    local_offset()
        .from_local_datetime(&naive)
        .single()
        .expect("fixed offsets are unambiguous")
        .with_timezone(&Utc)
}

/// A clock time today in local wall-clock terms, rolled to tomorrow when
/// that instant has already passed.
pub fn clock_time_today(hour: u32, minute: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    let local_now = now.with_timezone(&local_offset());
    let mut target = local_now
        .date_naive()
        .and_time(NaiveTime::from_hms_opt(hour, minute, 0).expect("valid preset time"));
    if resolve_local(target) <= now {
        target += Duration::days(1);
    }
    resolve_local(target)
}

/// The last instant of the local day.
pub fn end_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let local_now = now.with_timezone(&local_offset());
    resolve_local(
        local_now
            .date_naive()
            .and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("valid time")),
    )
}

/// Render how much of a window remains, e.g. "45m left", "2h 30m left".
pub fn format_relative_time(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = target - now;
    if remaining < Duration::zero() {
        return "expired".to_string();
    }

    let total_mins = remaining.num_minutes();
    if total_mins < 1 {
        return "less than a minute".to_string();
    }
    if total_mins < 60 {
        return format!("{}m left", total_mins);
    }

    if remaining < Duration::hours(24) {
        let hours = total_mins / 60;
        let mins = total_mins % 60;
        if hours < 4 && mins > 0 {
            return format!("{}h {}m left", hours, mins);
        }
        // Round to the nearest hour for the short form.
        let rounded = (total_mins + 30) / 60;
        return format!("{}h left", rounded);
    }

    target
        .with_timezone(&local_offset())
        .format("%-I:%M %p")
        .to_string()
}
