use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

/// Parse a job timestamp as printed by the NetBackup console.
///
/// Recognizes the Korean-locale form `2024. 3. 5 오후 11:10:02` (also with
/// `AM`/`PM`) and the 24-hour form `2024. 03. 05 23:10:02`. Anything else,
/// including impossible dates, yields `None`.
pub fn parse_job_datetime(s: &str) -> Option<NaiveDateTime> {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    if let Some(dt) = parse_meridiem_form(&collapsed) {
        return Some(dt);
    }

    NaiveDateTime::parse_from_str(&collapsed, "%Y. %m. %d %H:%M:%S").ok()
}

/// `YYYY. M. D <marker> h:mm:ss`, anything after the time is ignored.
static MERIDIEM_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([0-9]{4})\. ([0-9]{1,2})\. ([0-9]{1,2}) (오전|오후|(?i:am|pm)) ([0-9]{1,2}):([0-9]{2}):([0-9]{2})(?: |$)",
    )
    .expect("meridiem datetime pattern")
});

fn parse_meridiem_form(s: &str) -> Option<NaiveDateTime> {
    let caps = MERIDIEM_FORM.captures(s)?;
    let number = |i: usize| caps[i].parse::<u32>().ok();

    let year = number(1)?;
    let month = number(2)?;
    let day = number(3)?;
    let mut hour = number(5)?;
    let minute = number(6)?;
    let second = number(7)?;

    let pm = match &caps[4] {
        "오전" => false,
        "오후" => true,
        marker => marker.eq_ignore_ascii_case("pm"),
    };
    match (pm, hour) {
        (true, h) if h != 12 => hour += 12,
        (false, 12) => hour = 0,
        _ => {}
    }

    NaiveDate::from_ymd_opt(year as i32, month, day)?.and_hms_opt(hour, minute, second)
}
