use chrono::{DateTime, Datelike as _, Days, NaiveDate, NaiveDateTime, NaiveTime};

const AIRDATE_FORMAT: &str = "%Y-%m-%d";
const UNKNOWN_AIRDATE: &str = "Unknown";
const WEEK_WINDOW_DAYS: f64 = 3.5;

/// `sNNeNN`; a missing episode number renders as `00`.
#[must_use]
pub fn format_episode_code(season: u32, number: Option<u32>) -> String {
    format!("s{season:02}e{:02}", number.unwrap_or(0))
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp. Impossible calendar dates
/// (e.g. `2021-02-30`) are rejected.
pub fn parse_airdate(airdate: Option<&str>) -> Option<NaiveDate> {
    let airdate = airdate.map(str::trim).filter(|s| !s.is_empty())?;
    if let Ok(date) = NaiveDate::parse_from_str(airdate, AIRDATE_FORMAT) {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(airdate)
        .ok()
        .map(|ts| ts.date_naive())
}

#[must_use]
pub fn format_airdate(airdate: Option<&str>) -> String {
    match parse_airdate(airdate) {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => UNKNOWN_AIRDATE.to_owned(),
    }
}

/// True when the airdate's month/day, placed in last/this/next year relative
/// to `now`, lands within half a week of `now`.
#[must_use]
pub fn is_within_week_of_today(airdate: NaiveDate, now: NaiveDateTime) -> bool {
    let year = now.year();
    [year - 1, year, year + 1]
        .into_iter()
        .filter_map(|candidate_year| anchor_in_year(airdate, candidate_year))
        .map(|candidate| {
            let midnight = candidate.and_time(NaiveTime::MIN);
            (midnight - now).num_seconds().abs() as f64 / 86_400.0
        })
        .any(|days| days <= WEEK_WINDOW_DAYS)
}

// Day overflow rolls into the next month, so Feb 29 lands on Mar 1 in
// non-leap years.
fn anchor_in_year(airdate: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, airdate.month(), 1)?
        .checked_add_days(Days::new(u64::from(airdate.day0())))
}
