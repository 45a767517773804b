//! Calendar export: pure formatting of an event into an ICS document or a
//! prefilled Google Calendar link. Events have a default one-hour duration.

use chrono::{DateTime, Duration, Utc};
use url::Url;

use crate::model::Event;

const STAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

fn stamp(at: DateTime<Utc>) -> String {
    format!("{}Z", at.format(STAMP_FORMAT))
}

/// ICS document for one event. CRLF line endings per RFC 5545.
pub fn event_ics(event: &Event, now: DateTime<Utc>) -> String {
    let start = event.event_date;
    let end = start + Duration::hours(1);
    [
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//Rinkside//EN".to_string(),
        "CALSCALE:GREGORIAN".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}@rinkside.club", event.id),
        format!("DTSTAMP:{}", stamp(now)),
        format!("DTSTART:{}", stamp(start)),
        format!("DTEND:{}", stamp(end)),
        format!("SUMMARY:{}", event.title),
        format!("DESCRIPTION:{}", event.description.as_deref().unwrap_or("")),
        "END:VEVENT".to_string(),
        "END:VCALENDAR".to_string(),
    ]
    .join("\r\n")
}

/// Download filename for the ICS export: spaces collapsed to underscores.
pub fn ics_filename(event: &Event) -> String {
    let name: String = event
        .title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("{name}.ics")
}

/// Prefilled Google Calendar "add event" link.
pub fn google_calendar_url(event: &Event) -> Url {
    let start = event.event_date;
    let end = start + Duration::hours(1);
    let mut url = Url::parse("https://www.google.com/calendar/render").expect("static url");
    url.query_pairs_mut()
        .append_pair("action", "TEMPLATE")
        .append_pair("text", &event.title)
        .append_pair("dates", &format!("{}/{}", stamp(start), stamp(end)))
        .append_pair("details", event.description.as_deref().unwrap_or(""))
        .append_pair("sf", "true")
        .append_pair("output", "xml");
    url
}
