//! ICS file generation for itinerary activities.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use icalendar::{Calendar, Component, EventLike};

use crate::error::{RetreatError, RetreatResult};
use crate::schedule::{Activity, Itinerary};

/// Every retreat event happens here.
pub const RETREAT_LOCATION: &str = "The Glass House, 7505 SW 137th Ave, Archer, FL 32618";

/// Generate .ics content for a single activity.
pub fn activity_ics(date: &str, activity: &Activity) -> RetreatResult<String> {
    let event = build_event(parse_date(date)?, activity)?;
    Ok(finish(with_events(vec![event])))
}

/// Generate .ics content for one day's activities.
pub fn day_ics(date: &str, activities: &[Activity]) -> RetreatResult<String> {
    let date = parse_date(date)?;
    let events = activities
        .iter()
        .map(|activity| build_event(date, activity))
        .collect::<RetreatResult<Vec<_>>>()?;
    Ok(finish(with_events(events)))
}

/// Generate .ics content for the whole itinerary.
pub fn full_ics(itinerary: &Itinerary) -> RetreatResult<String> {
    let mut events = Vec::new();
    for (date, day) in &itinerary.schedule {
        let date = parse_date(date)?;
        for activity in &day.activities {
            events.push(build_event(date, activity)?);
        }
    }
    Ok(finish(with_events(events)))
}

fn parse_date(date: &str) -> RetreatResult<NaiveDate> {
    date.parse()
        .map_err(|_| RetreatError::IcsGenerate(format!("Invalid date '{date}', expected YYYY-MM-DD")))
}

/// Build one VEVENT. Times are local floating (no Z, no TZID): the retreat
/// happens in one place and attendee calendars should show wall-clock time.
fn build_event(date: NaiveDate, activity: &Activity) -> RetreatResult<icalendar::Event> {
    let start_minutes = activity.start_minutes()?;
    let start = date
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight + Duration::minutes(start_minutes))
        .ok_or_else(|| RetreatError::IcsGenerate(format!("Invalid start for '{}'", activity.title)))?;
    let end = start + Duration::minutes(activity.duration);

    let uid = format!(
        "{}-{}-{}@retreat",
        date,
        activity.time,
        slug::slugify(&activity.title)
    );

    let mut event = icalendar::Event::new();
    event.uid(&uid);
    event.summary(&activity.title);
    event.description(&format!(
        "{}\n\nEnergy Level: {}\nDuration: {} minutes",
        activity.description, activity.energy, activity.duration
    ));
    event.location(RETREAT_LOCATION);
    add_floating(&mut event, "DTSTART", start);
    add_floating(&mut event, "DTEND", end);
    event.add_property("STATUS", "CONFIRMED");

    Ok(event.done())
}

fn add_floating(event: &mut icalendar::Event, name: &str, time: NaiveDateTime) {
    event.add_property(name, time.format("%Y%m%dT%H%M%S").to_string());
}

fn with_events(events: Vec<icalendar::Event>) -> Calendar {
    let mut cal = Calendar::new();
    for event in events {
        cal.push(event);
    }
    cal.done()
}

/// Replace the icalendar crate's PRODID with ours.
fn finish(cal: Calendar) -> String {
    let mut result = String::new();
    for line in cal.to_string().lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:-//retreat//EN\r\n");
            continue;
        }
        result.push_str(line);
        result.push_str("\r\n");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_activity(time: &str, duration: i64, title: &str) -> Activity {
        Activity {
            time: time.to_string(),
            duration,
            title: title.to_string(),
            description: "Quiet walk before breakfast.".to_string(),
            energy: "medium".to_string(),
        }
    }

    #[test]
    fn test_day_with_two_activities_has_two_event_blocks() {
        let activities = vec![
            make_activity("07:30", 45, "Morning Walk"),
            make_activity("08:30", 60, "Breakfast"),
        ];

        let ics = day_ics("2025-10-25", &activities).unwrap();

        let begins = ics.lines().filter(|l| *l == "BEGIN:VEVENT").count();
        let ends = ics.lines().filter(|l| *l == "END:VEVENT").count();
        assert_eq!(begins, 2, "expected 2 VEVENT blocks. ICS:\n{ics}");
        assert_eq!(ends, 2);

        // Start/end derived from time + duration, floating local time.
        assert!(ics.contains("DTSTART:20251025T073000"), "ICS:\n{ics}");
        assert!(ics.contains("DTEND:20251025T081500"), "ICS:\n{ics}");
        assert!(ics.contains("DTSTART:20251025T083000"));
        assert!(ics.contains("DTEND:20251025T093000"));
    }

    /// Undo RFC 5545 line folding so substring checks see logical lines.
    fn unfold(ics: &str) -> String {
        ics.replace("\r\n ", "").replace("\r\n\t", "")
    }

    #[test]
    fn test_event_carries_uid_location_and_details() {
        let ics = activity_ics("2025-10-24", &make_activity("15:00", 60, "Arrival & Unpacking"))
            .unwrap();
        let ics = unfold(&ics);

        assert!(
            ics.contains("UID:2025-10-24-15:00-arrival-unpacking@retreat"),
            "ICS:\n{ics}"
        );
        assert!(ics.contains("SUMMARY:Arrival & Unpacking"));
        assert!(ics.contains("STATUS:CONFIRMED"));
        assert!(ics.contains("PRODID:-//retreat//EN"));
        assert!(ics.contains("LOCATION:"));
        assert!(ics.contains("The Glass House"));
        assert!(ics.contains("Energy Level: medium"));
        assert!(ics.contains("Duration: 60 minutes"));
    }

    #[test]
    fn test_full_itinerary_exports_every_activity() {
        let itinerary = Itinerary::builtin();
        let total: usize = itinerary
            .schedule
            .values()
            .map(|day| day.activities.len())
            .sum();

        let ics = full_ics(&itinerary).unwrap();
        let begins = ics.lines().filter(|l| *l == "BEGIN:VEVENT").count();
        assert_eq!(begins, total);
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let err = activity_ics("October 24", &make_activity("15:00", 60, "x")).unwrap_err();
        assert!(err.to_string().contains("Invalid date"));
    }
}
