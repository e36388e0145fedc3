//! The retreat itinerary and wall-clock schedule lookup.
//!
//! The itinerary is static content loaded from `itinerary.json` in the
//! data directory; a built-in default is written there on first use.
//! Lookup is per-calendar-day in local time: activities on other days are
//! never matched.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{RetreatError, RetreatResult};

const DEFAULT_ITINERARY: &str = include_str!("itinerary.default.json");

/// The reminder window: activities starting this many minutes out.
const REMIND_AHEAD_MIN: i64 = 14;
const REMIND_AHEAD_MAX: i64 = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Local start time, `HH:MM`.
    pub time: String,
    /// Length in minutes.
    pub duration: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub energy: String,
}

impl Activity {
    /// Start as minutes since local midnight.
    pub fn start_minutes(&self) -> RetreatResult<i64> {
        let (hours, minutes) = self
            .time
            .split_once(':')
            .ok_or_else(|| bad_time(&self.time))?;
        let hours: i64 = hours.parse().map_err(|_| bad_time(&self.time))?;
        let minutes: i64 = minutes.parse().map_err(|_| bad_time(&self.time))?;
        if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
            return Err(bad_time(&self.time));
        }
        Ok(hours * 60 + minutes)
    }

    pub fn end_minutes(&self) -> RetreatResult<i64> {
        Ok(self.start_minutes()? + self.duration)
    }
}

fn bad_time(time: &str) -> RetreatError {
    RetreatError::Config(format!("Invalid activity time '{time}', expected HH:MM"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Day {
    pub day: String,
    pub title: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prompts {
    #[serde(default)]
    pub general: Vec<String>,
    #[serde(default)]
    pub couples: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    /// `YYYY-MM-DD` date -> that day's plan.
    pub schedule: BTreeMap<String, Day>,
    #[serde(default)]
    pub prompts: Prompts,
}

impl Itinerary {
    /// The itinerary compiled into the binary.
    pub fn builtin() -> Itinerary {
        serde_json::from_str(DEFAULT_ITINERARY).expect("built-in itinerary is valid")
    }

    /// Load from `path`, writing the built-in default there first when the
    /// file doesn't exist yet.
    pub fn load(path: &Path) -> RetreatResult<Itinerary> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, DEFAULT_ITINERARY)?;
            return Ok(Itinerary::builtin());
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            RetreatError::Config(format!("Invalid itinerary at {}: {e}", path.display()))
        })
    }

    pub fn day(&self, date: &str) -> Option<&Day> {
        self.schedule.get(date)
    }

    /// The activity whose `[start, start+duration)` interval contains `now`,
    /// if any. Only today's activities are considered.
    pub fn current_activity(&self, now: NaiveDateTime) -> Option<&Activity> {
        let day = self.day(&now.date().to_string())?;
        let minute = minute_of_day(now);

        day.activities.iter().find(|activity| {
            match (activity.start_minutes(), activity.end_minutes()) {
                (Ok(start), Ok(end)) => start <= minute && minute < end,
                _ => false,
            }
        })
    }

    /// The next activity today whose start is strictly after `now`.
    pub fn next_activity(&self, now: NaiveDateTime) -> Option<&Activity> {
        let day = self.day(&now.date().to_string())?;
        let minute = minute_of_day(now);

        day.activities
            .iter()
            .filter_map(|activity| activity.start_minutes().ok().map(|start| (start, activity)))
            .filter(|(start, _)| *start > minute)
            .min_by_key(|(start, _)| *start)
            .map(|(_, activity)| activity)
    }

    /// Activities starting about fifteen minutes from `now` (a two-minute
    /// window, so a once-a-minute check can't miss one).
    pub fn upcoming(&self, now: NaiveDateTime) -> Vec<&Activity> {
        let Some(day) = self.day(&now.date().to_string()) else {
            return Vec::new();
        };
        let minute = minute_of_day(now);

        day.activities
            .iter()
            .filter(|activity| match activity.start_minutes() {
                Ok(start) => {
                    (REMIND_AHEAD_MIN..=REMIND_AHEAD_MAX).contains(&(start - minute))
                }
                Err(_) => false,
            })
            .collect()
    }
}

fn minute_of_day(now: NaiveDateTime) -> i64 {
    i64::from(now.hour()) * 60 + i64::from(now.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(date: (i32, u32, u32), hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn sample() -> Itinerary {
        let mut schedule = BTreeMap::new();
        schedule.insert(
            "2025-10-25".to_string(),
            Day {
                day: "Saturday".into(),
                title: "Deep Work".into(),
                activities: vec![
                    Activity {
                        time: "08:00".into(),
                        duration: 60,
                        title: "Breakfast".into(),
                        description: String::new(),
                        energy: "low".into(),
                    },
                    Activity {
                        time: "10:00".into(),
                        duration: 90,
                        title: "Ikigai Session".into(),
                        description: String::new(),
                        energy: "high".into(),
                    },
                ],
            },
        );
        Itinerary {
            schedule,
            prompts: Prompts::default(),
        }
    }

    #[test]
    fn test_current_activity_interval_is_half_open() {
        let itinerary = sample();

        // Start is inclusive.
        let current = itinerary.current_activity(at((2025, 10, 25), 8, 0)).unwrap();
        assert_eq!(current.title, "Breakfast");

        // End is exclusive: 09:00 is past the 60-minute breakfast.
        assert!(itinerary.current_activity(at((2025, 10, 25), 9, 0)).is_none());

        let current = itinerary.current_activity(at((2025, 10, 25), 11, 29)).unwrap();
        assert_eq!(current.title, "Ikigai Session");
        assert!(itinerary.current_activity(at((2025, 10, 25), 11, 30)).is_none());
    }

    #[test]
    fn test_next_activity_is_strictly_after_now() {
        let itinerary = sample();

        // During breakfast the next thing is the Ikigai session.
        let next = itinerary.next_activity(at((2025, 10, 25), 8, 30)).unwrap();
        assert_eq!(next.title, "Ikigai Session");

        // At exactly 10:00 the session is current, not next.
        assert!(itinerary.next_activity(at((2025, 10, 25), 10, 0)).is_none());
    }

    #[test]
    fn test_other_days_never_match() {
        let itinerary = sample();
        assert!(itinerary.current_activity(at((2025, 10, 24), 8, 30)).is_none());
        assert!(itinerary.next_activity(at((2025, 10, 26), 7, 0)).is_none());
    }

    #[test]
    fn test_upcoming_window() {
        let itinerary = sample();

        // 09:45 is 15 minutes before the 10:00 session.
        let upcoming = itinerary.upcoming(at((2025, 10, 25), 9, 45));
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "Ikigai Session");

        // 09:43 is 17 minutes out: outside the window.
        assert!(itinerary.upcoming(at((2025, 10, 25), 9, 43)).is_empty());
    }

    #[test]
    fn test_builtin_itinerary_parses_and_is_ordered() {
        let itinerary = Itinerary::builtin();
        assert!(!itinerary.schedule.is_empty());
        for day in itinerary.schedule.values() {
            let starts: Vec<i64> = day
                .activities
                .iter()
                .map(|a| a.start_minutes().unwrap())
                .collect();
            let mut sorted = starts.clone();
            sorted.sort();
            assert_eq!(starts, sorted, "activities in {} out of order", day.day);
        }
        assert!(!itinerary.prompts.general.is_empty());
    }

    #[test]
    fn test_invalid_time_is_rejected() {
        let activity = Activity {
            time: "25:99".into(),
            duration: 30,
            title: "x".into(),
            description: String::new(),
            energy: String::new(),
        };
        assert!(activity.start_minutes().is_err());
    }
}
