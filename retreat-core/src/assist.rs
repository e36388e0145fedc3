//! Generative-text assistance.
//!
//! All analyses funnel through one `generate` call against the mirror
//! provider. The gate order matters: authentication and prompt validation
//! happen before any provider contact, then the advisory rate limit, then
//! the actual call. Counters persist in a state file so short-lived CLI
//! invocations still add up; the caps are a UX throttle, not a security
//! control.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{RetreatError, RetreatResult};
use crate::journal::DailyReflection;
use crate::sync::Mirror;
use crate::worksheets::WorksheetData;

pub const MAX_REQUESTS_PER_HOUR: u32 = 20;
pub const MAX_REQUESTS_PER_DAY: u32 = 100;

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;

/// Rolling request counters, persisted between CLI runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub hour_started_at: i64,
    #[serde(default)]
    pub day_started_at: i64,
}

impl Usage {
    /// Reset windows that have elapsed, then check the caps.
    pub fn check(&mut self, now_ms: i64) -> Result<(), String> {
        if now_ms - self.hour_started_at > HOUR_MS {
            self.hour = 0;
            self.hour_started_at = now_ms;
        }
        if now_ms - self.day_started_at > DAY_MS {
            self.day = 0;
            self.day_started_at = now_ms;
        }

        if self.hour >= MAX_REQUESTS_PER_HOUR {
            return Err("Hourly limit reached".into());
        }
        if self.day >= MAX_REQUESTS_PER_DAY {
            return Err("Daily limit reached".into());
        }
        Ok(())
    }

    pub fn record(&mut self) {
        self.hour += 1;
        self.day += 1;
    }
}

/// The assist client. `mirror` is `None` when nobody is signed in, in
/// which case every request is rejected before the provider is spawned.
pub struct Assist {
    mirror: Option<Arc<Mirror>>,
    usage_path: PathBuf,
}

impl Assist {
    pub fn new(mirror: Option<Arc<Mirror>>, state_dir: PathBuf) -> Assist {
        Assist {
            mirror,
            usage_path: state_dir.join("assist_usage.json"),
        }
    }

    /// Send a prompt through the provider's generate endpoint.
    pub async fn generate(&self, prompt: &str, model: Option<&str>) -> RetreatResult<String> {
        let mirror = self
            .mirror
            .as_ref()
            .ok_or(RetreatError::NotAuthenticated)?;

        if prompt.trim().is_empty() {
            return Err(RetreatError::InvalidPrompt(
                "Prompt must not be empty".into(),
            ));
        }

        let mut usage = self.load_usage();
        usage
            .check(Utc::now().timestamp_millis())
            .map_err(RetreatError::RateLimited)?;

        let reply = mirror.remote().generate(prompt, model).await?;

        usage.record();
        self.save_usage(&usage);

        match (reply.success, reply.response) {
            (true, Some(text)) => Ok(text),
            (true, None) => Err(RetreatError::Provider("No response from API".into())),
            (false, _) => Err(RetreatError::Provider(
                reply
                    .error
                    .unwrap_or_else(|| "Failed to generate AI response".into()),
            )),
        }
    }

    pub fn usage(&self) -> Usage {
        self.load_usage()
    }

    fn load_usage(&self) -> Usage {
        std::fs::read_to_string(&self.usage_path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    fn save_usage(&self, usage: &Usage) {
        // Advisory counters: losing one is harmless, so failures only log.
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.usage_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&self.usage_path, serde_json::to_string(usage)?.as_bytes())
        };
        if let Err(e) = write() {
            tracing::warn!(error = %e, "could not persist assist usage");
        }
    }
}

// ============================================================================
// Canned analysis prompts
// ============================================================================

fn field<'a>(fields: &'a serde_json::Map<String, serde_json::Value>, name: &str) -> String {
    fields
        .get(name)
        .map(|v| match v {
            serde_json::Value::String(s) if !s.trim().is_empty() => s.clone(),
            serde_json::Value::Null => "None".to_string(),
            serde_json::Value::String(_) => "None".to_string(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "None".to_string())
}

/// Coach's read on one day's reflection.
pub fn reflection_prompt(date: &str, reflection: &DailyReflection) -> String {
    let f = &reflection.fields;
    format!(
        "You are a supportive wellness and business coach analyzing a daily reflection \
         from a retreat focused on entrepreneurship and personal growth.\n\n\
         Analyze this journal entry and provide:\n\
         1. Key insights (2-3 sentences)\n\
         2. One actionable suggestion\n\
         3. One encouraging message\n\n\
         Journal Entry:\n\
         Date: {date}\n\
         Intention: {}\n\
         Energy Level: {}/10\n\n\
         Key Insights: {}\n\
         Moments of Clarity: {}\n\
         Challenges: {}\n\
         Ideas Generated: {}\n\n\
         Gratitude:\n1. {}\n2. {}\n3. {}\n\n\
         Keep your response warm, supportive, and actionable.",
        field(f, "intention"),
        field(f, "energy"),
        field(f, "insights"),
        field(f, "clarity"),
        field(f, "challenges"),
        field(f, "ideas"),
        field(f, "gratitude1"),
        field(f, "gratitude2"),
        field(f, "gratitude3"),
    )
}

/// Strategy consultant's read on the SWOT worksheet.
pub fn swot_prompt(data: &WorksheetData) -> String {
    format!(
        "You are a business strategy consultant reviewing a SWOT analysis for a new \
         business idea.\n\n\
         Business Idea: {}\n\n\
         SWOT Analysis:\n\
         Strengths: {}\n\
         Weaknesses: {}\n\
         Opportunities: {}\n\
         Threats: {}\n\n\
         Provide:\n\
         1. Missing items in each quadrant\n\
         2. Strategic recommendations (2-3 key insights)\n\
         3. Priority actions\n\n\
         Be specific and actionable.",
        data.field_or("idea_name", "Unnamed Business Idea"),
        data.field_or("strengths", "Not specified"),
        data.field_or("weaknesses", "Not specified"),
        data.field_or("opportunities", "Not specified"),
        data.field_or("threats", "Not specified"),
    )
}

pub fn ikigai_prompt(data: &WorksheetData) -> String {
    format!(
        "You are a career coach analyzing an Ikigai diagram to help someone find their \
         purpose.\n\n\
         Ikigai Elements:\n\
         - What I Love: {}\n\
         - What I'm Good At: {}\n\
         - What I Can Be Paid For: {}\n\
         - What The World Needs: {}\n\n\
         Analyze the alignment, point out overlaps, suggest 1-2 business ideas that \
         combine these elements, and identify gaps to develop. Be encouraging and visionary.",
        data.field_or("love", "Not specified"),
        data.field_or("good_at", "Not specified"),
        data.field_or("paid_for", "Not specified"),
        data.field_or("world_needs", "Not specified"),
    )
}

pub fn value_prop_prompt(data: &WorksheetData) -> String {
    format!(
        "You are a product strategist reviewing a Value Proposition Canvas.\n\n\
         Customer Profile:\n\
         - Jobs: {}\n\
         - Pains: {}\n\
         - Gains: {}\n\n\
         Value Map:\n\
         - Products/Services: {}\n\
         - Pain Relievers: {}\n\
         - Gain Creators: {}\n\n\
         Evaluate how well the value map addresses the customer profile, what's missing, \
         and rate the product-market fit (1-10) with reasons. Be constructive and specific.",
        data.field_or("customer_jobs", "Not specified"),
        data.field_or("pains", "Not specified"),
        data.field_or("gains", "Not specified"),
        data.field_or("products", "Not specified"),
        data.field_or("pain_relievers", "Not specified"),
        data.field_or("gain_creators", "Not specified"),
    )
}

pub fn action_plan_prompt(data: &WorksheetData) -> String {
    format!(
        "You are a business advisor reviewing a 90-day action plan for a new venture.\n\n\
         Business Idea: {}\n\
         Vision: {}\n\n\
         Month 1 Goal: {}\n\
         Month 2 Goal: {}\n\
         Month 3 Goal: {}\n\n\
         Analyze whether the timeline is realistic, whether the goals are measurable, \
         what roadblocks to expect, and suggest 2-3 adjustments. Be realistic but encouraging.",
        data.field_or("business_idea", "Not specified"),
        data.field_or("vision", "Not specified"),
        data.field_or("month1_goal", "Not specified"),
        data.field_or("month2_goal", "Not specified"),
        data.field_or("month3_goal", "Not specified"),
    )
}

/// Pattern detection across several days of reflections.
/// Errors on an empty entry list rather than wasting a request.
pub fn patterns_prompt(entries: &[(String, DailyReflection)]) -> RetreatResult<String> {
    if entries.is_empty() {
        return Err(RetreatError::InvalidPrompt(
            "No journal entries to analyze".into(),
        ));
    }

    let entries_text: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(i, (date, r))| {
            format!(
                "Entry {} ({date}):\nIntention: {}\nInsights: {}\nChallenges: {}\n---",
                i + 1,
                field(&r.fields, "intention"),
                field(&r.fields, "insights"),
                field(&r.fields, "challenges"),
            )
        })
        .collect();

    Ok(format!(
        "You are analyzing multiple journal entries from a retreat participant to \
         identify patterns and themes.\n\n\
         Entries:\n{}\n\n\
         Identify recurring themes, growth over time, limiting beliefs, positive \
         patterns, and one key recommendation. Be insightful and compassionate.",
        entries_text.join("\n\n")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unauthenticated_request_is_rejected_before_provider_contact() {
        let dir = tempfile::tempdir().unwrap();
        // No mirror: the "loopback" provider binary doesn't exist either, so
        // reaching it would fail with a provider error instead.
        let assist = Assist::new(None, dir.path().to_path_buf());

        let err = assist.generate("Suggest an intention", None).await.unwrap_err();
        assert!(matches!(err, RetreatError::NotAuthenticated));
    }

    #[test]
    fn test_usage_windows_reset_and_cap() {
        let mut usage = Usage::default();
        let start = 1_000_000_000_000;

        for _ in 0..MAX_REQUESTS_PER_HOUR {
            usage.check(start).unwrap();
            usage.record();
        }
        assert_eq!(usage.check(start).unwrap_err(), "Hourly limit reached");

        // An hour later the hourly window resets; the daily count remains.
        let later = start + HOUR_MS + 1;
        usage.check(later).unwrap();
        assert_eq!(usage.hour, 0);
        assert_eq!(usage.day, MAX_REQUESTS_PER_HOUR);
    }

    #[test]
    fn test_daily_cap_outlives_hourly_resets() {
        let mut usage = Usage {
            day: MAX_REQUESTS_PER_DAY,
            day_started_at: 1_000_000_000_000,
            hour: 0,
            hour_started_at: 1_000_000_000_000,
        };

        let err = usage.check(1_000_000_000_000 + HOUR_MS + 1).unwrap_err();
        assert_eq!(err, "Daily limit reached");

        // A day later everything resets.
        usage.check(1_000_000_000_000 + DAY_MS + 1).unwrap();
        assert_eq!(usage.day, 0);
    }

    #[test]
    fn test_reflection_prompt_fills_missing_fields() {
        let mut reflection = DailyReflection::default();
        reflection.fields.insert("intention".into(), json!("Focus"));
        reflection.fields.insert("energy".into(), json!(7));

        let prompt = reflection_prompt("2025-10-24", &reflection);
        assert!(prompt.contains("Intention: Focus"));
        assert!(prompt.contains("Energy Level: 7/10"));
        assert!(prompt.contains("Challenges: None"));
    }

    #[test]
    fn test_patterns_prompt_rejects_empty_entries() {
        assert!(matches!(
            patterns_prompt(&[]),
            Err(RetreatError::InvalidPrompt(_))
        ));
    }
}
