//! Description quality scoring.
//!
//! A point-based heuristic that tells the caller how much a description
//! gives the synthesizer to work with.  It is informational only and never
//! blocks generation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extractor::IntentExtractor;

static TRIGGER_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(when|whenever|every|each time|on new|after|once|schedule[ds]?|daily|hourly|weekly)\b",
    )
    .expect("static trigger regex")
});

static ACTION_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(send|create|update|save|notify|post|sync|add|copy|upload|alert|store|forward|append|insert|email|message)\b",
    )
    .expect("static action regex")
});

static DATA_NOUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(rows?|records?|leads?|orders?|messages?|files?|emails?|customers?|tickets?|issues?|events?|data|reports?|contacts?)\b",
    )
    .expect("static noun regex")
});

const TRIGGER_POINTS: u32 = 25;
const SERVICE_POINTS: u32 = 10;
const MAX_SCORED_SERVICES: u32 = 3;
const ACTION_POINTS: u32 = 20;
const DATA_POINTS: u32 = 10;
const LONG_TEXT_POINTS: u32 = 15;
const SHORT_TEXT_POINTS: u32 = 8;

/// Coarse bucket for a [`QualityReport::score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Poor,
    Fair,
    Good,
}

impl QualityLevel {
    fn from_score(score: u32) -> Self {
        match score {
            0..40 => Self::Poor,
            40..70 => Self::Fair,
            _ => Self::Good,
        }
    }
}

/// The outcome of [`IntentExtractor::assess`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    /// 0..=100.
    pub score: u32,
    pub level: QualityLevel,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl IntentExtractor {
    /// Score how completely `description` specifies an automation.
    pub fn assess(&self, description: &str) -> QualityReport {
        let lowered = description.trim().to_lowercase();
        let mut issues = Vec::new();
        let mut suggestions = Vec::new();

        if lowered.is_empty() {
            return QualityReport {
                score: 0,
                level: QualityLevel::Poor,
                issues: vec!["description is empty".into()],
                suggestions: vec![
                    "describe what should start the workflow and what it should do".into(),
                ],
            };
        }

        let mut score = 0;

        if TRIGGER_PHRASE.is_match(&lowered) {
            score += TRIGGER_POINTS;
        } else {
            issues.push("no trigger event described".into());
            suggestions
                .push("say when the workflow should run, e.g. \"when a form is submitted\"".into());
        }

        let services = self
            .extract(&lowered)
            .services
            .into_iter()
            .filter(|tag| !tag.is_trigger_hint())
            .count() as u32;
        if services == 0 {
            issues.push("no services recognised".into());
            suggestions.push("name the apps involved, e.g. Slack, Gmail or Google Sheets".into());
        }
        score += services.min(MAX_SCORED_SERVICES) * SERVICE_POINTS;

        if ACTION_VERB.is_match(&lowered) {
            score += ACTION_POINTS;
        } else {
            issues.push("no action verb found".into());
            suggestions
                .push("state the action to take, e.g. \"send\", \"save\" or \"update\"".into());
        }

        if DATA_NOUN.is_match(&lowered) {
            score += DATA_POINTS;
        } else {
            suggestions.push("mention the data being moved, e.g. rows, orders or messages".into());
        }

        let chars = lowered.chars().count();
        if chars >= 40 {
            score += LONG_TEXT_POINTS;
        } else if chars >= 20 {
            score += SHORT_TEXT_POINTS;
        } else {
            issues.push("description is very short".into());
        }

        let score = score.min(100);
        QualityReport {
            score,
            level: QualityLevel::from_score(score),
            issues,
            suggestions,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> IntentExtractor {
        IntentExtractor::builtin().unwrap()
    }

    #[test]
    fn empty_description_scores_zero() {
        let report = extractor().assess("");
        assert_eq!(report.score, 0);
        assert_eq!(report.level, QualityLevel::Poor);
        assert_eq!(report.issues, vec!["description is empty".to_string()]);
    }

    #[test]
    fn complete_description_scores_good() {
        let report = extractor()
            .assess("Send a Slack message when a new lead is added to Google Sheets");
        // trigger 25 + two services 20 + action 20 + noun 10 + length 15
        assert_eq!(report.score, 90);
        assert_eq!(report.level, QualityLevel::Good);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn vague_description_lists_issues() {
        let report = extractor().assess("do stuff");
        assert_eq!(report.level, QualityLevel::Poor);
        assert!(report.issues.iter().any(|i| i.contains("trigger")));
        assert!(report.issues.iter().any(|i| i.contains("services")));
        assert!(report.issues.iter().any(|i| i.contains("short")));
        assert!(!report.suggestions.is_empty());
    }

    #[test]
    fn trigger_hints_do_not_count_as_services() {
        let report = extractor().assess("run a webhook daily");
        assert!(report.issues.iter().any(|i| i.contains("services")));
    }

    #[test]
    fn level_buckets() {
        assert_eq!(QualityLevel::from_score(39), QualityLevel::Poor);
        assert_eq!(QualityLevel::from_score(40), QualityLevel::Fair);
        assert_eq!(QualityLevel::from_score(70), QualityLevel::Good);
    }
}
