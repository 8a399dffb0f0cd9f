//! Keyword dictionaries.
//!
//! [`KeywordConfig`] is the single configuration object behind intent
//! extraction.  It is built once at startup (usually via
//! [`KeywordConfig::builtin`]), wrapped in an `Arc`, and never mutated, so
//! concurrent requests can share it without locking.  The struct is plain
//! serde data and can also be loaded from TOML or JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Service tags
// ---------------------------------------------------------------------------

/// An integration target detected in a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTag {
    Slack,
    Discord,
    Telegram,
    Sms,
    Email,
    GoogleSheets,
    Airtable,
    Database,
    Postgres,
    Mysql,
    Mongodb,
    Http,
    Webhook,
    Schedule,
    Github,
    Notion,
    Trello,
    Stripe,
    Shopify,
    Hubspot,
    Openai,
    Calendar,
}

impl ServiceTag {
    /// Every tag, in declaration order.
    pub const ALL: [ServiceTag; 22] = [
        Self::Slack,
        Self::Discord,
        Self::Telegram,
        Self::Sms,
        Self::Email,
        Self::GoogleSheets,
        Self::Airtable,
        Self::Database,
        Self::Postgres,
        Self::Mysql,
        Self::Mongodb,
        Self::Http,
        Self::Webhook,
        Self::Schedule,
        Self::Github,
        Self::Notion,
        Self::Trello,
        Self::Stripe,
        Self::Shopify,
        Self::Hubspot,
        Self::Openai,
        Self::Calendar,
    ];

    /// The wire name of the tag (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slack => "slack",
            Self::Discord => "discord",
            Self::Telegram => "telegram",
            Self::Sms => "sms",
            Self::Email => "email",
            Self::GoogleSheets => "google_sheets",
            Self::Airtable => "airtable",
            Self::Database => "database",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mongodb => "mongodb",
            Self::Http => "http",
            Self::Webhook => "webhook",
            Self::Schedule => "schedule",
            Self::Github => "github",
            Self::Notion => "notion",
            Self::Trello => "trello",
            Self::Stripe => "stripe",
            Self::Shopify => "shopify",
            Self::Hubspot => "hubspot",
            Self::Openai => "openai",
            Self::Calendar => "calendar",
        }
    }

    /// Tags that describe how a workflow starts rather than a step in it.
    pub fn is_trigger_hint(self) -> bool {
        matches!(self, Self::Webhook | Self::Schedule)
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceTag {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown service tag `{s}`"))
    }
}

// ---------------------------------------------------------------------------
// Workflow types
// ---------------------------------------------------------------------------

/// Coarse classification of what a workflow is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    DataProcessing,
    Automation,
    Integration,
    Ecommerce,
    Monitoring,
    Notification,
    /// Fallback when no category wins outright.
    General,
}

impl WorkflowType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DataProcessing => "data_processing",
            Self::Automation => "automation",
            Self::Integration => "integration",
            Self::Ecommerce => "ecommerce",
            Self::Monitoring => "monitoring",
            Self::Notification => "notification",
            Self::General => "general",
        }
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// A phrase that scores `weight` points for a workflow type each time it
/// appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedKeyword {
    pub phrase: String,
    pub weight: u32,
}

impl WeightedKeyword {
    pub fn new(phrase: impl Into<String>, weight: u32) -> Self {
        Self {
            phrase: phrase.into(),
            weight,
        }
    }
}

/// Keywords that imply a service tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceKeywords {
    pub tag: ServiceTag,
    pub keywords: Vec<String>,
}

/// Weighted keywords that vote for a workflow type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeKeywords {
    pub workflow_type: WorkflowType,
    pub keywords: Vec<WeightedKeyword>,
}

/// The full, immutable keyword configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Service tag dictionaries.
    pub services: Vec<ServiceKeywords>,
    /// Workflow type dictionaries.
    pub workflow_types: Vec<TypeKeywords>,
    /// Regex patterns (matched against lower-cased text) that signal the
    /// description wants a conditional branch.
    pub conditional_patterns: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

fn weighted(list: &[(&str, u32)]) -> Vec<WeightedKeyword> {
    list.iter()
        .map(|(phrase, weight)| WeightedKeyword::new(*phrase, *weight))
        .collect()
}

impl KeywordConfig {
    /// The dictionaries shipped with flowsmith.
    ///
    /// Matching is case-insensitive and anchored at word boundaries; a
    /// trailing plural `s`/`es` is tolerated, so `sheet` also matches
    /// `sheets`.
    pub fn builtin() -> Self {
        use ServiceTag as T;

        let services = vec![
            (T::Slack, words(&["slack"])),
            (T::Discord, words(&["discord"])),
            (T::Telegram, words(&["telegram"])),
            (T::Sms, words(&["sms", "twilio", "text message"])),
            (
                T::Email,
                words(&["email", "e-mail", "gmail", "mail", "inbox", "outlook", "smtp"]),
            ),
            (
                T::GoogleSheets,
                words(&["google sheet", "gsheet", "spreadsheet", "sheet"]),
            ),
            (T::Airtable, words(&["airtable"])),
            (T::Database, words(&["database", "db", "sql"])),
            (T::Postgres, words(&["postgres", "postgresql"])),
            (T::Mysql, words(&["mysql", "mariadb"])),
            (T::Mongodb, words(&["mongodb", "mongo"])),
            (
                T::Http,
                words(&["http", "api", "rest", "endpoint", "url", "fetch", "request"]),
            ),
            (T::Webhook, words(&["webhook", "web hook", "callback"])),
            (
                T::Schedule,
                words(&[
                    "schedule",
                    "scheduled",
                    "daily",
                    "hourly",
                    "weekly",
                    "monthly",
                    "every day",
                    "every hour",
                    "every week",
                    "every month",
                    "every morning",
                    "every night",
                    "every minute",
                    "cron",
                ]),
            ),
            (T::Github, words(&["github", "pull request", "repository"])),
            (T::Notion, words(&["notion"])),
            (T::Trello, words(&["trello"])),
            (T::Stripe, words(&["stripe", "payment", "invoice"])),
            (T::Shopify, words(&["shopify", "online store"])),
            (T::Hubspot, words(&["hubspot", "crm"])),
            (
                T::Openai,
                words(&["openai", "gpt", "chatgpt", "ai", "llm", "summarize", "summarise"]),
            ),
            (
                T::Calendar,
                words(&["calendar", "google calendar", "meeting", "appointment"]),
            ),
        ]
        .into_iter()
        .map(|(tag, keywords)| ServiceKeywords { tag, keywords })
        .collect();

        use WorkflowType as W;

        let workflow_types = vec![
            (
                W::DataProcessing,
                weighted(&[
                    ("data", 1),
                    ("transform", 2),
                    ("etl", 3),
                    ("csv", 2),
                    ("process", 1),
                    ("clean", 2),
                    ("aggregate", 2),
                    ("parse", 2),
                    ("import", 1),
                    ("export", 1),
                    ("report", 1),
                    ("analyze", 2),
                    ("analyse", 2),
                ]),
            ),
            (
                W::Automation,
                weighted(&[
                    ("automate", 2),
                    ("automation", 2),
                    ("automatically", 2),
                    ("remind", 2),
                    ("reminder", 2),
                    ("trigger", 1),
                    ("when", 1),
                    ("every", 1),
                ]),
            ),
            (
                W::Integration,
                weighted(&[
                    ("integrate", 3),
                    ("integration", 3),
                    ("sync", 2),
                    ("synchronize", 2),
                    ("connect", 1),
                    ("between", 1),
                    ("api", 1),
                    ("crm", 2),
                    ("hubspot", 2),
                ]),
            ),
            (
                W::Ecommerce,
                weighted(&[
                    ("ecommerce", 3),
                    ("e-commerce", 3),
                    ("shopify", 3),
                    ("inventory", 3),
                    ("checkout", 3),
                    ("cart", 3),
                    ("refund", 3),
                    ("order", 2),
                    ("product", 2),
                    ("shop", 2),
                    ("payment", 2),
                    ("stripe", 2),
                    ("customer", 1),
                    ("store", 1),
                ]),
            ),
            (
                W::Monitoring,
                weighted(&[
                    ("monitor", 3),
                    ("uptime", 3),
                    ("downtime", 3),
                    ("threshold", 3),
                    ("latency", 3),
                    ("response time", 3),
                    ("alert", 2),
                    ("health", 2),
                    ("exceeds", 2),
                    ("error", 1),
                ]),
            ),
            (
                W::Notification,
                weighted(&[
                    ("notify", 2),
                    ("notification", 2),
                    ("announce", 2),
                    ("message", 1),
                    ("send", 1),
                    ("slack", 1),
                    ("email", 1),
                ]),
            ),
        ]
        .into_iter()
        .map(|(workflow_type, keywords)| TypeKeywords {
            workflow_type,
            keywords,
        })
        .collect();

        let conditional_patterns = words(&[
            r"\bif\b",
            r"\bunless\b",
            r"\bonly when\b",
            r"\bwhether\b",
            r"\b(?:exceeds?|greater than|more than|less than|fewer than|above|below|over|under)\s+\$?\d",
        ]);

        Self {
            services,
            workflow_types,
            conditional_patterns,
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
