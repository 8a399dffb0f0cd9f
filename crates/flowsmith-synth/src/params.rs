//! Parameter filling.
//!
//! Every node starts from its template's parameter skeleton.  The filler
//! overlays values pulled out of the description (addresses, channels,
//! URLs, table names, schedules, thresholds) and falls back to clearly
//! marked `={{ $json.* }}` expressions when nothing is found, so no field
//! is ever left empty.  Dispatch is a single `match` on [`NodeKind`].

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Map, Value, json};
use url::Url;

use crate::catalog::{Catalog, NodeKind};
use crate::selector::NodeInstance;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("static email regex")
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("static url regex"));

static CHANNEL_HASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)#([a-z0-9][a-z0-9_-]*)").expect("static channel regex")
});

static CHANNEL_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([a-z0-9][a-z0-9_-]*)\s+channel\b").expect("static channel regex")
});

static HTTP_METHOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(GET|POST|PUT|PATCH|DELETE)\b").expect("static method regex"));

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]{1,64})"|'([^']{1,64})'"#).expect("static quote regex"));

static NAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:named|called)\s+([A-Za-z0-9_-]+)").expect("static named regex")
});

static TABLE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([a-z0-9_]+)\s+(?:table|sheet|collection)\b").expect("static table regex")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+\d{7,15}\b").expect("static phone regex"));

static REPOSITORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\brepo(?:sitory)?\s+([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)")
        .expect("static repo regex")
});

static EVERY_N: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bevery\s+(\d{1,3})\s+(minute|hour|day|week|month)s?\b")
        .expect("static interval regex")
});

static AT_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bat\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)?\b").expect("static time regex")
});

static THRESHOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([a-z][a-z ]*?)\s+(exceeds?|is greater than|greater than|more than|is above|above|over|is less than|less than|fewer than|is below|below|under|equals|is equal to|is)\s+\$?(\d+(?:\.\d+)?)",
    )
    .expect("static threshold regex")
});

/// Words ignored when deriving names, paths and field names.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "to", "of", "in", "on", "for", "from", "with", "into", "is",
    "are", "be", "when", "whenever", "if", "then", "it", "its", "that", "this", "new", "my",
    "our", "each", "every", "all", "any", "by", "at", "as", "so", "me", "us", "i", "we", "you",
    "their", "there", "was", "gets", "get", "has", "have", "only", "unless", "while",
];

const CLAUSE_WORDS: &[&str] = &["if", "when", "whenever", "unless", "once", "while", "where"];

/// Channel words that are not channel names.
const NOT_CHANNELS: &[&str] = &["slack", "discord", "telegram", "a", "the", "our", "my", "team"];

const CODE_COMMENT_LIMIT: usize = 80;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Values pulled out of one description.  Extracted once per request and
/// shared across all nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entities {
    pub email: Option<String>,
    pub channel: Option<String>,
    pub url: Option<String>,
    pub http_method: Option<String>,
    pub table: Option<String>,
    pub phone: Option<String>,
    pub repository: Option<(String, String)>,
    pub condition: Option<Condition>,
}

/// A numeric comparison found in the text ("response time exceeds 2").
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// camelCase field name.
    pub field: String,
    /// Platform operation name: `larger`, `smaller` or `equal`.
    pub operation: &'static str,
    pub value: Value,
}

impl Entities {
    pub fn extract(description: &str) -> Self {
        let lowered = description.to_lowercase();
        Self {
            email: EMAIL.find(description).map(|m| m.as_str().to_string()),
            channel: find_channel(&lowered),
            url: find_url(description),
            http_method: HTTP_METHOD
                .captures(description)
                .map(|c| c[1].to_string()),
            table: find_table(description, &lowered),
            phone: PHONE.find(description).map(|m| m.as_str().to_string()),
            repository: REPOSITORY
                .captures(description)
                .map(|c| (c[1].to_string(), c[2].to_string())),
            condition: find_condition(&lowered),
        }
    }
}

fn find_channel(lowered: &str) -> Option<String> {
    if let Some(caps) = CHANNEL_HASH.captures(lowered) {
        return Some(caps[1].to_string());
    }
    CHANNEL_WORD
        .captures_iter(lowered)
        .map(|c| c[1].to_string())
        .find(|word| !NOT_CHANNELS.contains(&word.as_str()) && !STOPWORDS.contains(&word.as_str()))
}

fn find_url(description: &str) -> Option<String> {
    URL.find_iter(description)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ')', '!', '?']))
        .find(|candidate| Url::parse(candidate).is_ok())
        .map(str::to_string)
}

fn find_table(description: &str, lowered: &str) -> Option<String> {
    if let Some(caps) = QUOTED.captures(description) {
        let quoted = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().trim());
        if let Some(name) = quoted.filter(|q| !q.is_empty()) {
            return Some(name.to_string());
        }
    }
    if let Some(caps) = NAMED.captures(description) {
        return Some(caps[1].to_string());
    }
    TABLE_WORD
        .captures_iter(lowered)
        .map(|c| c[1].to_string())
        .find(|word| {
            !STOPWORDS.contains(&word.as_str())
                && !matches!(word.as_str(), "google" | "spreadsheet" | "database" | "db")
        })
}

fn find_condition(lowered: &str) -> Option<Condition> {
    let caps = THRESHOLD.captures(lowered)?;
    // The compared quantity follows the last clause word ("alert if <x>").
    let words: Vec<&str> = caps[1].split_whitespace().collect();
    let clause_start = words
        .iter()
        .rposition(|w| CLAUSE_WORDS.contains(w))
        .map_or(0, |i| i + 1);
    let subject: Vec<&str> = words[clause_start..]
        .iter()
        .copied()
        .filter(|w| !STOPWORDS.contains(w))
        .collect();
    let tail = &subject[subject.len().saturating_sub(2)..];
    let field = if tail.is_empty() {
        "value".to_string()
    } else {
        camel_case(tail)
    };

    let operation = match &caps[2] {
        "exceeds" | "exceed" | "is greater than" | "greater than" | "more than" | "is above"
        | "above" | "over" => "larger",
        "is less than" | "less than" | "fewer than" | "is below" | "below" | "under" => "smaller",
        _ => "equal",
    };

    let raw = &caps[3];
    let value = match raw.parse::<i64>() {
        Ok(n) => json!(n),
        Err(_) => raw.parse::<f64>().map(|f| json!(f)).unwrap_or(json!(0)),
    };

    Some(Condition {
        field,
        operation,
        value,
    })
}

fn camel_case(words: &[&str]) -> String {
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        let clean: String = word.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if i == 0 {
            out.push_str(&clean);
        } else {
            let mut chars = clean.chars();
            if let Some(first) = chars.next() {
                out.push(first.to_ascii_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

/// Up to `limit` non-stopword words of `text`, lower-cased, punctuation
/// stripped.
pub(crate) fn content_words(text: &str, limit: usize) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(&w.as_str()))
        .take(limit)
        .collect()
}

fn placeholder(field: &str) -> Value {
    Value::String(format!("={{{{ $json.{field} }}}}"))
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// The schedule rule described by `lowered`, defaulting to daily at 09:00.
fn schedule_rule(lowered: &str) -> Value {
    let (field, every) = if let Some(caps) = EVERY_N.captures(lowered) {
        let n: u32 = caps[1].parse().unwrap_or(1).max(1);
        let unit = match &caps[2] {
            "minute" => "minutes",
            "hour" => "hours",
            "week" => "weeks",
            "month" => "months",
            _ => "days",
        };
        (unit, n)
    } else if lowered.contains("every minute") {
        ("minutes", 1)
    } else if lowered.contains("hourly") || lowered.contains("every hour") {
        ("hours", 1)
    } else if lowered.contains("weekly") || lowered.contains("every week") {
        ("weeks", 1)
    } else if lowered.contains("monthly") || lowered.contains("every month") {
        ("months", 1)
    } else {
        ("days", 1)
    };

    let mut interval = Map::new();
    interval.insert("field".into(), json!(field));
    let key = format!("{}Interval", field);
    interval.insert(key, json!(every));

    if matches!(field, "days" | "weeks" | "months") {
        let (hour, minute) = time_of_day(lowered);
        interval.insert("triggerAtHour".into(), json!(hour));
        if minute > 0 {
            interval.insert("triggerAtMinute".into(), json!(minute));
        }
    }

    json!({ "rule": { "interval": [Value::Object(interval)] } })
}

fn time_of_day(lowered: &str) -> (u32, u32) {
    if let Some(caps) = AT_TIME.captures(lowered) {
        let hour: u32 = caps[1].parse().unwrap_or(9);
        let minute: u32 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .filter(|m| *m < 60)
            .unwrap_or(0);
        let hour = match caps.get(3).map(|m| m.as_str()) {
            Some("pm") if hour < 12 => hour + 12,
            Some("am") if hour == 12 => 0,
            _ => hour,
        };
        if hour < 24 {
            return (hour, minute);
        }
    }
    if lowered.contains("night") || lowered.contains("evening") {
        (21, 0)
    } else {
        (9, 0)
    }
}

// ---------------------------------------------------------------------------
// Filler
// ---------------------------------------------------------------------------

/// Per-request inputs shared by every node.
#[derive(Debug, Clone)]
pub struct FillContext {
    description: String,
    lowered: String,
    entities: Entities,
    /// Whether the workflow ends in a respond node.
    responds: bool,
}

impl FillContext {
    pub fn new(description: &str, responds: bool) -> Self {
        let description = description.trim().to_string();
        Self {
            lowered: description.to_lowercase(),
            entities: Entities::extract(&description),
            description,
            responds,
        }
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }
}

#[derive(Debug, Clone)]
pub struct ParameterFiller {
    catalog: Arc<Catalog>,
}

impl ParameterFiller {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Parameters for one node: the template skeleton plus whatever the
    /// description supplies.  Never fails.
    pub fn fill(&self, node: &NodeInstance, ctx: &FillContext) -> Map<String, Value> {
        let mut params = match &self.catalog.template(node.kind).parameters {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        if let Value::Object(extra) = self.contextual(node.kind, ctx) {
            params.extend(extra);
        }
        params
    }

    fn contextual(&self, kind: NodeKind, ctx: &FillContext) -> Value {
        let e = &ctx.entities;
        let or_placeholder = |value: &Option<String>, field: &str| {
            value
                .as_ref()
                .map(|v| Value::String(v.clone()))
                .unwrap_or_else(|| placeholder(field))
        };

        match kind {
            NodeKind::WebhookTrigger => {
                let words = content_words(&ctx.description, 3);
                let path = if words.is_empty() {
                    "flowsmith-hook".to_string()
                } else {
                    words.join("-")
                };
                let response_mode = if ctx.responds { "responseNode" } else { "onReceived" };
                json!({
                    "httpMethod": "POST",
                    "path": path,
                    "responseMode": response_mode,
                })
            }
            NodeKind::ScheduleTrigger => schedule_rule(&ctx.lowered),
            NodeKind::ManualTrigger => json!({}),

            NodeKind::Slack => {
                let channel = e
                    .channel
                    .as_ref()
                    .map(|c| Value::String(format!("#{c}")))
                    .unwrap_or_else(|| placeholder("channel"));
                json!({ "channel": channel, "text": placeholder("message") })
            }
            NodeKind::Discord => json!({ "text": placeholder("message") }),
            NodeKind::Telegram => json!({
                "chatId": placeholder("chatId"),
                "text": placeholder("message")
            }),
            NodeKind::Sms => json!({
                "from": placeholder("fromNumber"),
                "to": or_placeholder(&e.phone, "phone"),
                "message": placeholder("message"),
            }),
            NodeKind::Email => json!({
                "sendTo": or_placeholder(&e.email, "email"),
                "subject": subject_line(&ctx.description),
                "message": placeholder("message"),
            }),

            NodeKind::GoogleSheets => {
                let reads = ["read", "lookup", "look up", "fetch rows", "get rows"]
                    .iter()
                    .any(|w| ctx.lowered.contains(w));
                json!({
                    "operation": if reads { "read" } else { "append" },
                    "documentId": placeholder("spreadsheetId"),
                    "sheetName": e.table.clone().unwrap_or_else(|| "Sheet1".into()),
                })
            }
            NodeKind::Airtable => json!({
                "operation": "append",
                "base": placeholder("baseId"),
                "table": or_placeholder(&e.table, "table"),
            }),
            NodeKind::Postgres | NodeKind::Mysql => {
                let queries = ["query", "select"].iter().any(|w| ctx.lowered.contains(w));
                if queries {
                    json!({ "operation": "executeQuery", "query": placeholder("query") })
                } else {
                    json!({
                        "operation": "insert",
                        "table": or_placeholder(&e.table, "table"),
                        "columns": placeholder("columns"),
                    })
                }
            }
            NodeKind::Mongodb => json!({
                "operation": "insert",
                "collection": or_placeholder(&e.table, "collection"),
                "fields": placeholder("fields"),
            }),
            NodeKind::HttpRequest => json!({
                "method": e.http_method.clone().unwrap_or_else(|| "GET".into()),
                "url": or_placeholder(&e.url, "url"),
            }),
            NodeKind::Github => {
                let (owner, repository) = match &e.repository {
                    Some((owner, repo)) => (json!(owner), json!(repo)),
                    None => (placeholder("owner"), placeholder("repository")),
                };
                json!({ "owner": owner, "repository": repository, "title": placeholder("title") })
            }
            NodeKind::Notion => json!({
                "databaseId": placeholder("databaseId"),
                "title": placeholder("title")
            }),
            NodeKind::Trello => json!({
                "listId": placeholder("listId"),
                "name": placeholder("title")
            }),
            NodeKind::Stripe => json!({ "customerId": placeholder("customerId") }),
            NodeKind::Shopify => json!({ "orderId": placeholder("orderId") }),
            NodeKind::Hubspot => json!({ "email": or_placeholder(&e.email, "email") }),
            NodeKind::OpenAi => json!({
                "prompt": instruction(&ctx.description),
                "text": placeholder("text"),
            }),
            NodeKind::GoogleCalendar => json!({
                "calendar": e.email.clone().unwrap_or_else(|| "primary".into()),
                "start": placeholder("start"),
                "end": placeholder("end"),
            }),

            NodeKind::If => condition_parameters(e.condition.as_ref()),
            NodeKind::ProcessData => json!({ "jsCode": process_code(&ctx.description) }),
            NodeKind::Validate => json!({
                "jsCode": "const items = $input.all();\nif (items.length === 0) {\n  throw new Error('No input data');\n}\nreturn items;",
            }),
            NodeKind::Transform => json!({
                "values": {
                    "string": [{ "name": "processedAt", "value": "={{ $now.toISO() }}" }]
                }
            }),
            NodeKind::Enrich => json!({
                "jsCode": "return $input.all().map(item => ({\n  json: { ...item.json, enrichedAt: new Date().toISOString() }\n}));",
            }),
            NodeKind::Aggregate => json!({
                "jsCode": "const items = $input.all();\nreturn [{ json: { count: items.length, items: items.map(i => i.json) } }];",
            }),
            NodeKind::LogExecution => json!({
                "jsCode": "console.log(`processed ${$input.all().length} items`);\nreturn $input.all();",
            }),
            NodeKind::NoOp => json!({}),
            NodeKind::RespondToWebhook => json!({
                "responseBody": "={{ { \"success\": true } }}",
            }),
        }
    }
}

fn condition_parameters(condition: Option<&Condition>) -> Value {
    match condition {
        Some(c) => json!({
            "conditions": {
                "number": [{
                    "value1": placeholder(&c.field),
                    "operation": c.operation,
                    "value2": c.value,
                }]
            }
        }),
        None => json!({
            "conditions": {
                "boolean": [{ "value1": "={{ true }}", "value2": true }]
            }
        }),
    }
}

fn one_line(description: &str) -> String {
    let flat: String = description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if flat.chars().count() > CODE_COMMENT_LIMIT {
        let cut: String = flat.chars().take(CODE_COMMENT_LIMIT).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

fn process_code(description: &str) -> String {
    let summary = one_line(description);
    let header = if summary.is_empty() {
        "// Process incoming items".to_string()
    } else {
        format!("// {summary}")
    };
    format!("{header}\nreturn $input.all().map(item => ({{ json: item.json }}));")
}

fn subject_line(description: &str) -> String {
    let summary = one_line(description);
    if summary.is_empty() {
        "Workflow notification".into()
    } else {
        summary
    }
}

fn instruction(description: &str) -> String {
    let summary = one_line(description);
    if summary.is_empty() {
        "Summarize the following input.".into()
    } else {
        format!("Task: {summary}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(kind: NodeKind, description: &str, responds: bool) -> Map<String, Value> {
        let filler = ParameterFiller::new(Arc::new(Catalog::builtin()));
        let node = NodeInstance {
            kind,
            name: "n".into(),
            position: [0, 0],
        };
        filler.fill(&node, &FillContext::new(description, responds))
    }

    #[test]
    fn extracts_email_and_channel() {
        let e = Entities::extract("Email ops@example.com and post to #alerts on Slack");
        assert_eq!(e.email.as_deref(), Some("ops@example.com"));
        assert_eq!(e.channel.as_deref(), Some("alerts"));
    }

    #[test]
    fn channel_word_form() {
        let e = Entities::extract("post in the marketing channel on slack");
        assert_eq!(e.channel.as_deref(), Some("marketing"));
        let e = Entities::extract("post to the slack channel");
        assert_eq!(e.channel, None);
    }

    #[test]
    fn extracts_url_and_method() {
        let e = Entities::extract("POST the data to https://api.example.com/v1/items.");
        assert_eq!(e.url.as_deref(), Some("https://api.example.com/v1/items"));
        assert_eq!(e.http_method.as_deref(), Some("POST"));
    }

    #[test]
    fn extracts_table_names() {
        assert_eq!(
            Entities::extract(r#"append to the sheet "Leads 2024""#).table.as_deref(),
            Some("Leads 2024")
        );
        assert_eq!(
            Entities::extract("insert into a table named orders").table.as_deref(),
            Some("orders")
        );
        assert_eq!(
            Entities::extract("save it to the customers table").table.as_deref(),
            Some("customers")
        );
    }

    #[test]
    fn extracts_threshold_condition() {
        let c = Entities::extract("alert if response time exceeds 2 seconds")
            .condition
            .unwrap();
        assert_eq!(c.field, "responseTime");
        assert_eq!(c.operation, "larger");
        assert_eq!(c.value, json!(2));

        let c = Entities::extract("notify when stock is below 10.5").condition.unwrap();
        assert_eq!(c.field, "stock");
        assert_eq!(c.operation, "smaller");
        assert_eq!(c.value, json!(10.5));
    }

    #[test]
    fn missing_values_become_placeholders() {
        let params = fill(NodeKind::Email, "send an email", false);
        assert_eq!(params["sendTo"], "={{ $json.email }}");
        assert_eq!(params["operation"], "send");

        let params = fill(NodeKind::Slack, "", false);
        assert_eq!(params["channel"], "={{ $json.channel }}");
        assert_eq!(params["resource"], "message");
    }

    #[test]
    fn slack_channel_is_filled() {
        let params = fill(NodeKind::Slack, "post to #sales", false);
        assert_eq!(params["channel"], "#sales");
    }

    #[test]
    fn inert_condition_without_threshold() {
        let params = fill(NodeKind::If, "if something happens", false);
        assert_eq!(params["conditions"]["boolean"][0]["value2"], true);
    }

    #[test]
    fn numeric_condition_with_threshold() {
        let params = fill(NodeKind::If, "alert if response time exceeds 2 seconds", false);
        let rule = &params["conditions"]["number"][0];
        assert_eq!(rule["value1"], "={{ $json.responseTime }}");
        assert_eq!(rule["operation"], "larger");
        assert_eq!(rule["value2"], 2);
    }

    #[test]
    fn webhook_uses_response_node_when_present() {
        let params = fill(NodeKind::WebhookTrigger, "Sync new leads to HubSpot", true);
        assert_eq!(params["responseMode"], "responseNode");
        assert_eq!(params["path"], "sync-leads-hubspot");
        let params = fill(NodeKind::WebhookTrigger, "", false);
        assert_eq!(params["responseMode"], "onReceived");
        assert_eq!(params["path"], "flowsmith-hook");
    }

    #[test]
    fn schedule_defaults_to_daily_nine() {
        let params = fill(NodeKind::ScheduleTrigger, "back up the database", false);
        let rule = &params["rule"]["interval"][0];
        assert_eq!(rule["field"], "days");
        assert_eq!(rule["daysInterval"], 1);
        assert_eq!(rule["triggerAtHour"], 9);
    }

    #[test]
    fn schedule_parses_intervals_and_times() {
        let rule = schedule_rule("every 15 minutes check the api");
        assert_eq!(rule["rule"]["interval"][0]["field"], "minutes");
        assert_eq!(rule["rule"]["interval"][0]["minutesInterval"], 15);

        let rule = schedule_rule("every week at 5:30 pm send a report");
        let interval = &rule["rule"]["interval"][0];
        assert_eq!(interval["field"], "weeks");
        assert_eq!(interval["triggerAtHour"], 17);
        assert_eq!(interval["triggerAtMinute"], 30);

        let rule = schedule_rule("hourly sync");
        assert_eq!(rule["rule"]["interval"][0]["hoursInterval"], 1);
    }

    #[test]
    fn code_comment_is_truncated() {
        let long = "word ".repeat(40);
        let code = process_code(&long);
        let first = code.lines().next().unwrap();
        assert!(first.ends_with("..."));
        assert!(first.chars().count() <= CODE_COMMENT_LIMIT + 6);
    }

    #[test]
    fn content_words_skip_stopwords() {
        assert_eq!(
            content_words("Send a Slack message when a new lead arrives", 4),
            vec!["send", "slack", "message", "lead"]
        );
    }
}
