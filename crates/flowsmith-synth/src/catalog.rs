//! Node template catalog.
//!
//! A static, read-only table of node templates.  Every [`NodeKind`] has
//! exactly one template, so [`Catalog::template`] is total; service tags
//! map onto a subset of kinds through [`Catalog::lookup`].

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Value, json};

use flowsmith_intent::ServiceTag;

use crate::request::TriggerKind;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Every node flowsmith knows how to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    // Triggers.
    WebhookTrigger,
    ScheduleTrigger,
    ManualTrigger,

    // Services.
    Slack,
    Discord,
    Telegram,
    Sms,
    Email,
    GoogleSheets,
    Airtable,
    Postgres,
    Mysql,
    Mongodb,
    HttpRequest,
    Github,
    Notion,
    Trello,
    Stripe,
    Shopify,
    Hubspot,
    OpenAi,
    GoogleCalendar,

    // Logic and processing.
    If,
    ProcessData,
    Validate,
    Transform,
    Enrich,
    Aggregate,
    LogExecution,
    NoOp,
    RespondToWebhook,
}

impl NodeKind {
    /// Every kind, in declaration order.  [`Catalog`] relies on this order.
    pub const ALL: [NodeKind; 31] = [
        Self::WebhookTrigger,
        Self::ScheduleTrigger,
        Self::ManualTrigger,
        Self::Slack,
        Self::Discord,
        Self::Telegram,
        Self::Sms,
        Self::Email,
        Self::GoogleSheets,
        Self::Airtable,
        Self::Postgres,
        Self::Mysql,
        Self::Mongodb,
        Self::HttpRequest,
        Self::Github,
        Self::Notion,
        Self::Trello,
        Self::Stripe,
        Self::Shopify,
        Self::Hubspot,
        Self::OpenAi,
        Self::GoogleCalendar,
        Self::If,
        Self::ProcessData,
        Self::Validate,
        Self::Transform,
        Self::Enrich,
        Self::Aggregate,
        Self::LogExecution,
        Self::NoOp,
        Self::RespondToWebhook,
    ];

    /// Generic processing nodes used to pad sparse workflows, in the order
    /// they are added.
    pub const PADDING: [NodeKind; 5] = [
        Self::Validate,
        Self::Transform,
        Self::Enrich,
        Self::Aggregate,
        Self::LogExecution,
    ];

    pub fn trigger(kind: TriggerKind) -> Self {
        match kind {
            TriggerKind::Webhook => Self::WebhookTrigger,
            TriggerKind::Schedule => Self::ScheduleTrigger,
            TriggerKind::Manual => Self::ManualTrigger,
        }
    }

    pub fn is_trigger(self) -> bool {
        matches!(
            self,
            Self::WebhookTrigger | Self::ScheduleTrigger | Self::ManualTrigger
        )
    }

    /// Nodes with two logical outputs (true / false).
    pub fn is_conditional(self) -> bool {
        matches!(self, Self::If)
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Stable wire key, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WebhookTrigger => "webhook_trigger",
            Self::ScheduleTrigger => "schedule_trigger",
            Self::ManualTrigger => "manual_trigger",
            Self::Slack => "slack",
            Self::Discord => "discord",
            Self::Telegram => "telegram",
            Self::Sms => "sms",
            Self::Email => "email",
            Self::GoogleSheets => "google_sheets",
            Self::Airtable => "airtable",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mongodb => "mongodb",
            Self::HttpRequest => "http_request",
            Self::Github => "github",
            Self::Notion => "notion",
            Self::Trello => "trello",
            Self::Stripe => "stripe",
            Self::Shopify => "shopify",
            Self::Hubspot => "hubspot",
            Self::OpenAi => "open_ai",
            Self::GoogleCalendar => "google_calendar",
            Self::If => "if",
            Self::ProcessData => "process_data",
            Self::Validate => "validate",
            Self::Transform => "transform",
            Self::Enrich => "enrich",
            Self::Aggregate => "aggregate",
            Self::LogExecution => "log_execution",
            Self::NoOp => "no_op",
            Self::RespondToWebhook => "respond_to_webhook",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad grouping used to avoid emitting interchangeable nodes twice.
///
/// Only backends that do the same job share a category: the relational and
/// document databases all collapse into [`Category::Database`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Trigger,
    Slack,
    Discord,
    Telegram,
    Sms,
    Email,
    Spreadsheet,
    Airtable,
    Database,
    Http,
    CodeHosting,
    Docs,
    ProjectManagement,
    Payments,
    Commerce,
    Crm,
    Ai,
    Calendar,
    Logic,
    Processing,
    Response,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Slack => "slack",
            Self::Discord => "discord",
            Self::Telegram => "telegram",
            Self::Sms => "sms",
            Self::Email => "email",
            Self::Spreadsheet => "spreadsheet",
            Self::Airtable => "airtable",
            Self::Database => "database",
            Self::Http => "http",
            Self::CodeHosting => "code_hosting",
            Self::Docs => "docs",
            Self::ProjectManagement => "project_management",
            Self::Payments => "payments",
            Self::Commerce => "commerce",
            Self::Crm => "crm",
            Self::Ai => "ai",
            Self::Calendar => "calendar",
            Self::Logic => "logic",
            Self::Processing => "processing",
            Self::Response => "response",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a service node sits in a chain: data steps first, then AI
/// processing, then notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Entry,
    Data,
    Process,
    Notify,
    Exit,
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// A reusable skeleton from which node instances are stamped.
#[derive(Debug, Clone, Serialize)]
pub struct NodeTemplate {
    pub kind: NodeKind,
    /// Node type identifier in the target platform.
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub type_version: u32,
    /// Default display name.
    pub name: &'static str,
    pub category: Category,
    pub stage: Stage,
    /// Static parameters the filler starts from.
    pub parameters: Value,
}

/// The public listing of one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub key: NodeKind,
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub name: &'static str,
    pub category: Category,
}

impl NodeTemplate {
    pub fn entry(&self) -> CatalogEntry {
        CatalogEntry {
            key: self.kind,
            node_type: self.node_type,
            name: self.name,
            category: self.category,
        }
    }
}

#[rustfmt::skip]
fn template(kind: NodeKind) -> NodeTemplate {
    use Category as C;
    use NodeKind as K;
    use Stage as S;

    let (node_type, type_version, name, category, stage, parameters) = match kind {
        K::WebhookTrigger => ("n8n-nodes-base.webhook", 1, "Webhook", C::Trigger, S::Entry, json!({"options": {}})),
        K::ScheduleTrigger => ("n8n-nodes-base.scheduleTrigger", 1, "Schedule Trigger", C::Trigger, S::Entry, json!({})),
        K::ManualTrigger => ("n8n-nodes-base.manualTrigger", 1, "Manual Trigger", C::Trigger, S::Entry, json!({})),

        K::Slack => ("n8n-nodes-base.slack", 2, "Send Slack Message", C::Slack, S::Notify, json!({"resource": "message", "operation": "post"})),
        K::Discord => ("n8n-nodes-base.discord", 1, "Send Discord Message", C::Discord, S::Notify, json!({})),
        K::Telegram => ("n8n-nodes-base.telegram", 1, "Send Telegram Message", C::Telegram, S::Notify, json!({"resource": "message", "operation": "sendMessage"})),
        K::Sms => ("n8n-nodes-base.twilio", 1, "Send SMS", C::Sms, S::Notify, json!({"operation": "send"})),
        K::Email => ("n8n-nodes-base.gmail", 2, "Send Email", C::Email, S::Notify, json!({"resource": "message", "operation": "send"})),
        K::GoogleSheets => ("n8n-nodes-base.googleSheets", 4, "Google Sheets", C::Spreadsheet, S::Data, json!({})),
        K::Airtable => ("n8n-nodes-base.airtable", 2, "Airtable", C::Airtable, S::Data, json!({})),
        K::Postgres => ("n8n-nodes-base.postgres", 2, "Postgres", C::Database, S::Data, json!({"schema": "public"})),
        K::Mysql => ("n8n-nodes-base.mySql", 2, "MySQL", C::Database, S::Data, json!({})),
        K::Mongodb => ("n8n-nodes-base.mongoDb", 1, "MongoDB", C::Database, S::Data, json!({})),
        K::HttpRequest => ("n8n-nodes-base.httpRequest", 4, "HTTP Request", C::Http, S::Data, json!({"options": {}})),
        K::Github => ("n8n-nodes-base.github", 1, "GitHub", C::CodeHosting, S::Data, json!({"resource": "issue", "operation": "create"})),
        K::Notion => ("n8n-nodes-base.notion", 2, "Notion", C::Docs, S::Data, json!({"resource": "databasePage", "operation": "create"})),
        K::Trello => ("n8n-nodes-base.trello", 1, "Trello", C::ProjectManagement, S::Data, json!({"resource": "card", "operation": "create"})),
        K::Stripe => ("n8n-nodes-base.stripe", 1, "Stripe", C::Payments, S::Data, json!({"resource": "customer", "operation": "get"})),
        K::Shopify => ("n8n-nodes-base.shopify", 1, "Shopify", C::Commerce, S::Data, json!({"resource": "order", "operation": "get"})),
        K::Hubspot => ("n8n-nodes-base.hubspot", 2, "HubSpot", C::Crm, S::Data, json!({"resource": "contact", "operation": "upsert"})),
        K::OpenAi => ("n8n-nodes-base.openAi", 1, "OpenAI", C::Ai, S::Process, json!({"resource": "chat", "model": "gpt-4o-mini"})),
        K::GoogleCalendar => ("n8n-nodes-base.googleCalendar", 1, "Google Calendar", C::Calendar, S::Data, json!({"resource": "event", "operation": "create"})),

        K::If => ("n8n-nodes-base.if", 1, "Check Condition", C::Logic, S::Process, json!({})),
        K::ProcessData => ("n8n-nodes-base.code", 2, "Process Data", C::Processing, S::Process, json!({})),
        K::Validate => ("n8n-nodes-base.code", 2, "Validate Input", C::Processing, S::Process, json!({})),
        K::Transform => ("n8n-nodes-base.set", 2, "Format Data", C::Processing, S::Process, json!({"keepOnlySet": false})),
        K::Enrich => ("n8n-nodes-base.code", 2, "Enrich Data", C::Processing, S::Process, json!({})),
        K::Aggregate => ("n8n-nodes-base.code", 2, "Aggregate Results", C::Processing, S::Process, json!({})),
        K::LogExecution => ("n8n-nodes-base.code", 2, "Log Execution", C::Processing, S::Process, json!({})),
        K::NoOp => ("n8n-nodes-base.noOp", 1, "No Action Needed", C::Logic, S::Exit, json!({})),
        K::RespondToWebhook => ("n8n-nodes-base.respondToWebhook", 1, "Respond to Webhook", C::Response, S::Exit, json!({"respondWith": "json"})),
    };

    NodeTemplate {
        kind,
        node_type,
        type_version,
        name,
        category,
        stage,
        parameters,
    }
}

/// Whether a platform node type string denotes a trigger.
///
/// Covers the kinds flowsmith emits plus the platform convention of
/// suffixing trigger node types with `Trigger`.
pub fn is_trigger_type(node_type: &str) -> bool {
    node_type == "n8n-nodes-base.webhook" || node_type.ends_with("Trigger")
}

/// Whether a platform node type string answers the webhook caller.
pub fn is_respond_type(node_type: &str) -> bool {
    node_type == "n8n-nodes-base.respondToWebhook"
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The read-only template table.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Indexed by `NodeKind as usize`.
    templates: Vec<NodeTemplate>,
    by_tag: HashMap<ServiceTag, NodeKind>,
}

impl Catalog {
    /// The templates shipped with flowsmith.
    pub fn builtin() -> Self {
        let templates = NodeKind::ALL.iter().map(|kind| template(*kind)).collect();

        use NodeKind as K;
        use ServiceTag as T;
        let by_tag = [
            (T::Slack, K::Slack),
            (T::Discord, K::Discord),
            (T::Telegram, K::Telegram),
            (T::Sms, K::Sms),
            (T::Email, K::Email),
            (T::GoogleSheets, K::GoogleSheets),
            (T::Airtable, K::Airtable),
            (T::Database, K::Postgres),
            (T::Postgres, K::Postgres),
            (T::Mysql, K::Mysql),
            (T::Mongodb, K::Mongodb),
            (T::Http, K::HttpRequest),
            (T::Github, K::Github),
            (T::Notion, K::Notion),
            (T::Trello, K::Trello),
            (T::Stripe, K::Stripe),
            (T::Shopify, K::Shopify),
            (T::Hubspot, K::Hubspot),
            (T::Openai, K::OpenAi),
            (T::Calendar, K::GoogleCalendar),
        ]
        .into_iter()
        .collect();

        Self { templates, by_tag }
    }

    /// The template for a service tag, if the tag maps to a node.
    ///
    /// Trigger hints (`webhook`, `schedule`) have no action template.
    pub fn lookup(&self, tag: ServiceTag) -> Option<&NodeTemplate> {
        self.by_tag.get(&tag).map(|kind| self.template(*kind))
    }

    #[cfg(test)]
    fn lookup_str(&self, tag: &str) -> Option<&NodeTemplate> {
        tag.parse::<ServiceTag>().ok().and_then(|tag| self.lookup(tag))
    }

    /// The template for a kind.
    pub fn template(&self, kind: NodeKind) -> &NodeTemplate {
        &self.templates[kind.index()]
    }

    /// All templates in declaration order.
    pub fn entries(&self) -> &[NodeTemplate] {
        &self.templates
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_its_own_template() {
        let catalog = Catalog::builtin();
        for kind in NodeKind::ALL {
            assert_eq!(catalog.template(kind).kind, kind);
        }
    }

    #[test]
    fn template_names_are_distinct() {
        let catalog = Catalog::builtin();
        let mut names: Vec<&str> = catalog.entries().iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), NodeKind::ALL.len());
    }

    #[test]
    fn every_trigger_kind_is_present() {
        let catalog = Catalog::builtin();
        for trigger in [TriggerKind::Webhook, TriggerKind::Schedule, TriggerKind::Manual] {
            let tpl = catalog.template(NodeKind::trigger(trigger));
            assert!(tpl.kind.is_trigger());
            assert!(is_trigger_type(tpl.node_type));
        }
    }

    #[test]
    fn lookup_by_tag() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.lookup(ServiceTag::Slack).unwrap().kind, NodeKind::Slack);
        assert_eq!(
            catalog.lookup_str("google_sheets").unwrap().node_type,
            "n8n-nodes-base.googleSheets"
        );
        assert!(catalog.lookup(ServiceTag::Webhook).is_none());
        assert!(catalog.lookup(ServiceTag::Schedule).is_none());
        assert!(catalog.lookup_str("fax").is_none());
    }

    #[test]
    fn database_tags_share_a_category() {
        let catalog = Catalog::builtin();
        let cats: Vec<Category> = [ServiceTag::Database, ServiceTag::Mysql, ServiceTag::Mongodb]
            .into_iter()
            .map(|t| catalog.lookup(t).unwrap().category)
            .collect();
        assert!(cats.iter().all(|c| *c == Category::Database));
    }

    #[test]
    fn only_if_is_conditional() {
        let conditional: Vec<NodeKind> = NodeKind::ALL
            .into_iter()
            .filter(|k| k.is_conditional())
            .collect();
        assert_eq!(conditional, vec![NodeKind::If]);
    }

    #[test]
    fn keys_match_serialized_names() {
        for kind in NodeKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
        let entry = Catalog::builtin().template(NodeKind::GoogleSheets).entry();
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json["key"], "google_sheets");
        assert_eq!(json["type"], "n8n-nodes-base.googleSheets");
        assert_eq!(json["category"], "spreadsheet");
    }

    #[test]
    fn trigger_type_detection() {
        assert!(is_trigger_type("n8n-nodes-base.gmailTrigger"));
        assert!(!is_trigger_type("n8n-nodes-base.slack"));
        assert!(is_respond_type("n8n-nodes-base.respondToWebhook"));
    }
}
