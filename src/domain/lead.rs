use std::sync::OnceLock;

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    table::{parse_table, TableParse},
    text::normalize,
};

/// A single scraped entity flattened into the fields we sell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub lead: String,
    pub username: String,
    pub user_link: String,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub summary: String,
}

impl LeadRecord {
    pub fn is_empty(&self) -> bool {
        self.lead.is_empty()
            && self.username.is_empty()
            && self.user_link.is_empty()
            && self.emails.is_empty()
            && self.phones.is_empty()
            && self.summary.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Lead,
    Username,
    UserLink,
    Summary,
}

impl Slot {
    const ALL: [Slot; 4] = [Slot::Lead, Slot::Username, Slot::UserLink, Slot::Summary];

    fn patterns(&self) -> &'static [&'static str] {
        match self {
            Slot::Lead => &["name", "title"],
            Slot::Username => &["user", "handle"],
            Slot::UserLink => &["link", "url"],
            Slot::Summary => &["bio", "description"],
        }
    }

    fn matches(&self, key: &str) -> bool {
        self.patterns().iter().any(|p| key.contains(p))
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"[A-Za-z0-9._-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap())
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| {
        Regex::new(r"(?:\+\d{1,3}[-.\s]?)?(?:\(\d{3}\)|\b\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap()
    })
}

/// Running state of one extraction. Each visit consumes it and hands back the
/// updated value.
#[derive(Debug, Default)]
struct LeadAccumulator {
    record: LeadRecord,
}

impl LeadAccumulator {
    fn slot(&self, slot: Slot) -> &str {
        match slot {
            Slot::Lead => &self.record.lead,
            Slot::Username => &self.record.username,
            Slot::UserLink => &self.record.user_link,
            Slot::Summary => &self.record.summary,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut String {
        match slot {
            Slot::Lead => &mut self.record.lead,
            Slot::Username => &mut self.record.username,
            Slot::UserLink => &mut self.record.user_link,
            Slot::Summary => &mut self.record.summary,
        }
    }

    /// First empty slot whose pattern the key contains gets the text.
    fn fill(mut self, key: &str, text: &str) -> Self {
        if text.is_empty() {
            return self;
        }

        let key = key.to_lowercase();
        let open_slot = Slot::ALL
            .into_iter()
            .find(|slot| slot.matches(&key) && self.slot(*slot).is_empty());

        if let Some(slot) = open_slot {
            *self.slot_mut(slot) = text.to_string();
        }
        self
    }

    fn scan(mut self, text: &str) -> Self {
        self.record
            .emails
            .extend(email_regex().find_iter(text).map(|m| m.as_str().to_string()));
        self.record
            .phones
            .extend(phone_regex().find_iter(text).map(|m| m.as_str().trim().to_string()));
        self
    }

    fn text(self, key: Option<&str>, raw: &str) -> Self {
        let text = normalize(raw);
        let acc = self.scan(&text);
        match key {
            Some(key) => acc.fill(key, &text),
            None => acc,
        }
    }

    fn finish(self) -> LeadRecord {
        let LeadRecord {
            lead,
            username,
            user_link,
            emails,
            phones,
            summary,
        } = self.record;

        LeadRecord {
            lead,
            username,
            user_link,
            emails: emails.into_iter().unique().collect(),
            phones: phones.into_iter().unique().collect(),
            summary,
        }
    }
}

/// Flattens an arbitrary dataset item into a [`LeadRecord`].
///
/// Keys are visited depth first in the order the document lists them. Emails
/// and phone numbers are collected from every string; the named slots are
/// filled by the first non-empty value whose key looks like that slot.
pub fn extract(node: &Value) -> LeadRecord {
    visit(LeadAccumulator::default(), None, node).finish()
}

fn visit(acc: LeadAccumulator, key: Option<&str>, value: &Value) -> LeadAccumulator {
    match value {
        Value::String(s) => visit_string(acc, key, s),
        Value::Array(items) => items.iter().fold(acc, |acc, item| visit(acc, None, item)),
        Value::Object(map) => map
            .iter()
            .fold(acc, |acc, (k, v)| visit(acc, Some(k.as_str()), v)),
        Value::Number(_) | Value::Bool(_) | Value::Null => acc,
    }
}

fn visit_string(acc: LeadAccumulator, key: Option<&str>, raw: &str) -> LeadAccumulator {
    match parse_table(raw) {
        TableParse::Rows(rows) => rows.iter().fold(acc, |acc, row| {
            row.cells()
                .fold(acc, |acc, (header, cell)| acc.text(Some(header), cell))
        }),
        TableParse::Passthrough(_) => acc.text(key, raw),
    }
}
