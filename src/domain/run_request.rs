use serde::Deserialize;
use serde_json::{json, Value};

use crate::configuration::ApifySettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Twitter,
    Linkedin,
}

impl Platform {
    pub fn actor_id<'a>(&self, settings: &'a ApifySettings) -> &'a str {
        match self {
            Platform::Twitter => &settings.twitter_actor,
            Platform::Linkedin => &settings.linkedin_actor,
        }
    }

    /// Input document for the platform's actor.
    pub fn actor_input(&self, keyword: &str, max_leads: u32) -> Value {
        match self {
            Platform::Twitter => json!({
                "searchTerms": [keyword],
                "maxItems": max_leads,
                "sort": "Latest",
            }),
            Platform::Linkedin => json!({
                "searchQuery": keyword,
                "maxResults": max_leads,
            }),
        }
    }
}

/// Body of `POST /run`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub keyword: Option<String>,
    pub source: Option<String>,
    #[serde(default)]
    pub platform: Platform,
    pub max_leads: Option<u32>,
    #[serde(default)]
    pub export: bool,
}

impl RunRequest {
    /// `keyword` wins over `source` when both are sent.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .or(self.source.as_deref())
    }
}
