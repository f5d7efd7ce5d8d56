use url::Url;

use crate::error::PipelineError;

/// Most results a single provider job may be asked for.
pub const MAX_LEADS: u32 = 50;

/// Reduces a user supplied keyword to the bare handle or term the actors
/// expect: a profile URL becomes its last path segment and a leading `@` or
/// `#` is dropped.
pub fn normalize_keyword(raw: Option<&str>) -> Result<String, PipelineError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(PipelineError::Validation(
            "A keyword or source is required".to_string(),
        ));
    }

    let keyword = match Url::parse(raw) {
        Ok(url) if url.has_host() => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        _ => raw.to_string(),
    };

    let keyword = keyword
        .strip_prefix('@')
        .or_else(|| keyword.strip_prefix('#'))
        .unwrap_or(&keyword)
        .trim()
        .to_string();

    match keyword.is_empty() {
        true => Err(PipelineError::Validation(format!(
            "Could not read a keyword from {}",
            raw
        ))),
        false => Ok(keyword),
    }
}

pub fn clamp_max_leads(requested: Option<u32>) -> u32 {
    requested.unwrap_or(MAX_LEADS).clamp(1, MAX_LEADS)
}
