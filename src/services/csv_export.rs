use std::path::Path;

use csv::{QuoteStyle, WriterBuilder};
use uuid::Uuid;

use crate::{domain::lead::LeadRecord, error::PipelineError};

const HEADERS: [&str; 6] = ["lead", "username", "userLink", "emails", "phones", "summary"];

pub fn leads_to_csv(leads: &[LeadRecord]) -> Result<Vec<u8>, PipelineError> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    wtr.write_record(HEADERS)
        .map_err(|e| PipelineError::Export(e.to_string()))?;

    for lead in leads {
        let phones = match lead.phones.is_empty() {
            true => "-".to_string(),
            false => lead.phones.join("; "),
        };

        wtr.write_record([
            lead.lead.as_str(),
            lead.username.as_str(),
            lead.user_link.as_str(),
            lead.emails.join("; ").as_str(),
            phones.as_str(),
            lead.summary.as_str(),
        ])
        .map_err(|e| PipelineError::Export(e.to_string()))?;
    }

    wtr.into_inner()
        .map_err(|e| PipelineError::Export(e.to_string()))
}

/// Writes the leads to `<uuid>.csv` inside `dir` and returns the file name.
pub async fn export_leads(dir: &Path, leads: &[LeadRecord]) -> Result<String, PipelineError> {
    let contents = leads_to_csv(leads)?;
    let filename = format!("{}.csv", Uuid::new_v4());

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| PipelineError::Export(e.to_string()))?;
    tokio::fs::write(dir.join(&filename), contents)
        .await
        .map_err(|e| PipelineError::Export(e.to_string()))?;

    log::info!("Exported {} leads to {}", leads.len(), filename);
    Ok(filename)
}
