use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Every way a lead extraction request can fail.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),
    #[error("Failed to start scraping job: {0}")]
    Submission(String),
    #[error("Extraction failed: {message}")]
    ExtractionFailed { message: String },
    #[error("Unexpected job status: {status}")]
    UnexpectedStatus { status: String },
    #[error("Job did not finish after {attempts} status checks")]
    Timeout { attempts: u32 },
    #[error("Job polling was cancelled")]
    Cancelled,
    #[error("No results found")]
    EmptyResult,
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("Provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Failed to export leads: {0}")]
    Export(String),
}

impl ResponseError for PipelineError {
    fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            PipelineError::EmptyResult => StatusCode::NOT_FOUND,
            PipelineError::MalformedResponse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, ResponseError};

    use super::PipelineError;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            PipelineError::Validation("keyword is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PipelineError::EmptyResult.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            PipelineError::MalformedResponse("not an array".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            PipelineError::Timeout { attempts: 30 }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PipelineError::UnexpectedStatus {
                status: "ABORTED".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn extraction_failure_carries_provider_message() {
        let err = PipelineError::ExtractionFailed {
            message: "Actor crashed".into(),
        };
        assert_eq!(err.to_string(), "Extraction failed: Actor crashed");
    }
}
