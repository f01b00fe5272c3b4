use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use validator::Validate;

use crate::error::PapersumError;

/// JSON body extractor whose rejections use the v1 error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(PapersumError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for PapersumError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> PapersumError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                PapersumError::Validation(format!("Missing required field: {field}"))
            } else {
                PapersumError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            PapersumError::Validation(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => PapersumError::Validation(
            "Missing `Content-Type: application/json` header".to_string(),
        ),
        JsonRejection::BytesRejection(_) => {
            PapersumError::Internal("Failed to read request body".to_string())
        }
        _ => PapersumError::Validation(rejection.body_text()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}

/// Run `validator` rules on a decoded request body.
pub fn validate_body<T: Validate>(body: &T) -> Result<(), PapersumError> {
    body.validate()
        .map_err(|e| PapersumError::Validation(e.to_string()))
}
