//! HTTP helpers for the Lambda endpoints.

use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::Error;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Problem body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: &'static str,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldViolation>,
}

impl Problem {
    pub fn new(status: u16, title: &'static str, detail: impl Into<String>) -> Self {
        Self {
            kind: "about:blank",
            title,
            status,
            detail: detail.into(),
            errors: Vec::new(),
        }
    }

    /// Map a service error to the problem a caller sees.
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Validation(errors) => Self {
                errors: field_violations(errors),
                ..Self::new(400, "Validation failed", "One or more fields are invalid")
            },
            Error::Serialization(e) => {
                Self::new(400, "Invalid request body", format!("Invalid request body: {}", e))
            }
            Error::Database(_) | Error::Storage(_) => {
                Self::new(error.status_code(), "Storage error", error.to_string())
            }
            _ => Self::new(error.status_code(), "Internal error", error.to_string()),
        }
    }
}

/// Flatten nested validator output into `field` / `parent[i].field` paths.
pub fn field_violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut out = Vec::new();
    collect_violations(errors, "", &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn collect_violations(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldViolation>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code));
                    out.push(FieldViolation {
                        field: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_violations(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_violations(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

/// Create a `201 Created` response pointing at the new resource.
pub fn created_response<T: Serialize>(location: &str, data: &T) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(201)
        .header("content-type", "application/json")
        .header("location", location)
        .body(Body::from(serde_json::to_string(data)?))?)
}

/// Create a problem response.
pub fn problem_response(problem: &Problem) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(problem.status)
        .header("content-type", "application/problem+json")
        .body(Body::from(serde_json::to_string(problem)?))?)
}

/// Create a problem response for a service error.
pub fn error_response(error: &Error) -> Result<Response<Body>, lambda_http::Error> {
    problem_response(&Problem::from_error(error))
}

/// Parse request body as JSON, returning a 400 response on failure.
///
/// Returns `Ok(Ok(T))` on successful parse, `Ok(Err(Response))` on parse error (400),
/// or `Err(lambda_http::Error)` on serialization failure.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<Result<T, Response<Body>>, lambda_http::Error> {
    let bytes: &[u8] = body.as_ref();
    if bytes.is_empty() {
        let response = problem_response(&Problem::new(400, "Invalid request body", "Missing request body"))?;
        return Ok(Err(response));
    }

    match serde_json::from_slice(bytes) {
        Ok(parsed) => Ok(Ok(parsed)),
        Err(e) => Ok(Err(error_response(&Error::Serialization(e))?)),
    }
}

/// Macro to parse request body, returning early with 400 on parse error.
///
/// Usage:
/// ```ignore
/// let request: MyRequest = parse_body!(event.body());
/// ```
#[macro_export]
macro_rules! parse_body {
    ($body:expr) => {
        match $crate::http::parse_json_body($body)? {
            Ok(parsed) => parsed,
            Err(response) => return Ok(response),
        }
    };
}
