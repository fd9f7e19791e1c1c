//! Input validation shared by every request shape.
//!
//! Request bodies are decoded with [`parse_json`], which reports every
//! missing or mistyped field together with the shape's own [`Validate`]
//! rules as one [`ValidationError`].

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::ApiError;

/// Field name reported when the body as a whole cannot be decoded.
pub const BODY_FIELD: &str = "body";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", describe(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError::new(field, message)],
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

/// serde_json appends " at line L column C"; clients don't need it.
fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(idx) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
}

fn missing(field: &str) -> FieldError {
    FieldError::new(field, format!("missing field `{field}`"))
}

/// First segment of a serde path: `"cards[0].name"` -> `"cards"`.
fn top_level_key(path: &str) -> &str {
    path.split(['.', '[']).next().unwrap_or(path)
}

/// Request-shape rules that run on the raw JSON object, before and
/// independently of typed decoding, so every problem is reported at once.
pub trait Validate {
    /// Keys that must be present in the object.
    const REQUIRED: &'static [&'static str] = &[];

    /// Field rules the type system can't express. Fields that are absent
    /// or of the wrong JSON type are skipped here; decoding reports them.
    fn check(_fields: &Map<String, Value>, _errors: &mut Vec<FieldError>) {}
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(
            r"^[\w!#$%&'*+/=?^`{|}~-]+(\.[\w!#$%&'*+/=?^`{|}~-]+)*@([A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$"
        )
        .unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn check_email(fields: &Map<String, Value>, errors: &mut Vec<FieldError>) {
    if let Some(Value::String(email)) = fields.get("email") {
        if !is_valid_email(email) {
            errors.push(FieldError::new("email", "value is not a valid email address"));
        }
    }
}

/// Decode and validate a request shape from raw JSON.
///
/// Missing keys, mistyped fields and [`Validate::check`] rules are all
/// collected; a mistyped key is dropped and decoding retried so later
/// fields still get reported.
pub fn parse_json<T>(bytes: &[u8]) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|err| ValidationError::field(BODY_FIELD, strip_position(&err.to_string())))?;
    let Value::Object(mut map) = value else {
        return Err(ValidationError::field(BODY_FIELD, "expected a JSON object"));
    };

    let mut errors: Vec<FieldError> = T::REQUIRED
        .iter()
        .filter(|key| !map.contains_key(**key))
        .map(|key| missing(key))
        .collect();
    T::check(&map, &mut errors);

    // each pass removes one key, so this ends
    loop {
        let err = match serde_path_to_error::deserialize::<_, T>(Value::Object(map.clone())) {
            Ok(value) if errors.is_empty() => return Ok(value),
            Ok(_) => break,
            Err(err) => err,
        };
        let path = err.path().to_string();
        let message = strip_position(&err.inner().to_string());

        if let Some(name) = missing_field(&message) {
            let field = match path.as_str() {
                "." => name.to_string(),
                parent => format!("{parent}.{name}"),
            };
            let key = top_level_key(&field).to_string();
            if !errors.iter().any(|e| top_level_key(&e.field) == key) {
                errors.push(missing(&field));
            }
            break;
        }

        if path == "." {
            errors.push(FieldError::new(BODY_FIELD, message));
            break;
        }
        let key = top_level_key(&path).to_string();
        errors.retain(|e| e.field != key);
        errors.push(FieldError::new(path, message));
        if map.remove(&key).is_none() {
            break;
        }
    }
    Err(ValidationError { fields: errors })
}

/// Keeps "absent" and "explicit null" apart on patch fields:
/// absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
/// Use together with `#[serde(default)]`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// JSON body extractor that rejects with a field-level [`ValidationError`].
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(ValidJson(parse_json(&bytes)?))
    }
}
