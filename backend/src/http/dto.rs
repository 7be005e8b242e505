//! Data Transfer Objects for the HTTP API.
//!
//! Responses use two envelope kinds that are never mixed: data envelopes
//! (`cafe` / `cafes`) and message envelopes (`response` here, `error` in
//! [`super::error`]).

use serde::{Deserialize, Serialize};

use super::error::AppError;
use crate::db::repository::cafe::describe_oversized;
use crate::models::{parse_flag, Cafe, NewCafe};

// =============================================================================
// Requests
// =============================================================================

/// An amenity flag as sent by a client: a JSON boolean or a form string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Text(String),
}

impl FlagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            FlagValue::Text(s) => parse_flag(s),
        }
    }
}

/// Request body for creating a cafe, as JSON or form fields.
///
/// Every field is optional here so that a missing one produces a 400 naming
/// it rather than a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCafeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub map_url: Option<String>,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub has_sockets: Option<FlagValue>,
    #[serde(default)]
    pub has_toilet: Option<FlagValue>,
    #[serde(default)]
    pub has_wifi: Option<FlagValue>,
    #[serde(default)]
    pub can_take_calls: Option<FlagValue>,
    #[serde(default)]
    pub seats: Option<String>,
    #[serde(default)]
    pub coffee_price: Option<String>,
}

impl CreateCafeRequest {
    /// Check the request and turn it into a store candidate.
    ///
    /// Values are kept exactly as sent. Whitespace alone counts as missing for
    /// the required text fields; `seats` and `coffee_price` may be empty.
    pub fn validate(self) -> Result<NewCafe, AppError> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .is_some_and(|v| !v.trim().is_empty())
        };

        let flags = [
            ("has_sockets", &self.has_sockets),
            ("has_toilet", &self.has_toilet),
            ("has_wifi", &self.has_wifi),
            ("can_take_calls", &self.can_take_calls),
        ];

        let mut missing: Vec<&str> = [
            ("name", &self.name),
            ("map_url", &self.map_url),
            ("img_url", &self.img_url),
            ("location", &self.location),
        ]
        .into_iter()
        .filter(|(_, value)| !present(value))
        .map(|(field, _)| field)
        .collect();
        missing.extend(
            flags
                .iter()
                .filter(|(_, value)| value.is_none())
                .map(|(field, _)| *field),
        );
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Missing required field(s): {}",
                missing.join(", ")
            )));
        }

        let mut parsed = [false; 4];
        for (slot, (field, value)) in parsed.iter_mut().zip(flags) {
            let value = value.as_ref().and_then(FlagValue::as_bool);
            *slot = value.ok_or_else(|| {
                AppError::BadRequest(format!("Field '{}' must be true or false", field))
            })?;
        }

        let candidate = NewCafe {
            name: self.name.unwrap_or_default(),
            map_url: self.map_url.unwrap_or_default(),
            img_url: self.img_url.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            has_sockets: parsed[0],
            has_toilet: parsed[1],
            has_wifi: parsed[2],
            can_take_calls: parsed[3],
            seats: self.seats,
            coffee_price: self.coffee_price,
        };

        for (field, url) in [("map_url", &candidate.map_url), ("img_url", &candidate.img_url)] {
            if !is_web_url(url) {
                return Err(AppError::BadRequest(format!(
                    "Field '{}' must be a valid http(s) URL",
                    field
                )));
            }
        }

        let oversized = candidate.oversized_fields();
        if !oversized.is_empty() {
            return Err(AppError::BadRequest(describe_oversized(&oversized)));
        }
        Ok(candidate)
    }
}

/// Accepts `http://host...` and `https://host...` with a non-empty host.
pub fn is_web_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    let rest = match lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
    {
        Some(rest) => rest,
        None => return false,
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    !host.is_empty()
        && !value.chars().any(char::is_whitespace)
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '[' | ']'))
}

/// `GET /search` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub loc: Option<String>,
}

/// `PATCH /cafe/{id}/price` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceQuery {
    pub new_price: Option<String>,
}

/// `DELETE /cafe/{id}` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeyQuery {
    pub api_key: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// `{"cafe": {...}}`
#[derive(Debug, Clone, Serialize)]
pub struct CafeResponse {
    pub cafe: Cafe,
}

/// `{"cafes": [...], "total": n}`
#[derive(Debug, Clone, Serialize)]
pub struct CafeListResponse {
    pub cafes: Vec<Cafe>,
    pub total: usize,
}

/// `{"cafes": [...]}`
#[derive(Debug, Clone, Serialize)]
pub struct CafesResponse {
    pub cafes: Vec<Cafe>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessMessage {
    pub success: String,
}

/// `{"response": {"success": "..."}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub response: SuccessMessage,
}

impl MessageResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            response: SuccessMessage {
                success: message.into(),
            },
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MAX_TEXT_CHARS, MAX_URL_CHARS};
    use serde_json::json;

    fn complete() -> serde_json::Value {
        json!({
            "name": "  Grind  ",
            "map_url": "https://maps.example.com/grind",
            "img_url": "http://img.example.com/grind.png",
            "location": "Shoreditch",
            "has_sockets": true,
            "has_toilet": "no",
            "has_wifi": "1",
            "can_take_calls": false,
            "coffee_price": ""
        })
    }

    fn request(value: serde_json::Value) -> CreateCafeRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_validate_keeps_text_as_sent() {
        let cafe = request(complete()).validate().unwrap();
        assert_eq!(cafe.name, "  Grind  ");
        assert!(cafe.has_sockets && !cafe.has_toilet && cafe.has_wifi && !cafe.can_take_calls);
        assert_eq!(cafe.seats, None);
        assert_eq!(cafe.coffee_price.as_deref(), Some(""));
    }

    #[test]
    fn test_validate_rejects_oversized_fields() {
        let mut body = complete();
        body["location"] = json!("x".repeat(MAX_TEXT_CHARS + 1));
        body["seats"] = json!("1".repeat(MAX_TEXT_CHARS));
        match request(body).validate() {
            Err(AppError::BadRequest(msg)) => {
                assert_eq!(msg, "Field(s) too long: location (max 250 characters)");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let mut body = complete();
        body["map_url"] = json!(format!("https://maps.example.com/{}", "a".repeat(MAX_URL_CHARS)));
        assert!(matches!(
            request(body).validate(),
            Err(AppError::BadRequest(msg)) if msg.contains("map_url (max 500")
        ));
    }

    #[test]
    fn test_validate_lists_missing_fields() {
        let mut body = complete();
        body["name"] = json!("   ");
        body.as_object_mut().unwrap().remove("has_wifi");
        match request(body).validate() {
            Err(AppError::BadRequest(msg)) => {
                assert_eq!(msg, "Missing required field(s): name, has_wifi");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_bad_flag_and_url() {
        let mut body = complete();
        body["has_toilet"] = json!("sometimes");
        assert!(matches!(
            request(body).validate(),
            Err(AppError::BadRequest(msg)) if msg.contains("has_toilet")
        ));

        let mut body = complete();
        body["img_url"] = json!("not a url");
        assert!(matches!(
            request(body).validate(),
            Err(AppError::BadRequest(msg)) if msg.contains("img_url")
        ));
    }

    #[test]
    fn test_is_web_url() {
        assert!(is_web_url("https://maps.google.com/?q=central+perk"));
        assert!(is_web_url("HTTP://localhost:8080/x"));
        assert!(!is_web_url("ftp://example.com"));
        assert!(!is_web_url("https://"));
        assert!(!is_web_url("https:///path"));
        assert!(!is_web_url("https://exa mple.com"));
        assert!(!is_web_url("maps.google.com"));
    }

    #[test]
    fn test_message_envelope_shape() {
        let value = serde_json::to_value(MessageResponse::success("done")).unwrap();
        assert_eq!(value, json!({ "response": { "success": "done" } }));
    }
}
