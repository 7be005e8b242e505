//! Cafe records.
//!
//! [`NewCafe`] is a candidate record as submitted by a client or read from the
//! seed file; [`Cafe`] is what the store hands back once an id was assigned.
//! Serialization goes through [`Cafe::fields`], an explicit field-to-value
//! mapping in a fixed order.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Surrogate key of a stored cafe. Assigned by the store, never reused.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CafeId(pub i32);

impl CafeId {
    pub fn new(value: i32) -> Self {
        CafeId(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for CafeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for CafeId {
    fn from(v: i32) -> Self {
        CafeId(v)
    }
}

/// Longest `name`, `location`, `seats` or `coffee_price` the store accepts,
/// in characters. Matches the `VARCHAR(250)` columns of the cafes table.
pub const MAX_TEXT_CHARS: usize = 250;

/// Longest `map_url` or `img_url`, in characters (`VARCHAR(500)`).
pub const MAX_URL_CHARS: usize = 500;

/// `true` when `value` is longer than `limit` characters.
pub fn exceeds_limit(value: &str, limit: usize) -> bool {
    value.chars().nth(limit).is_some()
}

/// A cafe that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCafe {
    pub name: String,
    pub map_url: String,
    pub img_url: String,
    pub location: String,
    pub has_sockets: bool,
    pub has_toilet: bool,
    pub has_wifi: bool,
    pub can_take_calls: bool,
    pub seats: Option<String>,
    pub coffee_price: Option<String>,
}

impl NewCafe {
    /// Required text fields that are empty (or whitespace only).
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("map_url", &self.map_url),
            ("img_url", &self.img_url),
            ("location", &self.location),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Fields longer than their column allows, with the limit that applies.
    pub fn oversized_fields(&self) -> Vec<(&'static str, usize)> {
        [
            ("name", self.name.as_str(), MAX_TEXT_CHARS),
            ("map_url", self.map_url.as_str(), MAX_URL_CHARS),
            ("img_url", self.img_url.as_str(), MAX_URL_CHARS),
            ("location", self.location.as_str(), MAX_TEXT_CHARS),
            ("seats", self.seats.as_deref().unwrap_or_default(), MAX_TEXT_CHARS),
            (
                "coffee_price",
                self.coffee_price.as_deref().unwrap_or_default(),
                MAX_TEXT_CHARS,
            ),
        ]
        .into_iter()
        .filter(|(_, value, limit)| exceeds_limit(value, *limit))
        .map(|(field, _, limit)| (field, limit))
        .collect()
    }

    /// Attach a store-assigned id.
    pub fn into_cafe(self, id: CafeId) -> Cafe {
        Cafe {
            id,
            name: self.name,
            map_url: self.map_url,
            img_url: self.img_url,
            location: self.location,
            has_sockets: self.has_sockets,
            has_toilet: self.has_toilet,
            has_wifi: self.has_wifi,
            can_take_calls: self.can_take_calls,
            seats: self.seats,
            coffee_price: self.coffee_price,
        }
    }
}

/// A stored cafe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cafe {
    pub id: CafeId,
    pub name: String,
    pub map_url: String,
    pub img_url: String,
    pub location: String,
    pub has_sockets: bool,
    pub has_toilet: bool,
    pub has_wifi: bool,
    pub can_take_calls: bool,
    pub seats: Option<String>,
    pub coffee_price: Option<String>,
}

impl Cafe {
    /// Serialized field names, in output order.
    pub const FIELDS: [&'static str; 11] = [
        "id",
        "name",
        "map_url",
        "img_url",
        "location",
        "has_sockets",
        "has_toilet",
        "has_wifi",
        "can_take_calls",
        "seats",
        "coffee_price",
    ];

    /// Field-to-value mapping used for every serialized form of a cafe.
    pub fn fields(&self) -> [(&'static str, Value); 11] {
        [
            ("id", Value::from(self.id.value())),
            ("name", Value::from(self.name.as_str())),
            ("map_url", Value::from(self.map_url.as_str())),
            ("img_url", Value::from(self.img_url.as_str())),
            ("location", Value::from(self.location.as_str())),
            ("has_sockets", Value::Bool(self.has_sockets)),
            ("has_toilet", Value::Bool(self.has_toilet)),
            ("has_wifi", Value::Bool(self.has_wifi)),
            ("can_take_calls", Value::Bool(self.can_take_calls)),
            ("seats", optional_text(&self.seats)),
            ("coffee_price", optional_text(&self.coffee_price)),
        ]
    }

    pub fn to_map(&self) -> Map<String, Value> {
        self.fields()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }

    /// The candidate this record was created from.
    pub fn to_new_cafe(&self) -> NewCafe {
        NewCafe {
            name: self.name.clone(),
            map_url: self.map_url.clone(),
            img_url: self.img_url.clone(),
            location: self.location.clone(),
            has_sockets: self.has_sockets,
            has_toilet: self.has_toilet,
            has_wifi: self.has_wifi,
            can_take_calls: self.can_take_calls,
            seats: self.seats.clone(),
            coffee_price: self.coffee_price.clone(),
        }
    }
}

impl Serialize for Cafe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn optional_text(value: &Option<String>) -> Value {
    value.as_deref().map(Value::from).unwrap_or(Value::Null)
}

/// Parse an amenity flag as it appears in form posts and seed files.
///
/// Accepts `true/false`, `1/0`, `yes/no`, `y/n` and `on/off`, ignoring case and
/// surrounding whitespace.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
