//! Domain models shared by the store and the HTTP layer.

pub mod cafe;

pub use cafe::{
    exceeds_limit, parse_flag, Cafe, CafeId, NewCafe, MAX_TEXT_CHARS, MAX_URL_CHARS,
};
