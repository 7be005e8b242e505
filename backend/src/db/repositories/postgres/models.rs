use diesel::prelude::*;

use super::schema::cafes;
use crate::models::{Cafe, CafeId, NewCafe};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cafes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CafeRow {
    pub id: i32,
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

impl From<CafeRow> for Cafe {
    fn from(row: CafeRow) -> Self {
        Cafe {
            id: CafeId::new(row.id),
            name: row.name,
            map_url: row.map_url,
            img_url: row.img_url,
            location: row.location,
            has_sockets: row.has_sockets,
            has_toilet: row.has_toilet,
            has_wifi: row.has_wifi,
            can_take_calls: row.can_take_calls,
            seats: row.seats,
            coffee_price: row.coffee_price,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cafes)]
pub struct NewCafeRow<'a> {
    pub name: &'a str,
    pub map_url: &'a str,
    pub img_url: &'a str,
    pub location: &'a str,
    pub has_sockets: bool,
    pub has_toilet: bool,
    pub has_wifi: bool,
    pub can_take_calls: bool,
    pub seats: Option<&'a str>,
    pub coffee_price: Option<&'a str>,
}

impl<'a> From<&'a NewCafe> for NewCafeRow<'a> {
    fn from(cafe: &'a NewCafe) -> Self {
        NewCafeRow {
            name: &cafe.name,
            map_url: &cafe.map_url,
            img_url: &cafe.img_url,
            location: &cafe.location,
            has_sockets: cafe.has_sockets,
            has_toilet: cafe.has_toilet,
            has_wifi: cafe.has_wifi,
            can_take_calls: cafe.can_take_calls,
            seats: cafe.seats.as_deref(),
            coffee_price: cafe.coffee_price.as_deref(),
        }
    }
}
