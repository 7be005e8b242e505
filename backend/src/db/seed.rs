//! Startup seed data.
//!
//! A seed file is RFC 4180 comma-separated text with a header row, read with
//! the `csv` crate. Columns are located by header name, so their order is free
//! and unknown columns are ignored:
//!
//! ```text
//! name,location,map_url,img_url,has_sockets,has_toilet,has_wifi,can_take_calls,seats,coffee_price
//! "Brew & Bytes",Tech District,https://maps.example/b,https://img.example/b.jpg,true,true,true,yes,15-20,$4.00
//! ```
//!
//! Flags accept the same spellings as the HTTP API (see [`parse_flag`]). An
//! empty `seats` or `coffee_price` cell means the value is absent.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::models::{parse_flag, NewCafe};

/// Errors raised while reading a seed file.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed seed data: {0}")]
    Csv(#[from] csv::Error),

    #[error("Seed data is empty; expected a header row")]
    MissingHeader,

    #[error("Seed header lacks required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Line {line}: column '{column}' must not be empty")]
    EmptyField { line: u64, column: &'static str },

    #[error("Line {line}: column '{column}' has invalid flag value '{value}'")]
    InvalidFlag {
        line: u64,
        column: &'static str,
        value: String,
    },
}

const REQUIRED_TEXT: [&str; 4] = ["name", "map_url", "img_url", "location"];
const FLAGS: [&str; 4] = ["has_sockets", "has_toilet", "has_wifi", "can_take_calls"];
const OPTIONAL_TEXT: [&str; 2] = ["seats", "coffee_price"];

/// Column positions resolved from the header row.
struct Columns {
    text: [usize; 4],
    flags: [usize; 4],
    optional: [Option<usize>; 2],
}

impl Columns {
    fn from_header(header: &StringRecord) -> Result<Self, SeedError> {
        let find = |column: &str| header.iter().position(|h| h.eq_ignore_ascii_case(column));
        let require = |column: &'static str| find(column).ok_or(SeedError::MissingColumn(column));

        Ok(Self {
            text: [
                require(REQUIRED_TEXT[0])?,
                require(REQUIRED_TEXT[1])?,
                require(REQUIRED_TEXT[2])?,
                require(REQUIRED_TEXT[3])?,
            ],
            flags: [
                require(FLAGS[0])?,
                require(FLAGS[1])?,
                require(FLAGS[2])?,
                require(FLAGS[3])?,
            ],
            optional: [find(OPTIONAL_TEXT[0]), find(OPTIONAL_TEXT[1])],
        })
    }

    fn record(&self, line: u64, record: &StringRecord) -> Result<NewCafe, SeedError> {
        // The reader is not flexible, so every record is as wide as the header.
        let cell = move |idx: usize| record.get(idx).unwrap_or_default();

        let mut text = [""; 4];
        for (slot, (&idx, column)) in text.iter_mut().zip(self.text.iter().zip(REQUIRED_TEXT)) {
            let value = cell(idx);
            if value.trim().is_empty() {
                return Err(SeedError::EmptyField { line, column });
            }
            *slot = value;
        }

        let mut flags = [false; 4];
        for (slot, (&idx, column)) in flags.iter_mut().zip(self.flags.iter().zip(FLAGS)) {
            let value = cell(idx);
            *slot = parse_flag(value).ok_or_else(|| SeedError::InvalidFlag {
                line,
                column,
                value: value.to_string(),
            })?;
        }

        let optional = |slot: Option<usize>| {
            slot.map(cell)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Ok(NewCafe {
            name: text[0].to_string(),
            map_url: text[1].to_string(),
            img_url: text[2].to_string(),
            location: text[3].to_string(),
            has_sockets: flags[0],
            has_toilet: flags[1],
            has_wifi: flags[2],
            can_take_calls: flags[3],
            seats: optional(self.optional[0]),
            coffee_price: optional(self.optional[1]),
        })
    }
}

/// Parse seed records from `reader`.
///
/// The first failing record aborts the whole parse, so a caller never imports
/// part of a file.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<NewCafe>, SeedError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let header = reader.headers()?.clone();
    if header.iter().all(str::is_empty) {
        return Err(SeedError::MissingHeader);
    }
    let columns = Columns::from_header(&header)?;

    let mut cafes = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line());
        cafes.push(columns.record(line, &record)?);
    }
    Ok(cafes)
}

/// Parse the seed file at `path`.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<NewCafe>, SeedError> {
    let file = File::open(path.as_ref())?;
    parse_csv(file)
}

fn sample(
    name: &str,
    location: &str,
    slug: &str,
    caption: &str,
    flags: [bool; 4],
    seats: &str,
    price: &str,
) -> NewCafe {
    NewCafe {
        name: name.to_string(),
        map_url: format!("https://maps.google.com/?q={}", slug),
        img_url: format!("https://via.placeholder.com/300x200?text={}", caption),
        location: location.to_string(),
        has_sockets: flags[0],
        has_toilet: flags[1],
        has_wifi: flags[2],
        can_take_calls: flags[3],
        seats: Some(seats.to_string()),
        coffee_price: Some(price.to_string()),
    }
}

/// Built-in demo data, used when no seed file is configured.
pub fn sample_cafes() -> Vec<NewCafe> {
    vec![
        sample(
            "The Coffee Bean",
            "Downtown",
            "coffee+bean+downtown",
            "Coffee+Bean",
            [true, true, true, false],
            "20-30",
            "$3.50",
        ),
        sample(
            "Brew & Bytes",
            "Tech District",
            "brew+bytes+tech+district",
            "Brew+Bytes",
            [true, true, true, true],
            "15-20",
            "$4.00",
        ),
        sample(
            "Central Perk",
            "City Center",
            "central+perk+city+center",
            "Central+Perk",
            [false, true, true, false],
            "10-15",
            "$2.75",
        ),
        sample(
            "Code Cafe",
            "University Area",
            "code+cafe+university",
            "Code+Cafe",
            [true, false, true, true],
            "25-30",
            "$3.25",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str =
        "name,location,map_url,img_url,has_sockets,has_toilet,has_wifi,can_take_calls,seats,coffee_price";

    #[test]
    fn test_parses_quoted_fields() {
        let data = format!(
            "{}\n\"Smith, \"\"The\"\" Roastery\",Soho,https://m.example/1,https://i.example/1.jpg,yes,no,TRUE,0,,£2.80\n",
            HEADER
        );
        let cafes = parse_csv(Cursor::new(data)).unwrap();
        assert_eq!(cafes.len(), 1);
        let cafe = &cafes[0];
        assert_eq!(cafe.name, "Smith, \"The\" Roastery");
        assert_eq!(cafe.location, "Soho");
        assert!(cafe.has_sockets && !cafe.has_toilet && cafe.has_wifi && !cafe.can_take_calls);
        assert_eq!(cafe.seats, None);
        assert_eq!(cafe.coffee_price.as_deref(), Some("£2.80"));
    }

    #[test]
    fn test_columns_are_found_by_header_name() {
        let data = "HAS_WIFI,img_url,name,map_url,location,has_sockets,has_toilet,can_take_calls\n\
                    1,https://i.example/a,A,https://m.example/a,X,0,0,1\n";
        let cafes = parse_csv(Cursor::new(data)).unwrap();
        assert_eq!(cafes[0].name, "A");
        assert!(cafes[0].has_wifi);
        assert!(cafes[0].coffee_price.is_none());
    }

    #[test]
    fn test_missing_column_is_reported() {
        let err = parse_csv(Cursor::new("name,location\nA,X\n")).unwrap_err();
        assert!(matches!(err, SeedError::MissingColumn("map_url")));
    }

    #[test]
    fn test_errors_name_the_line() {
        let data = format!(
            "{}\nA,X,https://m.example/a,https://i.example/a,maybe,1,1,1,,\n",
            HEADER
        );
        let err = parse_csv(Cursor::new(data)).unwrap_err();
        match err {
            SeedError::InvalidFlag { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, "has_sockets");
            }
            other => panic!("unexpected error: {other}"),
        }

        let data = format!("{}\nA,X,https://m.example/a\n", HEADER);
        assert!(matches!(
            parse_csv(Cursor::new(data)).unwrap_err(),
            SeedError::Csv(_)
        ));
    }

    #[test]
    fn test_quoted_field_may_span_lines() {
        let data = format!(
            "{}\n\"Two\nLines\",Soho,https://m.example/1,https://i.example/1.jpg,1,1,1,1,,\n\
             Next,Soho,https://m.example/2,https://i.example/2.jpg,0,0,0,0,,\n",
            HEADER
        );
        let cafes = parse_csv(Cursor::new(data)).unwrap();
        assert_eq!(cafes.len(), 2);
        assert_eq!(cafes[0].name, "Two\nLines");
        assert_eq!(cafes[1].name, "Next");
    }

    #[test]
    fn test_text_cells_are_kept_verbatim() {
        let data = format!(
            "{}\n Spaced ,\" Soho \",https://m.example/1,https://i.example/1.jpg,1,1,1,1,,\n",
            HEADER
        );
        let cafes = parse_csv(Cursor::new(data)).unwrap();
        assert_eq!(cafes[0].name, " Spaced ");
        assert_eq!(cafes[0].location, " Soho ");
    }

    #[test]
    fn test_empty_input_has_no_header() {
        assert!(matches!(
            parse_csv(Cursor::new("")).unwrap_err(),
            SeedError::MissingHeader
        ));
    }

    #[test]
    fn test_sample_cafes_are_complete() {
        let cafes = sample_cafes();
        assert_eq!(cafes.len(), 4);
        assert!(cafes.iter().all(|c| c.missing_fields().is_empty()));
        assert_eq!(
            cafes[1].img_url,
            "https://via.placeholder.com/300x200?text=Brew+Bytes"
        );
    }
}
