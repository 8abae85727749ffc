use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// Typed key-value metadata attached to books, accounts, transactions and
/// splits.  Duplicate keys in the source overwrite earlier occurrences.
pub type SlotMap = HashMap<String, SlotValue>;

/// The closed set of value types a slot can carry.
///
/// The on-disk format tags each value with a type attribute; decoding maps
/// every tag onto one of these variants so consumers handle the full set
/// exhaustively.  Frames nest to unbounded depth.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotValue {
    Text(String),
    Integer(i64),
    Numeric(Decimal),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Frame(SlotMap),
}

impl SlotValue {
    /// The textual content, if this is a text slot.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SlotValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_text_only_matches_text() {
        assert_eq!(SlotValue::Text("memo".to_string()).as_text(), Some("memo"));
        assert_eq!(SlotValue::Integer(3).as_text(), None);
    }
}
