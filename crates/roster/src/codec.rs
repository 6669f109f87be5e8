//! Delimiter-based text codec.
//!
//! Each record kind joins its fields with its own delimiter token. A field
//! holding child records is written as each child encoded with the child's
//! delimiter, joined by the parent's list separator, or [`NO_CHILDREN`] when
//! the list is empty. Decoding checks the exact field count of every kind at
//! every nesting level and yields `None` on any mismatch.
//!
//! # Known limitation
//!
//! Field values are not escaped. A value containing a token would split into
//! extra fields, so [`is_encodable`] is enforced when records enter the store
//! and decode's field-count check is the only protection for text on disk.

use crate::error::{Error, Result};
use crate::record::{
    Boarding, Commendation, DesignProperty, Destination, FlightLogEntry, Kerbal, Mission, Vessel,
    VesselDesign, TOMBSTONE,
};

/// Stored value of an empty child list.
pub const NO_CHILDREN: &str = "(none)";

/// Stored value of a missing description.
pub const NO_DESCRIPTION: &str = "";

/// A kind with a fixed, delimiter-joined field layout.
pub trait Codec: Sized {
    /// Name used in error messages.
    const NAME: &'static str;
    /// Token joining this kind's fields.
    const DELIMITER: &'static str;
    /// Exact number of fields.
    const FIELD_COUNT: usize;

    /// Field sequence written to storage, description first.
    fn storable_fields(&self) -> Vec<String>;

    /// Rebuild from exactly [`Self::FIELD_COUNT`] fields.
    fn from_fields(fields: &[&str]) -> Option<Self>;

    /// Free-text values written verbatim, labelled by field.
    fn text_fields(&self) -> Vec<(&'static str, &str)>;

    /// Check this record (and its children) against [`is_encodable`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnencodableField`] naming the first bad field.
    fn check_encodable(&self) -> Result<()> {
        check_text_fields(self)
    }
}

/// A kind owning list-valued fields of child records.
pub trait Composite: Codec {
    /// Token joining children inside one list field.
    const SEPARATOR: &'static str;
}

/// Every token in use. No entry may occur inside another.
pub const TOKENS: [&str; 12] = [
    <Kerbal as Codec>::DELIMITER,
    <Kerbal as Composite>::SEPARATOR,
    <Commendation as Codec>::DELIMITER,
    <FlightLogEntry as Codec>::DELIMITER,
    <Mission as Codec>::DELIMITER,
    <Mission as Composite>::SEPARATOR,
    <Boarding as Codec>::DELIMITER,
    <VesselDesign as Codec>::DELIMITER,
    <VesselDesign as Composite>::SEPARATOR,
    <DesignProperty as Codec>::DELIMITER,
    <Destination as Codec>::DELIMITER,
    <Vessel as Codec>::DELIMITER,
];

/// Encode a record with its own delimiter.
#[must_use]
pub fn encode<T: Codec>(record: &T) -> String {
    record.storable_fields().join(T::DELIMITER)
}

/// Decode a record, validating its field count.
#[must_use]
pub fn decode<T: Codec>(text: &str) -> Option<T> {
    let fields: Vec<&str> = text.split(T::DELIMITER).collect();
    if fields.len() != T::FIELD_COUNT {
        return None;
    }
    T::from_fields(&fields)
}

/// Encode a child list for a field of the parent `P`.
#[must_use]
pub fn encode_list<P: Composite, C: Codec>(children: &[C]) -> String {
    if children.is_empty() {
        return NO_CHILDREN.to_string();
    }
    children
        .iter()
        .map(encode)
        .collect::<Vec<_>>()
        .join(P::SEPARATOR)
}

/// Decode a child list stored in a field of the parent `P`.
///
/// Any malformed child makes the whole list (and so the parent) malformed.
#[must_use]
pub fn decode_list<P: Composite, C: Codec>(field: &str) -> Option<Vec<C>> {
    if field == NO_CHILDREN {
        return Some(Vec::new());
    }
    field.split(P::SEPARATOR).map(decode).collect()
}

/// Whether a value can be written without ambiguity.
///
/// Rejects line breaks, the list sentinel, any token, and any value that
/// starts with a proper suffix or ends with a proper prefix of a token, since
/// those would fuse with the neighbouring delimiter.
#[must_use]
pub fn is_encodable(value: &str) -> bool {
    if value.contains(['\n', '\r']) || value == NO_CHILDREN || value == TOMBSTONE {
        return false;
    }
    TOKENS.iter().all(|token| {
        !value.contains(token)
            && (1..token.len()).all(|split| {
                !value.ends_with(&token[..split]) && !value.starts_with(&token[split..])
            })
    })
}

/// Run [`is_encodable`] over a record's labelled text fields.
///
/// # Errors
///
/// Returns [`Error::UnencodableField`] naming the first bad field.
pub fn check_text_fields<T: Codec>(record: &T) -> Result<()> {
    match record
        .text_fields()
        .into_iter()
        .find(|(_, value)| !is_encodable(value))
    {
        Some((field, _)) => Err(Error::UnencodableField {
            kind: T::NAME,
            field,
        }),
        None => Ok(()),
    }
}

/// Parse a `u32` field.
pub(crate) fn parse_u32(text: &str) -> Option<u32> {
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Approach, Outcome};

    #[test]
    fn test_tokens_do_not_overlap() {
        for (i, a) in TOKENS.iter().enumerate() {
            for (j, b) in TOKENS.iter().enumerate() {
                if i != j {
                    assert!(!a.contains(b), "token {a} contains token {b}");
                }
            }
        }
    }

    #[test]
    fn test_encode_joins_with_own_delimiter() {
        let property = DesignProperty::new("", "engine", "LV-T45");
        assert_eq!(encode(&property), ":dp:engine:dp:LV-T45");
    }

    #[test]
    fn test_decode_rejects_wrong_field_count() {
        assert!(decode::<DesignProperty>("a:dp:b").is_none());
        assert!(decode::<DesignProperty>("a:dp:b:dp:c:dp:d").is_none());
        assert!(decode::<DesignProperty>("").is_none());
        assert!(decode::<DesignProperty>("a:dp:b:dp:c").is_some());
    }

    #[test]
    fn test_empty_list_uses_sentinel() {
        let encoded = encode_list::<VesselDesign, DesignProperty>(&[]);
        assert_eq!(encoded, NO_CHILDREN);
        let decoded = decode_list::<VesselDesign, DesignProperty>(&encoded).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_list_preserves_order() {
        let destinations = vec![
            Destination::new("", "Mun", Approach::Flyby),
            Destination::new("", "Minmus", Approach::Landing),
        ];
        let encoded = encode_list::<VesselDesign, _>(&destinations);
        assert_eq!(encoded, ":ds:Mun:ds:flyby:vd,::ds:Minmus:ds:landing");
        let decoded: Vec<Destination> = decode_list::<VesselDesign, _>(&encoded).unwrap();
        assert_eq!(decoded, destinations);
    }

    #[test]
    fn test_malformed_child_fails_list() {
        let field = ":fl:Mun Flyby:fl:Mun:fl:success:k,:broken";
        assert!(decode_list::<Kerbal, FlightLogEntry>(field).is_none());
    }

    #[test]
    fn test_unknown_enum_text_is_malformed() {
        assert!(decode::<FlightLogEntry>(":fl:Mun Flyby:fl:Mun:fl:exploded").is_none());
        assert!(decode::<FlightLogEntry>(":fl:Mun Flyby:fl:Mun:fl:lost")
            .is_some_and(|entry| entry.outcome() == Outcome::Lost));
    }

    #[test]
    fn test_is_encodable_accepts_plain_text() {
        assert!(is_encodable(""));
        assert!(is_encodable("Valentina Kerman"));
        assert!(is_encodable("ratio 3:2 works"));
    }

    #[test]
    fn test_is_encodable_rejects_tokens_and_sentinels() {
        assert!(!is_encodable("has :k: inside"));
        assert!(!is_encodable("a:vd,:b"));
        assert!(!is_encodable(NO_CHILDREN));
        assert!(!is_encodable(TOMBSTONE));
        assert!(!is_encodable("two\nlines"));
    }

    #[test]
    fn test_is_encodable_rejects_partial_tokens_at_edges() {
        assert!(!is_encodable("ends with :k"));
        assert!(!is_encodable("ends with colon:"));
        assert!(!is_encodable(":starts with colon"));
        assert!(!is_encodable("m:starts with suffix"));
    }

    #[test]
    fn test_check_text_fields_names_field() {
        let property = DesignProperty::new("", "bad:dp:key", "x");
        let err = check_text_fields(&property).unwrap_err();
        assert!(matches!(
            err,
            Error::UnencodableField {
                kind: "design property",
                field: "key"
            }
        ));
    }
}
