//! Record types for roster.
//!
//! Every persisted entity is a [`Record`]: a closed set of kinds sharing one
//! capability surface ([`Entity`]) for display, storage and reference
//! resolution. Child kinds (commendations, flight log entries, boardings,
//! design properties, destinations) only exist embedded in a parent.

pub mod kerbal;
pub mod mission;
pub mod reference;
pub mod vessel;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{self, Codec};
use crate::error::Result;

pub use kerbal::{Commendation, FlightLogEntry, Gender, Kerbal, Outcome, Role};
pub use mission::{Boarding, Mission, MissionStatus, Seat};
pub use reference::{RefState, Reference, TOMBSTONE};
pub use vessel::{Approach, DesignProperty, Destination, Vessel, VesselDesign, VesselStatus};

/// Declares a lowercase text-backed enumeration with `as_str`/`parse`.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$( Self::$variant ),+];

            /// The stored text form.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }

            /// Parse the stored text form.
            #[must_use]
            pub fn parse(text: &str) -> Option<Self> {
                match text {
                    $( $text => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use text_enum;

/// The stored record kinds, one Store collection each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Crew members, keyed by name.
    Kerbal,
    /// Missions, keyed by name.
    Mission,
    /// Vessel designs, keyed by name.
    Design,
    /// Built vessels, keyed by numeric id.
    Vessel,
}

impl Kind {
    /// Every stored kind, in load/save order.
    pub const ALL: [Self; 4] = [Self::Kerbal, Self::Mission, Self::Design, Self::Vessel];

    /// File stem used by directory persistence.
    #[must_use]
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Kerbal => "kerbals",
            Self::Mission => "missions",
            Self::Design => "designs",
            Self::Vessel => "vessels",
        }
    }

    /// Whether records of this kind are keyed by numeric id.
    #[must_use]
    pub fn keyed_by_id(self) -> bool {
        matches!(self, Self::Vessel)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kerbal => write!(f, "kerbal"),
            Self::Mission => write!(f, "mission"),
            Self::Design => write!(f, "vessel design"),
            Self::Vessel => write!(f, "vessel"),
        }
    }
}

/// Identity of a record within its collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    /// Name-keyed kinds.
    Name(String),
    /// Physical-instance kinds.
    Id(u32),
}

impl RecordKey {
    /// Parse key text the way the given kind stores it.
    #[must_use]
    pub fn parse(kind: Kind, text: &str) -> Option<Self> {
        if kind.keyed_by_id() {
            text.parse().ok().map(Self::Id)
        } else {
            Some(Self::Name(text.to_string()))
        }
    }

    /// The name, for name-keyed kinds.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Id(_) => None,
        }
    }

    /// Whether this key collides with a codec sentinel.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        match self {
            Self::Name(name) => {
                name.is_empty() || name == TOMBSTONE || name == codec::NO_CHILDREN
            }
            Self::Id(_) => false,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

impl From<&str> for RecordKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<u32> for RecordKey {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

/// Arena position of a live record. Slots are never reused, so a handle to a
/// deleted record never aliases a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle {
    /// Collection holding the record.
    pub kind: Kind,
    /// Slot index inside that collection.
    pub slot: usize,
}

/// Records interested in a record's deletion.
pub type Subscribers = BTreeSet<Handle>;

/// Key lookup available to records during the resolve phase.
pub trait Lookup {
    /// Find the handle of the record stored under `key` in `kind`.
    fn find(&self, kind: Kind, key: &RecordKey) -> Option<Handle>;
}

/// A deletion notice fanned out to subscribers.
#[derive(Debug, Clone, Copy)]
pub struct Deletion<'a> {
    /// Handle of the record being deleted.
    pub handle: Handle,
    /// Its key, for logging.
    pub key: &'a RecordKey,
    /// Human-readable reason supplied by the deleter.
    pub reason: &'a str,
}

/// One named value shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayField {
    /// Field label.
    pub name: String,
    /// Field content.
    pub value: FieldValue,
}

/// Content of a display field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Plain text.
    Text(String),
    /// Embedded child records, each separately navigable.
    Records(Vec<Nested>),
}

/// A child record exposed for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nested {
    /// One-line summary.
    pub summary: String,
    /// The child's own fields.
    pub fields: Vec<DisplayField>,
}

impl DisplayField {
    /// A plain text field.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::Text(value.to_string()),
        }
    }

    /// A list of nested child records.
    #[must_use]
    pub fn records(name: impl Into<String>, records: Vec<Nested>) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::Records(records),
        }
    }
}

/// Flatten display fields into `name, value` pairs, nested records addressed
/// as `Field[i].Child`.
#[must_use]
pub fn flatten(fields: &[DisplayField]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    flatten_into("", fields, &mut pairs);
    pairs
}

fn flatten_into(prefix: &str, fields: &[DisplayField], pairs: &mut Vec<(String, String)>) {
    for field in fields {
        let name = format!("{prefix}{}", field.name);
        match &field.value {
            FieldValue::Text(text) => pairs.push((name, text.clone())),
            FieldValue::Records(records) if records.is_empty() => {
                pairs.push((name, "none".to_string()));
            }
            FieldValue::Records(records) => {
                for (index, nested) in records.iter().enumerate() {
                    let item = format!("{name}[{index}]");
                    pairs.push((item.clone(), nested.summary.clone()));
                    flatten_into(&format!("{item}."), &nested.fields, pairs);
                }
            }
        }
    }
}

/// Capabilities shared by every stored record kind.
pub trait Entity: Codec {
    /// The collection this kind lives in.
    const KIND: Kind;

    /// Immutable identity within the collection.
    fn key(&self) -> RecordKey;

    /// Free-text description (empty when absent).
    fn description(&self) -> &str;

    /// Display pairs derived from the current field state.
    fn display_fields(&self) -> Vec<DisplayField>;

    /// A short one-line summary.
    fn summary(&self) -> String;

    /// Every reference field, labelled.
    fn references(&self) -> Vec<(&'static str, &Reference)>;

    /// Every reference field, mutably.
    fn references_mut(&mut self) -> Vec<&mut Reference>;

    /// Resolve stored reference keys into live links.
    ///
    /// Called once per record after the whole universe is loaded. Returns the
    /// handles this record must subscribe to.
    fn ready(&mut self, lookup: &dyn Lookup) -> Vec<Handle> {
        self.references_mut()
            .into_iter()
            .filter_map(|reference| reference.resolve(lookup))
            .collect()
    }

    /// Tombstone every reference field pointing at the deleted record.
    ///
    /// Returns how many fields were tombstoned.
    fn notify(&mut self, event: &Deletion<'_>) -> usize {
        self.references_mut()
            .into_iter()
            .map(|reference| usize::from(reference.on_deleted(event)))
            .sum()
    }
}

/// A stored record of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A crew member.
    Kerbal(Kerbal),
    /// A mission.
    Mission(Mission),
    /// A vessel design.
    Design(VesselDesign),
    /// A built vessel.
    Vessel(Vessel),
}

/// Dispatch one expression over every record variant.
macro_rules! dispatch {
    ($record:expr, $inner:ident => $body:expr) => {
        match $record {
            Record::Kerbal($inner) => $body,
            Record::Mission($inner) => $body,
            Record::Design($inner) => $body,
            Record::Vessel($inner) => $body,
        }
    };
}

impl Record {
    /// The collection this record belongs to.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Kerbal(_) => Kind::Kerbal,
            Self::Mission(_) => Kind::Mission,
            Self::Design(_) => Kind::Design,
            Self::Vessel(_) => Kind::Vessel,
        }
    }

    /// The record's key.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        dispatch!(self, r => r.key())
    }

    /// The record's description.
    #[must_use]
    pub fn description(&self) -> &str {
        dispatch!(self, r => r.description())
    }

    /// Display pairs for the UI.
    #[must_use]
    pub fn display_fields(&self) -> Vec<DisplayField> {
        dispatch!(self, r => r.display_fields())
    }

    /// One-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        dispatch!(self, r => r.summary())
    }

    /// Labelled reference fields.
    #[must_use]
    pub fn references(&self) -> Vec<(&'static str, &Reference)> {
        dispatch!(self, r => r.references())
    }

    /// Storable field sequence, description first.
    #[must_use]
    pub fn storable_fields(&self) -> Vec<String> {
        dispatch!(self, r => r.storable_fields())
    }

    /// Resolve references; returns handles to subscribe to.
    pub fn ready(&mut self, lookup: &dyn Lookup) -> Vec<Handle> {
        dispatch!(self, r => r.ready(lookup))
    }

    /// Deliver a deletion notice; returns tombstoned field count.
    pub fn notify(&mut self, event: &Deletion<'_>) -> usize {
        dispatch!(self, r => r.notify(event))
    }

    /// Check that every stored text value survives the codec.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnencodableField`] for the first offending value.
    pub fn check_encodable(&self) -> Result<()> {
        dispatch!(self, r => r.check_encodable())
    }

    /// Encode with the kind's delimiter.
    #[must_use]
    pub fn encode(&self) -> String {
        dispatch!(self, r => codec::encode(r))
    }

    /// Decode one persisted line of the given kind.
    ///
    /// Returns `None` when the line is malformed.
    #[must_use]
    pub fn decode(kind: Kind, line: &str) -> Option<Self> {
        match kind {
            Kind::Kerbal => codec::decode(line).map(Self::Kerbal),
            Kind::Mission => codec::decode(line).map(Self::Mission),
            Kind::Design => codec::decode(line).map(Self::Design),
            Kind::Vessel => codec::decode(line).map(Self::Vessel),
        }
    }

    /// The kerbal inside, if this is one.
    #[must_use]
    pub fn as_kerbal(&self) -> Option<&Kerbal> {
        match self {
            Self::Kerbal(kerbal) => Some(kerbal),
            _ => None,
        }
    }

    /// The mission inside, if this is one.
    #[must_use]
    pub fn as_mission(&self) -> Option<&Mission> {
        match self {
            Self::Mission(mission) => Some(mission),
            _ => None,
        }
    }

    /// The design inside, if this is one.
    #[must_use]
    pub fn as_design(&self) -> Option<&VesselDesign> {
        match self {
            Self::Design(design) => Some(design),
            _ => None,
        }
    }

    /// The vessel inside, if this is one.
    #[must_use]
    pub fn as_vessel(&self) -> Option<&Vessel> {
        match self {
            Self::Vessel(vessel) => Some(vessel),
            _ => None,
        }
    }

    pub(crate) fn as_kerbal_mut(&mut self) -> Option<&mut Kerbal> {
        match self {
            Self::Kerbal(kerbal) => Some(kerbal),
            _ => None,
        }
    }
}

impl From<Kerbal> for Record {
    fn from(kerbal: Kerbal) -> Self {
        Self::Kerbal(kerbal)
    }
}

impl From<Mission> for Record {
    fn from(mission: Mission) -> Self {
        Self::Mission(mission)
    }
}

impl From<VesselDesign> for Record {
    fn from(design: VesselDesign) -> Self {
        Self::Design(design)
    }
}

impl From<Vessel> for Record {
    fn from(vessel: Vessel) -> Self {
        Self::Vessel(vessel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(Kind::Kerbal.to_string(), "kerbal");
        assert_eq!(Kind::Design.to_string(), "vessel design");
        assert_eq!(Kind::Vessel.file_stem(), "vessels");
    }

    #[test]
    fn test_only_vessels_keyed_by_id() {
        let by_id: Vec<Kind> = Kind::ALL.into_iter().filter(|k| k.keyed_by_id()).collect();
        assert_eq!(by_id, vec![Kind::Vessel]);
    }

    #[test]
    fn test_record_key_parse() {
        assert_eq!(
            RecordKey::parse(Kind::Kerbal, "Val"),
            Some(RecordKey::from("Val"))
        );
        assert_eq!(RecordKey::parse(Kind::Vessel, "12"), Some(RecordKey::Id(12)));
        assert_eq!(RecordKey::parse(Kind::Vessel, "twelve"), None);
    }

    #[test]
    fn test_reserved_keys() {
        assert!(RecordKey::from("").is_reserved());
        assert!(RecordKey::from(TOMBSTONE).is_reserved());
        assert!(RecordKey::from("(none)").is_reserved());
        assert!(!RecordKey::from("Jeb").is_reserved());
        assert!(!RecordKey::Id(0).is_reserved());
    }

    #[test]
    fn test_flatten_nested_records() {
        let fields = vec![
            DisplayField::text("Name", "Val"),
            DisplayField::records(
                "Log",
                vec![Nested {
                    summary: "Mun Flyby".to_string(),
                    fields: vec![DisplayField::text("Body", "Mun")],
                }],
            ),
            DisplayField::records("Awards", Vec::new()),
        ];

        let pairs = flatten(&fields);
        assert_eq!(
            pairs,
            vec![
                ("Name".to_string(), "Val".to_string()),
                ("Log[0]".to_string(), "Mun Flyby".to_string()),
                ("Log[0].Body".to_string(), "Mun".to_string()),
                ("Awards".to_string(), "none".to_string()),
            ]
        );
    }

    #[test]
    fn test_display_field_serializes_untagged() {
        let field = DisplayField::text("Role", "pilot");
        let json = serde_json::to_string(&field).unwrap();
        assert_eq!(json, r#"{"name":"Role","value":"pilot"}"#);
    }
}
