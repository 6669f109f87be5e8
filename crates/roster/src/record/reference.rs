//! Reference fields: a stored key plus, after the resolve phase, a live link.
//!
//! # States
//! - `Empty`: the field names nothing.
//! - `Unresolved`: constructed or decoded, not yet looked up.
//! - `Resolved`: live link to the record stored under the key.
//! - `Dangling`: looked up and not found; the stored key is kept verbatim.
//! - `Tombstoned`: the target was deleted. Terminal.
//!
//! Only `Unresolved` ever transitions to `Resolved`, so a tombstoned field can
//! never be linked again, whatever gets added to the store later.

use tracing::{debug, warn};

use super::{Deletion, DisplayField, Handle, Kind, Lookup, RecordKey};

/// Stored key of a tombstoned reference.
pub const TOMBSTONE: &str = "[REDACTED]";

/// Resolution state of a reference field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefState {
    /// No target.
    Empty,
    /// Key known, live link not yet looked up.
    Unresolved(RecordKey),
    /// Live link established.
    Resolved {
        /// Stored key of the target.
        key: RecordKey,
        /// Arena handle of the target.
        handle: Handle,
    },
    /// Key not found during resolution.
    Dangling(RecordKey),
    /// Target deleted.
    Tombstoned {
        /// Reason supplied by the deleter. Not persisted.
        reason: Option<String>,
    },
}

/// A field pointing at another record by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    target: Kind,
    state: RefState,
}

impl Reference {
    /// A reference naming nothing.
    #[must_use]
    pub fn empty(target: Kind) -> Self {
        Self {
            target,
            state: RefState::Empty,
        }
    }

    /// An unresolved reference to `key`. An empty name is an empty reference.
    #[must_use]
    pub fn to(target: Kind, key: impl Into<RecordKey>) -> Self {
        let state = match key.into() {
            RecordKey::Name(name) if name.is_empty() => RefState::Empty,
            key => RefState::Unresolved(key),
        };
        Self { target, state }
    }

    /// Rebuild a reference from its stored text.
    ///
    /// Returns `None` when the text is not a valid key for the target kind.
    #[must_use]
    pub fn from_stored(target: Kind, text: &str) -> Option<Self> {
        let state = match text {
            "" => RefState::Empty,
            TOMBSTONE => RefState::Tombstoned { reason: None },
            _ => RefState::Unresolved(RecordKey::parse(target, text)?),
        };
        Some(Self { target, state })
    }

    /// The text written to storage.
    #[must_use]
    pub fn stored(&self) -> String {
        match &self.state {
            RefState::Empty => String::new(),
            RefState::Unresolved(key)
            | RefState::Resolved { key, .. }
            | RefState::Dangling(key) => key.to_string(),
            RefState::Tombstoned { .. } => TOMBSTONE.to_string(),
        }
    }

    /// Kind of record this field points at.
    #[must_use]
    pub fn target(&self) -> Kind {
        self.target
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &RefState {
        &self.state
    }

    /// The stored key, unless empty or tombstoned.
    #[must_use]
    pub fn key(&self) -> Option<&RecordKey> {
        match &self.state {
            RefState::Unresolved(key)
            | RefState::Resolved { key, .. }
            | RefState::Dangling(key) => Some(key),
            RefState::Empty | RefState::Tombstoned { .. } => None,
        }
    }

    /// The live link, if any.
    #[must_use]
    pub fn handle(&self) -> Option<Handle> {
        match self.state {
            RefState::Resolved { handle, .. } => Some(handle),
            _ => None,
        }
    }

    /// Whether a live link is held.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.handle().is_some()
    }

    /// Whether the field names nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.state, RefState::Empty)
    }

    /// Whether the target was deleted.
    #[must_use]
    pub fn is_tombstoned(&self) -> bool {
        matches!(self.state, RefState::Tombstoned { .. })
    }

    /// Whether resolution failed to find the target.
    #[must_use]
    pub fn is_dangling(&self) -> bool {
        matches!(self.state, RefState::Dangling(_))
    }

    /// Deletion reason of a tombstoned field.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match &self.state {
            RefState::Tombstoned { reason } => reason.as_deref(),
            _ => None,
        }
    }

    /// Look the key up and link it. Only acts on unresolved fields.
    ///
    /// Returns the target handle when a live link was established.
    pub fn resolve(&mut self, lookup: &dyn Lookup) -> Option<Handle> {
        let RefState::Unresolved(key) = &self.state else {
            return None;
        };
        let key = key.clone();
        if let Some(handle) = lookup.find(self.target, &key) {
            self.state = RefState::Resolved { key, handle };
            Some(handle)
        } else {
            warn!("Dangling reference to {} '{}'", self.target, key);
            self.state = RefState::Dangling(key);
            None
        }
    }

    /// Link an empty field directly to a live record.
    ///
    /// Returns `false` (and leaves the field alone) unless the field is empty.
    pub fn assign(&mut self, key: RecordKey, handle: Handle) -> bool {
        if !self.is_empty() || handle.kind != self.target {
            return false;
        }
        self.state = RefState::Resolved { key, handle };
        true
    }

    /// Tombstone the field if its live link points at the deleted record.
    pub fn on_deleted(&mut self, event: &Deletion<'_>) -> bool {
        if self.handle() != Some(event.handle) {
            return false;
        }
        debug!(
            "Tombstoning reference to {} '{}': {}",
            self.target, event.key, event.reason
        );
        self.state = RefState::Tombstoned {
            reason: Some(event.reason.to_string()),
        };
        true
    }

    /// Text shown to the user.
    #[must_use]
    pub fn display(&self) -> String {
        match &self.state {
            RefState::Empty => "none".to_string(),
            RefState::Dangling(key) => format!("{key} (missing)"),
            _ => self.stored(),
        }
    }

    /// Display pairs for this field: the value, then the reason if tombstoned.
    #[must_use]
    pub fn display_fields(&self, name: &str) -> Vec<DisplayField> {
        let mut fields = vec![DisplayField::text(name, self.display())];
        if let Some(reason) = self.reason() {
            fields.push(DisplayField::text(format!("{name} redaction"), reason));
        }
        fields
    }
}
