//! The record store.
//!
//! Owns one collection per [`Kind`], enforces key uniqueness, and runs the
//! two-phase load (construct every record, then resolve every reference),
//! deletion notification, and flat-text save.
//!
//! The store is single-actor: every mutation takes `&mut self` and completes
//! before returning. It is deliberately not `Sync`; sharing it between callers
//! requires wrapping it in a lock around `add`, `delete` and `load_all`.

mod arena;
mod bus;
pub mod medium;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::{
    Handle, Kerbal, Kind, Lookup, Mission, Record, RecordKey, Vessel, VesselDesign,
};

use arena::Arena;
pub use bus::DeletionReport;
pub use medium::{DirMedium, Medium, MemoryMedium};

/// Behaviour switches for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Skip malformed persisted lines instead of failing the load.
    pub skip_malformed: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            skip_malformed: true,
        }
    }
}

/// Outcome of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Records loaded per kind.
    pub loaded: BTreeMap<Kind, usize>,
    /// Lines skipped because they failed to decode.
    pub malformed: usize,
    /// Lines skipped because their key was already loaded.
    pub duplicates: usize,
    /// Reference fields whose target was not found.
    pub dangling: usize,
}

impl LoadReport {
    /// Total records loaded.
    #[must_use]
    pub fn total(&self) -> usize {
        self.loaded.values().sum()
    }
}

/// Outcome of a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    /// Records written per kind.
    pub saved: BTreeMap<Kind, usize>,
    /// When the save completed.
    pub at: DateTime<Utc>,
}

/// One live link in the record graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Link {
    /// Kind of the referencing record.
    pub from_kind: Kind,
    /// Key of the referencing record.
    pub from: RecordKey,
    /// Reference field label.
    pub field: &'static str,
    /// Kind of the target.
    pub to_kind: Kind,
    /// Key of the target.
    pub to: RecordKey,
}

/// The authoritative record collections.
#[derive(Debug)]
pub struct Store {
    medium: Box<dyn Medium>,
    options: StoreOptions,
    kerbals: Arena,
    missions: Arena,
    designs: Arena,
    vessels: Arena,
    fingerprint: blake3::Hash,
    last_saved: Option<DateTime<Utc>>,
}

impl Store {
    /// Create an empty store over a medium without loading it.
    #[must_use]
    pub fn with_medium(medium: Box<dyn Medium>, options: StoreOptions) -> Self {
        let mut store = Self {
            medium,
            options,
            kerbals: Arena::new(Kind::Kerbal),
            missions: Arena::new(Kind::Mission),
            designs: Arena::new(Kind::Design),
            vessels: Arena::new(Kind::Vessel),
            fingerprint: blake3::hash(b""),
            last_saved: None,
        };
        store.fingerprint = store.compute_fingerprint();
        store
    }

    /// Create an empty in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_medium(Box::new(MemoryMedium::new()), StoreOptions::default())
    }

    /// Open the configured data directory and load it.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be read, or a malformed record is
    /// found while `load.skip_malformed` is off.
    pub fn open(config: &Config) -> Result<Self> {
        let medium = DirMedium::new(config.data_dir(), config.storage.backup_on_save);
        let options = StoreOptions {
            skip_malformed: config.load.skip_malformed,
        };
        let mut store = Self::with_medium(Box::new(medium), options);
        store.load_all()?;
        Ok(store)
    }

    /// The persistence medium.
    #[must_use]
    pub fn medium(&self) -> &dyn Medium {
        self.medium.as_ref()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Add a fresh record and resolve its references.
    ///
    /// Adding a mission also assigns it to every boarded crew member who is
    /// not already on a mission.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if the key is taken, [`Error::ReservedKey`]
    /// for sentinel keys (the record's own or a referenced one), and [`Error::UnencodableField`] for text the codec
    /// cannot store.
    pub fn add(&mut self, record: impl Into<Record>) -> Result<Handle> {
        let mut record = record.into();
        let kind = record.kind();
        let key = record.key();

        if key.is_reserved() {
            return Err(Error::ReservedKey { kind, key });
        }
        if let Some((target, reserved)) = record
            .references()
            .into_iter()
            .filter_map(|(_, reference)| Some((reference.target(), reference.key()?)))
            .find(|(_, reference_key)| reference_key.is_reserved())
        {
            return Err(Error::ReservedKey {
                kind: target,
                key: reserved.clone(),
            });
        }
        record.check_encodable()?;
        if self.arena(kind).contains(&key) {
            return Err(Error::DuplicateKey { kind, key });
        }

        let targets = record.ready(&*self);
        let handle = self
            .arena_mut(kind)
            .insert(record)
            .ok_or_else(|| Error::DuplicateKey {
                kind,
                key: key.clone(),
            })?;
        for target in targets {
            self.subscribe(handle, target);
        }
        if kind == Kind::Mission {
            self.board_crew(handle, &key);
        }

        debug!("Added {} '{}'", kind, key);
        Ok(handle)
    }

    fn board_crew(&mut self, mission: Handle, key: &RecordKey) {
        let crew: Vec<Handle> = self
            .entry(mission)
            .map(|entry| {
                entry
                    .record
                    .references()
                    .into_iter()
                    .filter(|(field, _)| *field == "crew")
                    .filter_map(|(_, reference)| reference.handle())
                    .collect()
            })
            .unwrap_or_default();

        for member in crew {
            let Some(kerbal) = self
                .entry_mut(member)
                .and_then(|entry| entry.record.as_kerbal_mut())
            else {
                continue;
            };
            if kerbal.mission_mut().assign(key.clone(), mission) {
                debug!("Boarded '{}' on mission '{}'", kerbal.name(), key);
                self.subscribe(member, mission);
            } else {
                warn!(
                    "'{}' already has mission '{}', not boarding on '{}'",
                    kerbal.name(),
                    kerbal.mission().display(),
                    key
                );
            }
        }
    }

    fn subscribe(&mut self, subscriber: Handle, target: Handle) {
        if let Some(entry) = self.entry_mut(target) {
            entry.subscribers.insert(subscriber);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Look a record up by key.
    #[must_use]
    pub fn get(&self, kind: Kind, key: &RecordKey) -> Option<&Record> {
        let handle = self.arena(kind).find(key)?;
        self.record(handle)
    }

    /// Follow a live link.
    #[must_use]
    pub fn record(&self, handle: Handle) -> Option<&Record> {
        self.entry(handle).map(|entry| &entry.record)
    }

    /// A kerbal by name.
    #[must_use]
    pub fn kerbal(&self, name: &str) -> Option<&Kerbal> {
        self.get(Kind::Kerbal, &RecordKey::from(name))
            .and_then(Record::as_kerbal)
    }

    /// A mission by name.
    #[must_use]
    pub fn mission(&self, name: &str) -> Option<&Mission> {
        self.get(Kind::Mission, &RecordKey::from(name))
            .and_then(Record::as_mission)
    }

    /// A vessel design by name.
    #[must_use]
    pub fn design(&self, name: &str) -> Option<&VesselDesign> {
        self.get(Kind::Design, &RecordKey::from(name))
            .and_then(Record::as_design)
    }

    /// A vessel by id.
    #[must_use]
    pub fn vessel(&self, id: u32) -> Option<&Vessel> {
        self.get(Kind::Vessel, &RecordKey::Id(id))
            .and_then(Record::as_vessel)
    }

    /// Every record of a kind, in key order.
    pub fn records(&self, kind: Kind) -> impl Iterator<Item = &Record> + '_ {
        self.arena(kind).entries().map(|entry| &entry.record)
    }

    /// Every kerbal, by name.
    pub fn kerbals(&self) -> impl Iterator<Item = &Kerbal> + '_ {
        self.records(Kind::Kerbal).filter_map(Record::as_kerbal)
    }

    /// Every mission, by name.
    pub fn missions(&self) -> impl Iterator<Item = &Mission> + '_ {
        self.records(Kind::Mission).filter_map(Record::as_mission)
    }

    /// Every vessel design, by name.
    pub fn designs(&self) -> impl Iterator<Item = &VesselDesign> + '_ {
        self.records(Kind::Design).filter_map(Record::as_design)
    }

    /// Every vessel, by id.
    pub fn vessels(&self) -> impl Iterator<Item = &Vessel> + '_ {
        self.records(Kind::Vessel).filter_map(Record::as_vessel)
    }

    /// Number of records of a kind.
    #[must_use]
    pub fn len(&self, kind: Kind) -> usize {
        self.arena(kind).len()
    }

    /// Whether the store holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Kind::ALL.iter().all(|&kind| self.len(kind) == 0)
    }

    /// Records subscribed to a record's deletion, sorted.
    #[must_use]
    pub fn subscribers(&self, kind: Kind, key: &RecordKey) -> Vec<(Kind, RecordKey)> {
        let Some(entry) = self.arena(kind).find(key).and_then(|h| self.entry(h)) else {
            return Vec::new();
        };
        let mut subscribers: Vec<(Kind, RecordKey)> = entry
            .subscribers
            .iter()
            .filter_map(|&handle| self.record(handle))
            .map(|record| (record.kind(), record.key()))
            .collect();
        subscribers.sort();
        subscribers
    }

    /// The live-link graph, sorted.
    #[must_use]
    pub fn links(&self) -> Vec<Link> {
        let mut links: Vec<Link> = Kind::ALL
            .iter()
            .flat_map(|&kind| self.records(kind))
            .flat_map(|record| {
                record
                    .references()
                    .into_iter()
                    .filter_map(|(field, reference)| {
                        let target = self.record(reference.handle()?)?;
                        Some(Link {
                            from_kind: record.kind(),
                            from: record.key(),
                            field,
                            to_kind: target.kind(),
                            to: target.key(),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        links.sort();
        links
    }

    // =========================================================================
    // Load / save
    // =========================================================================

    /// Discard in-memory state and reload every collection.
    ///
    /// Phase one decodes every line of every kind. Malformed lines (including
    /// lines keyed by a sentinel) and duplicate keys are skipped. Phase two resolves every record's
    /// references against the complete universe.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read, or on a malformed line
    /// when malformed lines are not skipped. The store is left empty.
    pub fn load_all(&mut self) -> Result<LoadReport> {
        self.clear();
        let mut report = LoadReport::default();

        for kind in Kind::ALL {
            let text = match self.medium.read(kind) {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(err) => {
                    self.clear();
                    return Err(err);
                }
            };
            for (index, line) in text.lines().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let Some(record) =
                    Record::decode(kind, line).filter(|record| !record.key().is_reserved())
                else {
                    if !self.options.skip_malformed {
                        self.clear();
                        return Err(Error::MalformedRecord {
                            kind,
                            line: index + 1,
                        });
                    }
                    warn!("Skipping malformed {} record at line {}", kind, index + 1);
                    report.malformed += 1;
                    continue;
                };
                let key = record.key();
                if self.arena_mut(kind).insert(record).is_none() {
                    warn!("Skipping duplicate {} '{}'", kind, key);
                    report.duplicates += 1;
                    continue;
                }
                *report.loaded.entry(kind).or_default() += 1;
            }
        }

        report.dangling = self.resolve_all();
        self.fingerprint = self.compute_fingerprint();

        info!(
            "Loaded {} records from {} ({} malformed, {} duplicate, {} dangling)",
            report.total(),
            self.medium.location(),
            report.malformed,
            report.duplicates,
            report.dangling
        );
        Ok(report)
    }

    /// Reload from the medium, reporting success.
    pub fn discard(&mut self) -> bool {
        match self.load_all() {
            Ok(_) => true,
            Err(err) => {
                error!("Reload failed: {}", err);
                false
            }
        }
    }

    /// Run `ready` on every record. Returns the number of dangling references.
    fn resolve_all(&mut self) -> usize {
        let handles: Vec<Handle> = Kind::ALL
            .iter()
            .flat_map(|&kind| self.arena(kind).handles())
            .collect();

        let mut dangling = 0;
        for handle in handles {
            let Some(mut entry) = self.arena_mut(handle.kind).take(handle.slot) else {
                continue;
            };
            let targets = entry.record.ready(&*self);
            dangling += entry
                .record
                .references()
                .iter()
                .filter(|(_, reference)| reference.is_dangling())
                .count();
            self.arena_mut(handle.kind).restore(handle.slot, entry);
            for target in targets {
                self.subscribe(handle, target);
            }
        }
        dangling
    }

    /// Write every collection, reporting success.
    pub fn save_all(&mut self) -> bool {
        match self.try_save_all() {
            Ok(_) => true,
            Err(err) => {
                error!("Save failed: {}", err);
                false
            }
        }
    }

    /// Write every collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Save`] naming the collection that failed. Collections
    /// written before the failure stay written.
    pub fn try_save_all(&mut self) -> Result<SaveReport> {
        let mut saved = BTreeMap::new();
        for kind in Kind::ALL {
            let text = self.encode_kind(kind);
            self.medium
                .write(kind, &text)
                .map_err(|err| Error::save(kind, err.to_string()))?;
            saved.insert(kind, self.len(kind));
        }

        let at = Utc::now();
        self.fingerprint = self.compute_fingerprint();
        self.last_saved = Some(at);
        info!("Saved records to {}", self.medium.location());
        Ok(SaveReport { saved, at })
    }

    /// Whether the in-memory universe differs from the last load or save.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.fingerprint != self.compute_fingerprint()
    }

    /// When the last successful save happened.
    #[must_use]
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    fn encode_kind(&self, kind: Kind) -> String {
        self.records(kind)
            .map(|record| record.encode() + "\n")
            .collect()
    }

    fn compute_fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for kind in Kind::ALL {
            hasher.update(kind.file_stem().as_bytes());
            hasher.update(self.encode_kind(kind).as_bytes());
        }
        hasher.finalize()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn clear(&mut self) {
        for kind in Kind::ALL {
            self.arena_mut(kind).clear();
        }
    }

    fn arena(&self, kind: Kind) -> &Arena {
        match kind {
            Kind::Kerbal => &self.kerbals,
            Kind::Mission => &self.missions,
            Kind::Design => &self.designs,
            Kind::Vessel => &self.vessels,
        }
    }

    fn arena_mut(&mut self, kind: Kind) -> &mut Arena {
        match kind {
            Kind::Kerbal => &mut self.kerbals,
            Kind::Mission => &mut self.missions,
            Kind::Design => &mut self.designs,
            Kind::Vessel => &mut self.vessels,
        }
    }

    fn entry(&self, handle: Handle) -> Option<&arena::Entry> {
        self.arena(handle.kind).get(handle.slot)
    }

    fn entry_mut(&mut self, handle: Handle) -> Option<&mut arena::Entry> {
        self.arena_mut(handle.kind).get_mut(handle.slot)
    }
}

impl Lookup for Store {
    fn find(&self, kind: Kind, key: &RecordKey) -> Option<Handle> {
        self.arena(kind).find(key)
    }
}
