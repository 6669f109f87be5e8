//! Deletion notification.
//!
//! Deleting a record fans a [`Deletion`] out to every subscriber before the
//! record leaves its collection. Pending deletions run off a work stack rather
//! than the call stack, so a deletion queued while another is being processed
//! is handled after it instead of nesting inside it.

use serde::Serialize;
use tracing::{debug, info};

use super::Store;
use crate::error::{Error, Result};
use crate::record::{Deletion, Handle, Kind, RecordKey};

/// Outcome of a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    /// Records removed, in processing order.
    pub removed: Vec<(Kind, RecordKey)>,
    /// Reference fields tombstoned across all subscribers.
    pub tombstoned: usize,
    /// The reason attached to every tombstone.
    pub reason: String,
}

impl Store {
    /// Delete one record, tombstoning every reference to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyReason`] for a blank reason and
    /// [`Error::NotFound`] for an unknown key.
    pub fn delete(&mut self, kind: Kind, key: &RecordKey, reason: &str) -> Result<DeletionReport> {
        self.delete_many(&[(kind, key.clone())], reason)
    }

    /// Delete several records with one reason.
    ///
    /// Every key is looked up before anything is deleted. Once deletion
    /// starts there is no rollback: subscribers already tombstoned stay
    /// tombstoned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyReason`] for a blank reason and
    /// [`Error::NotFound`] for the first unknown key.
    pub fn delete_many(
        &mut self,
        targets: &[(Kind, RecordKey)],
        reason: &str,
    ) -> Result<DeletionReport> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(Error::EmptyReason);
        }

        let mut pending = targets
            .iter()
            .map(|(kind, key)| {
                self.find_handle(*kind, key)
                    .ok_or_else(|| Error::not_found(*kind, key.clone()))
            })
            .collect::<Result<Vec<Handle>>>()?;
        pending.reverse();

        let mut report = DeletionReport {
            removed: Vec::new(),
            tombstoned: 0,
            reason: reason.to_string(),
        };
        while let Some(handle) = pending.pop() {
            if let Some((key, tombstoned)) = self.delete_one(handle, reason) {
                report.tombstoned += tombstoned;
                report.removed.push((handle.kind, key));
            }
        }
        Ok(report)
    }

    /// Notify, unlink and remove one record. `None` if it is already gone.
    fn delete_one(&mut self, handle: Handle, reason: &str) -> Option<(RecordKey, usize)> {
        let (key, subscribers) = {
            let entry = self.entry(handle)?;
            (entry.record.key(), entry.subscribers.clone())
        };
        let event = Deletion {
            handle,
            key: &key,
            reason,
        };

        let mut tombstoned = 0;
        for subscriber in subscribers {
            if subscriber == handle {
                continue;
            }
            if let Some(entry) = self.entry_mut(subscriber) {
                let count = entry.record.notify(&event);
                debug!(
                    "Notified {} '{}' ({} field(s) tombstoned)",
                    entry.record.kind(),
                    entry.record.key(),
                    count
                );
                tombstoned += count;
            }
        }

        let entry = self.arena_mut(handle.kind).remove(handle.slot)?;
        for (_, reference) in entry.record.references() {
            if let Some(target) = reference.handle().and_then(|t| self.entry_mut(t)) {
                target.subscribers.remove(&handle);
            }
        }

        info!(
            "Deleted {} '{}' ({}), {} reference(s) tombstoned",
            handle.kind, key, reason, tombstoned
        );
        Some((key, tombstoned))
    }

    fn find_handle(&self, kind: Kind, key: &RecordKey) -> Option<Handle> {
        self.arena(kind).find(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Gender, Kerbal, Mission, Role, Seat, Vessel, VesselDesign, TOMBSTONE};
    use crate::store::tests::fleet;

    fn flyby_with_val() -> Store {
        let mut store = Store::in_memory();
        store
            .add(Kerbal::new("Val", Gender::Female, Role::Engineer))
            .unwrap();
        store
            .add(Mission::new("Mun Flyby", "Mun").with_crew("Val", Seat::Commander))
            .unwrap();
        store
    }

    #[test]
    fn test_delete_mission_tombstones_crew() {
        let mut store = flyby_with_val();
        assert!(store.kerbal("Val").unwrap().is_deployed());

        let report = store
            .delete(Kind::Mission, &RecordKey::from("Mun Flyby"), "test cleanup")
            .unwrap();
        assert_eq!(
            report.removed,
            vec![(Kind::Mission, RecordKey::from("Mun Flyby"))]
        );
        assert_eq!(report.tombstoned, 1);

        let val = store.kerbal("Val").unwrap();
        assert_eq!(val.mission().display(), TOMBSTONE);
        assert_eq!(val.mission().reason(), Some("test cleanup"));
        assert!(!val.is_deployed());
        assert!(store.mission("Mun Flyby").is_none());
        assert_eq!(store.len(Kind::Mission), 0);
    }

    #[test]
    fn test_tombstone_survives_readding_target() {
        let mut store = flyby_with_val();
        store
            .delete(Kind::Mission, &RecordKey::from("Mun Flyby"), "scrubbed")
            .unwrap();
        store.add(Mission::new("Mun Flyby", "Mun")).unwrap();

        let val = store.kerbal("Val").unwrap();
        assert!(val.mission().is_tombstoned());
        assert!(store
            .subscribers(Kind::Mission, &RecordKey::from("Mun Flyby"))
            .is_empty());
    }

    #[test]
    fn test_delete_reaches_every_subscriber() {
        let mut store = fleet();
        let report = store
            .delete(Kind::Mission, &RecordKey::from("Mun Landing"), "cancelled")
            .unwrap();
        assert_eq!(report.tombstoned, 2);
        assert!(store.kerbals().all(|k| k.mission().is_tombstoned()));
    }

    #[test]
    fn test_delete_kerbal_tombstones_boarding_and_unsubscribes() {
        let mut store = fleet();
        store
            .delete(Kind::Kerbal, &RecordKey::from("Jeb"), "retired")
            .unwrap();

        let mission = store.mission("Mun Landing").unwrap();
        let seats: Vec<String> = mission.crew().iter().map(|b| b.kerbal().display()).collect();
        assert_eq!(seats, vec!["Val".to_string(), TOMBSTONE.to_string()]);
        assert_eq!(
            store.subscribers(Kind::Mission, &RecordKey::from("Mun Landing")),
            vec![(Kind::Kerbal, RecordKey::from("Val"))]
        );
    }

    #[test]
    fn test_delete_checks_multiple_reference_fields() {
        let mut store = fleet();
        let report = store
            .delete(Kind::Vessel, &RecordKey::Id(1), "lost on descent")
            .unwrap();
        assert_eq!(report.tombstoned, 1);

        let mission = store.mission("Mun Landing").unwrap();
        assert!(mission.vessel().is_tombstoned());
        assert!(mission.crew().iter().all(|b| b.kerbal().is_live()));
        assert!(store
            .subscribers(Kind::Design, &RecordKey::from("Kerbal X"))
            .is_empty());
    }

    #[test]
    fn test_delete_requires_reason() {
        let mut store = flyby_with_val();
        let err = store
            .delete(Kind::Mission, &RecordKey::from("Mun Flyby"), "   ")
            .unwrap_err();
        assert!(matches!(err, Error::EmptyReason));
        assert!(store.mission("Mun Flyby").is_some());
    }

    #[test]
    fn test_delete_unknown_key() {
        let mut store = flyby_with_val();
        let err = store
            .delete(Kind::Kerbal, &RecordKey::from("Bob"), "typo")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_many_validates_before_deleting() {
        let mut store = fleet();
        let err = store
            .delete_many(
                &[
                    (Kind::Kerbal, RecordKey::from("Val")),
                    (Kind::Kerbal, RecordKey::from("Bob")),
                ],
                "cleanup",
            )
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.kerbal("Val").is_some());
    }

    #[test]
    fn test_delete_many_processes_in_order_and_skips_repeats() {
        let mut store = fleet();
        let report = store
            .delete_many(
                &[
                    (Kind::Design, RecordKey::from("Kerbal X")),
                    (Kind::Vessel, RecordKey::Id(1)),
                    (Kind::Design, RecordKey::from("Kerbal X")),
                ],
                "fleet retired",
            )
            .unwrap();
        assert_eq!(
            report.removed,
            vec![
                (Kind::Design, RecordKey::from("Kerbal X")),
                (Kind::Vessel, RecordKey::Id(1)),
            ]
        );
        assert_eq!(report.tombstoned, 2);
        assert_eq!(report.reason, "fleet retired");
    }

    #[test]
    fn test_tombstones_persist_as_sentinel() {
        let mut store = Store::in_memory();
        store.add(VesselDesign::new("Kerbal X", 3)).unwrap();
        store.add(Vessel::new(7, "Kerbal X 1", "Kerbal X")).unwrap();
        store
            .delete(Kind::Design, &RecordKey::from("Kerbal X"), "obsolete")
            .unwrap();
        store.try_save_all().unwrap();
        store.load_all().unwrap();

        let design = store.vessel(7).unwrap().design();
        assert!(design.is_tombstoned());
        assert_eq!(design.reason(), None);
        assert_eq!(design.stored(), TOMBSTONE);
    }
}
