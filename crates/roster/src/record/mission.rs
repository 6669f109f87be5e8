//! Missions: a vessel, a destination and the crew boarded for it.

use super::{text_enum, DisplayField, Entity, Kind, Nested, RecordKey, Reference};
use crate::codec::{self, Codec, Composite};
use crate::error::Result;

text_enum! {
    /// Mission lifecycle.
    MissionStatus {
        /// Not yet launched.
        Planned => "planned",
        /// In flight.
        Active => "active",
        /// Finished.
        Completed => "completed",
        /// Called off.
        Aborted => "aborted",
    }
}

text_enum! {
    /// Where a crew member sits.
    Seat {
        /// Mission lead.
        Commander => "commander",
        /// At the controls.
        Pilot => "pilot",
        /// General crew.
        Crew => "crew",
        /// Passenger.
        Passenger => "passenger",
    }
}

/// One crew member boarded on a mission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boarding {
    description: String,
    kerbal: Reference,
    seat: Seat,
}

impl Boarding {
    /// Board the named kerbal (resolved later).
    #[must_use]
    pub fn new(description: impl Into<String>, kerbal: impl Into<String>, seat: Seat) -> Self {
        Self {
            description: description.into(),
            kerbal: Reference::to(Kind::Kerbal, RecordKey::Name(kerbal.into())),
            seat,
        }
    }

    /// The boarded kerbal.
    #[must_use]
    pub fn kerbal(&self) -> &Reference {
        &self.kerbal
    }

    /// Seat assignment.
    #[must_use]
    pub fn seat(&self) -> Seat {
        self.seat
    }

    fn nested(&self) -> Nested {
        let mut fields = self.kerbal.display_fields("Kerbal");
        fields.push(DisplayField::text("Seat", self.seat));
        fields.push(DisplayField::text("Description", self.description.as_str()));
        Nested {
            summary: format!("{} as {}", self.kerbal.display(), self.seat),
            fields,
        }
    }
}

impl Codec for Boarding {
    const NAME: &'static str = "boarding";
    const DELIMITER: &'static str = ":bd:";
    const FIELD_COUNT: usize = 3;

    fn storable_fields(&self) -> Vec<String> {
        vec![
            self.description.clone(),
            self.kerbal.stored(),
            self.seat.to_string(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [description, kerbal, seat] = fields else {
            return None;
        };
        Some(Self {
            description: (*description).to_string(),
            kerbal: Reference::from_stored(Kind::Kerbal, kerbal)?,
            seat: Seat::parse(seat)?,
        })
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("description", self.description.as_str())];
        if let Some(name) = self.kerbal.key().and_then(RecordKey::as_name) {
            fields.push(("kerbal", name));
        }
        fields
    }
}

/// A mission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mission {
    description: String,
    name: String,
    status: MissionStatus,
    vessel: Reference,
    destination: String,
    crew: Vec<Boarding>,
}

impl Mission {
    /// Create a planned mission with no vessel and no crew.
    #[must_use]
    pub fn new(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            description: codec::NO_DESCRIPTION.to_string(),
            name: name.into(),
            status: MissionStatus::Planned,
            vessel: Reference::empty(Kind::Vessel),
            destination: destination.into(),
            crew: Vec::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: MissionStatus) -> Self {
        self.status = status;
        self
    }

    /// Name the vessel flying the mission (resolved later).
    #[must_use]
    pub fn with_vessel(mut self, id: u32) -> Self {
        self.vessel = Reference::to(Kind::Vessel, id);
        self
    }

    /// Board a kerbal.
    #[must_use]
    pub fn with_crew(mut self, kerbal: impl Into<String>, seat: Seat) -> Self {
        self.crew.push(Boarding::new("", kerbal, seat));
        self
    }

    /// Append a prepared boarding.
    #[must_use]
    pub fn with_boarding(mut self, boarding: Boarding) -> Self {
        self.crew.push(boarding);
        self
    }

    /// The mission's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lifecycle status.
    #[must_use]
    pub fn status(&self) -> MissionStatus {
        self.status
    }

    /// Vessel reference.
    #[must_use]
    pub fn vessel(&self) -> &Reference {
        &self.vessel
    }

    /// Destination body.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Boarded crew.
    #[must_use]
    pub fn crew(&self) -> &[Boarding] {
        &self.crew
    }
}

impl Codec for Mission {
    const NAME: &'static str = "mission";
    const DELIMITER: &'static str = ":m:";
    const FIELD_COUNT: usize = 6;

    fn storable_fields(&self) -> Vec<String> {
        vec![
            self.description.clone(),
            self.name.clone(),
            self.status.to_string(),
            self.vessel.stored(),
            self.destination.clone(),
            codec::encode_list::<Self, _>(&self.crew),
        ]
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [description, name, status, vessel, destination, crew] = fields else {
            return None;
        };
        Some(Self {
            description: (*description).to_string(),
            name: (*name).to_string(),
            status: MissionStatus::parse(status)?,
            vessel: Reference::from_stored(Kind::Vessel, vessel)?,
            destination: (*destination).to_string(),
            crew: codec::decode_list::<Self, _>(crew)?,
        })
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("description", self.description.as_str()),
            ("name", self.name.as_str()),
            ("destination", self.destination.as_str()),
        ]
    }

    fn check_encodable(&self) -> Result<()> {
        codec::check_text_fields(self)?;
        self.crew.iter().try_for_each(Codec::check_encodable)
    }
}

impl Composite for Mission {
    const SEPARATOR: &'static str = ":m,:";
}

impl Entity for Mission {
    const KIND: Kind = Kind::Mission;

    fn key(&self) -> RecordKey {
        RecordKey::Name(self.name.clone())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn display_fields(&self) -> Vec<DisplayField> {
        let mut fields = vec![
            DisplayField::text("Name", self.name.as_str()),
            DisplayField::text("Description", self.description.as_str()),
            DisplayField::text("Status", self.status),
        ];
        fields.extend(self.vessel.display_fields("Vessel"));
        fields.push(DisplayField::text("Destination", self.destination.as_str()));
        fields.push(DisplayField::records(
            "Crew",
            self.crew.iter().map(Boarding::nested).collect(),
        ));
        fields
    }

    fn summary(&self) -> String {
        format!(
            "{} ({}, {} crew, to {})",
            self.name,
            self.status,
            self.crew.len(),
            self.destination
        )
    }

    fn references(&self) -> Vec<(&'static str, &Reference)> {
        std::iter::once(("vessel", &self.vessel))
            .chain(self.crew.iter().map(|boarding| ("crew", &boarding.kerbal)))
            .collect()
    }

    fn references_mut(&mut self) -> Vec<&mut Reference> {
        std::iter::once(&mut self.vessel)
            .chain(self.crew.iter_mut().map(|boarding| &mut boarding.kerbal))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use crate::record::{Deletion, Handle, Lookup};

    struct EverythingAt(usize);

    impl Lookup for EverythingAt {
        fn find(&self, kind: Kind, _key: &RecordKey) -> Option<Handle> {
            Some(Handle {
                kind,
                slot: self.0,
            })
        }
    }

    fn flyby() -> Mission {
        Mission::new("Mun Flyby", "Mun")
            .with_description("Swing past the Mun")
            .with_vessel(3)
            .with_crew("Val", Seat::Commander)
            .with_crew("Jeb", Seat::Pilot)
    }

    #[test]
    fn test_new_mission_defaults() {
        let mission = Mission::new("Mun Flyby", "Mun");
        assert_eq!(mission.status(), MissionStatus::Planned);
        assert!(mission.vessel().is_empty());
        assert!(mission.crew().is_empty());
    }

    #[test]
    fn test_encode_layout() {
        let mission = Mission::new("Hop", "Kerbin").with_crew("Val", Seat::Crew);
        assert_eq!(
            encode(&mission),
            ":m:Hop:m:planned:m::m:Kerbin:m::bd:Val:bd:crew"
        );
    }

    #[test]
    fn test_round_trip() {
        let mission = flyby();
        let decoded: Mission = decode(&encode(&mission)).unwrap();
        assert_eq!(decoded.display_fields(), mission.display_fields());
        assert_eq!(decoded.crew().len(), 2);
        assert_eq!(decoded.vessel().key(), Some(&RecordKey::Id(3)));
    }

    #[test]
    fn test_decode_rejects_bad_vessel_id() {
        assert!(decode::<Mission>(":m:Hop:m:planned:m:x:m:Kerbin:m:(none)").is_none());
    }

    #[test]
    fn test_references_cover_vessel_and_crew() {
        let mission = flyby();
        let labels: Vec<&str> = mission.references().iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["vessel", "crew", "crew"]);
    }

    #[test]
    fn test_notify_checks_every_field() {
        let mut mission = Mission::new("Mun Flyby", "Mun")
            .with_crew("Val", Seat::Commander)
            .with_crew("Val", Seat::Passenger);
        let targets = mission.ready(&EverythingAt(0));
        assert_eq!(targets.len(), 2);

        let key = RecordKey::from("Val");
        let tombstoned = mission.notify(&Deletion {
            handle: Handle {
                kind: Kind::Kerbal,
                slot: 0,
            },
            key: &key,
            reason: "retired",
        });
        assert_eq!(tombstoned, 2);
        assert!(mission.crew().iter().all(|b| b.kerbal().is_tombstoned()));
    }

    #[test]
    fn test_check_encodable_includes_crew_names() {
        let mission = Mission::new("Hop", "Kerbin").with_crew("Bad:m:Name", Seat::Crew);
        assert!(mission.check_encodable().is_err());
    }

    #[test]
    fn test_summary() {
        assert_eq!(flyby().summary(), "Mun Flyby (planned, 2 crew, to Mun)");
    }
}
