//! Kerbals: crew members, with embedded commendations and flight log.

use super::{text_enum, DisplayField, Entity, Kind, Nested, RecordKey, Reference};
use crate::codec::{self, Codec, Composite};
use crate::error::Result;

text_enum! {
    /// Crew member gender.
    Gender {
        /// Male.
        Male => "male",
        /// Female.
        Female => "female",
    }
}

text_enum! {
    /// Crew specialisation.
    Role {
        /// Flies the vessel.
        Pilot => "pilot",
        /// Repairs and builds.
        Engineer => "engineer",
        /// Runs experiments.
        Scientist => "scientist",
        /// Along for the ride.
        Tourist => "tourist",
    }
}

text_enum! {
    /// How a logged flight ended.
    Outcome {
        /// All objectives met.
        Success => "success",
        /// Some objectives met.
        Partial => "partial",
        /// Objectives missed, crew recovered.
        Failure => "failure",
        /// Vessel lost.
        Lost => "lost",
    }
}

/// An award embedded in a kerbal's record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commendation {
    description: String,
    title: String,
    mission: String,
}

impl Commendation {
    /// Create a commendation. `mission` is historical text, not a link.
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        title: impl Into<String>,
        mission: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            title: title.into(),
            mission: mission.into(),
        }
    }

    /// Award title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Mission the award was earned on.
    #[must_use]
    pub fn mission(&self) -> &str {
        &self.mission
    }

    fn nested(&self) -> Nested {
        Nested {
            summary: self.title.clone(),
            fields: vec![
                DisplayField::text("Title", self.title.as_str()),
                DisplayField::text("Mission", self.mission.as_str()),
                DisplayField::text("Description", self.description.as_str()),
            ],
        }
    }
}

impl Codec for Commendation {
    const NAME: &'static str = "commendation";
    const DELIMITER: &'static str = ":cm:";
    const FIELD_COUNT: usize = 3;

    fn storable_fields(&self) -> Vec<String> {
        vec![
            self.description.clone(),
            self.title.clone(),
            self.mission.clone(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [description, title, mission] = fields else {
            return None;
        };
        Some(Self::new(*description, *title, *mission))
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("description", self.description.as_str()),
            ("title", self.title.as_str()),
            ("mission", self.mission.as_str()),
        ]
    }
}

/// One flown mission in a kerbal's log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightLogEntry {
    description: String,
    mission: String,
    body: String,
    outcome: Outcome,
}

impl FlightLogEntry {
    /// Create a log entry. `mission` is historical text, not a link.
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        mission: impl Into<String>,
        body: impl Into<String>,
        outcome: Outcome,
    ) -> Self {
        Self {
            description: description.into(),
            mission: mission.into(),
            body: body.into(),
            outcome,
        }
    }

    /// Mission flown.
    #[must_use]
    pub fn mission(&self) -> &str {
        &self.mission
    }

    /// Celestial body visited.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// How it ended.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    fn nested(&self) -> Nested {
        Nested {
            summary: format!("{} to {}: {}", self.mission, self.body, self.outcome),
            fields: vec![
                DisplayField::text("Mission", self.mission.as_str()),
                DisplayField::text("Body", self.body.as_str()),
                DisplayField::text("Outcome", self.outcome),
                DisplayField::text("Description", self.description.as_str()),
            ],
        }
    }
}

impl Codec for FlightLogEntry {
    const NAME: &'static str = "flight log entry";
    const DELIMITER: &'static str = ":fl:";
    const FIELD_COUNT: usize = 4;

    fn storable_fields(&self) -> Vec<String> {
        vec![
            self.description.clone(),
            self.mission.clone(),
            self.body.clone(),
            self.outcome.to_string(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [description, mission, body, outcome] = fields else {
            return None;
        };
        Some(Self::new(
            *description,
            *mission,
            *body,
            Outcome::parse(outcome)?,
        ))
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("description", self.description.as_str()),
            ("mission", self.mission.as_str()),
            ("body", self.body.as_str()),
        ]
    }
}

/// A crew member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kerbal {
    description: String,
    name: String,
    gender: Gender,
    role: Role,
    mission: Reference,
    commendations: Vec<Commendation>,
    flight_log: Vec<FlightLogEntry>,
}

impl Kerbal {
    /// Create an unassigned kerbal with no history.
    #[must_use]
    pub fn new(name: impl Into<String>, gender: Gender, role: Role) -> Self {
        Self {
            description: codec::NO_DESCRIPTION.to_string(),
            name: name.into(),
            gender,
            role,
            mission: Reference::empty(Kind::Mission),
            commendations: Vec::new(),
            flight_log: Vec::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Name the kerbal's active mission (resolved later).
    #[must_use]
    pub fn with_mission(mut self, mission: impl Into<String>) -> Self {
        self.mission = Reference::to(Kind::Mission, RecordKey::Name(mission.into()));
        self
    }

    /// Append a commendation.
    #[must_use]
    pub fn with_commendation(mut self, commendation: Commendation) -> Self {
        self.commendations.push(commendation);
        self
    }

    /// Append a flight log entry.
    #[must_use]
    pub fn with_flight(mut self, entry: FlightLogEntry) -> Self {
        self.flight_log.push(entry);
        self
    }

    /// The kerbal's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gender.
    #[must_use]
    pub fn gender(&self) -> Gender {
        self.gender
    }

    /// Specialisation.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Active mission reference.
    #[must_use]
    pub fn mission(&self) -> &Reference {
        &self.mission
    }

    /// Awards.
    #[must_use]
    pub fn commendations(&self) -> &[Commendation] {
        &self.commendations
    }

    /// Flown missions.
    #[must_use]
    pub fn flight_log(&self) -> &[FlightLogEntry] {
        &self.flight_log
    }

    /// Whether the kerbal is currently on a live mission.
    #[must_use]
    pub fn is_deployed(&self) -> bool {
        self.mission.is_live()
    }

    pub(crate) fn mission_mut(&mut self) -> &mut Reference {
        &mut self.mission
    }
}

impl Codec for Kerbal {
    const NAME: &'static str = "kerbal";
    const DELIMITER: &'static str = ":k:";
    const FIELD_COUNT: usize = 7;

    fn storable_fields(&self) -> Vec<String> {
        vec![
            self.description.clone(),
            self.name.clone(),
            self.gender.to_string(),
            self.role.to_string(),
            self.mission.stored(),
            codec::encode_list::<Self, _>(&self.commendations),
            codec::encode_list::<Self, _>(&self.flight_log),
        ]
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [description, name, gender, role, mission, commendations, flight_log] = fields else {
            return None;
        };
        Some(Self {
            description: (*description).to_string(),
            name: (*name).to_string(),
            gender: Gender::parse(gender)?,
            role: Role::parse(role)?,
            mission: Reference::from_stored(Kind::Mission, mission)?,
            commendations: codec::decode_list::<Self, _>(commendations)?,
            flight_log: codec::decode_list::<Self, _>(flight_log)?,
        })
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![
            ("description", self.description.as_str()),
            ("name", self.name.as_str()),
        ];
        if let Some(mission) = self.mission.key().and_then(RecordKey::as_name) {
            fields.push(("mission", mission));
        }
        fields
    }

    fn check_encodable(&self) -> Result<()> {
        codec::check_text_fields(self)?;
        self.commendations
            .iter()
            .try_for_each(Codec::check_encodable)?;
        self.flight_log.iter().try_for_each(Codec::check_encodable)
    }
}

impl Composite for Kerbal {
    const SEPARATOR: &'static str = ":k,:";
}

impl Entity for Kerbal {
    const KIND: Kind = Kind::Kerbal;

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
            DisplayField::text("Gender", self.gender),
            DisplayField::text("Role", self.role),
        ];
        fields.extend(self.mission.display_fields("Mission"));
        fields.push(DisplayField::text(
            "Deployed",
            if self.is_deployed() { "yes" } else { "no" },
        ));
        fields.push(DisplayField::records(
            "Commendations",
            self.commendations.iter().map(Commendation::nested).collect(),
        ));
        fields.push(DisplayField::records(
            "Flight log",
            self.flight_log.iter().map(FlightLogEntry::nested).collect(),
        ));
        fields
    }

    fn summary(&self) -> String {
        let status = if self.is_deployed() {
            format!("on {}", self.mission.stored())
        } else {
            "available".to_string()
        };
        format!("{} ({} {}, {status})", self.name, self.gender, self.role)
    }

    fn references(&self) -> Vec<(&'static str, &Reference)> {
        vec![("mission", &self.mission)]
    }

    fn references_mut(&mut self) -> Vec<&mut Reference> {
        vec![&mut self.mission]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use crate::record::TOMBSTONE;

    fn val() -> Kerbal {
        Kerbal::new("Val", Gender::Female, Role::Engineer)
            .with_description("First engineer in orbit")
            .with_mission("Mun Flyby")
            .with_commendation(Commendation::new("", "Ribbon of Valor", "Kerbin Orbit"))
            .with_flight(FlightLogEntry::new(
                "Smooth ride",
                "Kerbin Orbit",
                "Kerbin",
                Outcome::Success,
            ))
            .with_flight(FlightLogEntry::new("", "Minmus Hop", "Minmus", Outcome::Partial))
    }

    #[test]
    fn test_new_kerbal_is_unassigned() {
        let kerbal = Kerbal::new("Jeb", Gender::Male, Role::Pilot);
        assert!(kerbal.mission().is_empty());
        assert!(!kerbal.is_deployed());
        assert!(kerbal.commendations().is_empty());
        assert_eq!(kerbal.description(), "");
    }

    #[test]
    fn test_storable_fields_start_with_description() {
        let fields = val().storable_fields();
        assert_eq!(fields.len(), Kerbal::FIELD_COUNT);
        assert_eq!(fields[0], "First engineer in orbit");
        assert_eq!(fields[1], "Val");
        assert_eq!(fields[4], "Mun Flyby");
    }

    #[test]
    fn test_encode_layout() {
        let kerbal = Kerbal::new("Bob", Gender::Male, Role::Scientist);
        assert_eq!(
            encode(&kerbal),
            ":k:Bob:k:male:k:scientist:k::k:(none):k:(none)"
        );
    }

    #[test]
    fn test_round_trip_keeps_display_fields() {
        let kerbal = val();
        let decoded: Kerbal = decode(&encode(&kerbal)).unwrap();
        assert_eq!(decoded.display_fields(), kerbal.display_fields());
        assert_eq!(decoded.flight_log().len(), 2);
        assert_eq!(decoded.flight_log()[1].body(), "Minmus");
    }

    #[test]
    fn test_decode_tombstoned_mission() {
        let text = format!(":k:Val:k:female:k:engineer:k:{TOMBSTONE}:k:(none):k:(none)");
        let kerbal: Kerbal = decode(&text).unwrap();
        assert!(kerbal.mission().is_tombstoned());
        assert!(!kerbal.is_deployed());
    }

    #[test]
    fn test_decode_rejects_bad_gender() {
        assert!(decode::<Kerbal>(":k:Val:k:robot:k:engineer:k::k:(none):k:(none)").is_none());
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        assert!(decode::<Kerbal>(":k:Val:k:female:k:engineer:k::k:(none)").is_none());
    }

    #[test]
    fn test_check_encodable_reaches_children() {
        let kerbal = Kerbal::new("Val", Gender::Female, Role::Engineer).with_flight(
            FlightLogEntry::new("bad :k: text", "Mun Flyby", "Mun", Outcome::Success),
        );
        assert!(kerbal.check_encodable().is_err());
    }

    #[test]
    fn test_summary() {
        let kerbal = Kerbal::new("Val", Gender::Female, Role::Engineer);
        assert_eq!(kerbal.summary(), "Val (female engineer, available)");
    }

    #[test]
    fn test_text_enum_parse() {
        assert_eq!(Role::parse("tourist"), Some(Role::Tourist));
        assert_eq!(Role::parse("Tourist"), None);
        assert_eq!(Gender::ALL.len(), 2);
        assert_eq!(Outcome::Lost.as_str(), "lost");
    }
}
