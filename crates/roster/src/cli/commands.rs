//! CLI command definitions.

use std::fmt;
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::record::{
    Approach, Commendation, FlightLogEntry, Gender, Kerbal, Kind, Mission, MissionStatus,
    Outcome, Record, Role, Seat, Vessel, VesselDesign, VesselStatus,
};

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Record kind to list
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Only show records whose summary matches this regex
    #[arg(short, long, value_name = "REGEX")]
    pub matching: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Record kind
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Name, or numeric id for vessels
    pub key: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Record kind
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Name, or numeric id for vessels
    pub key: String,

    /// Why the record is being deleted; shown on every tombstoned reference
    #[arg(short, long)]
    pub reason: String,
}

/// Flag shared by read-only report commands.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Record creation commands.
#[derive(Debug, Subcommand)]
pub enum AddCommand {
    /// Add a crew member
    Kerbal {
        /// Unique name
        name: String,

        /// Gender (male, female)
        #[arg(short, long, value_parser = gender)]
        gender: Gender,

        /// Role (pilot, engineer, scientist, tourist)
        #[arg(short, long, value_parser = role)]
        role: Role,

        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,

        /// Award, as TITLE=MISSION (repeatable)
        #[arg(long = "commendation", value_name = "TITLE=MISSION", value_parser = commendation)]
        commendations: Vec<Commendation>,

        /// Past flight, as MISSION=BODY=OUTCOME (repeatable)
        #[arg(long = "flight", value_name = "MISSION=BODY=OUTCOME", value_parser = flight)]
        flights: Vec<FlightLogEntry>,
    },

    /// Add a mission; crew members not already deployed are boarded
    Mission {
        /// Unique name
        name: String,

        /// Target body
        #[arg(long)]
        destination: String,

        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,

        /// Lifecycle status
        #[arg(short, long, value_parser = mission_status, default_value = "planned")]
        status: MissionStatus,

        /// Id of the vessel flying the mission
        #[arg(long)]
        vessel: Option<u32>,

        /// Crew member, as NAME or NAME=SEAT (repeatable)
        #[arg(long = "crew", value_name = "NAME[=SEAT]", value_parser = crew)]
        crew: Vec<(String, Seat)>,
    },

    /// Add a vessel design
    Design {
        /// Unique name
        name: String,

        /// Number of crew seats
        #[arg(long, default_value_t = 1)]
        capacity: u32,

        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,

        /// Design property, as KEY=VALUE (repeatable)
        #[arg(long = "property", value_name = "KEY=VALUE", value_parser = pair)]
        properties: Vec<(String, String)>,

        /// Reachable destination, as BODY=APPROACH (repeatable)
        #[arg(long = "destination", value_name = "BODY=APPROACH", value_parser = destination)]
        destinations: Vec<(String, Approach)>,
    },

    /// Add a built vessel
    Vessel {
        /// Unique numeric id
        id: u32,

        /// Vessel name
        name: String,

        /// Name of the design it was built from
        #[arg(long)]
        design: String,

        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,

        /// Whereabouts
        #[arg(short, long, value_parser = vessel_status, default_value = "active")]
        status: VesselStatus,
    },
}

impl AddCommand {
    /// Build the record this command describes.
    #[must_use]
    pub fn into_record(self) -> Record {
        match self {
            Self::Kerbal {
                name,
                gender,
                role,
                description,
                commendations,
                flights,
            } => {
                let kerbal = Kerbal::new(name, gender, role)
                    .with_description(description.unwrap_or_default());
                let kerbal = commendations
                    .into_iter()
                    .fold(kerbal, Kerbal::with_commendation);
                flights.into_iter().fold(kerbal, Kerbal::with_flight).into()
            }
            Self::Mission {
                name,
                destination,
                description,
                status,
                vessel,
                crew,
            } => {
                let mut mission = Mission::new(name, destination)
                    .with_description(description.unwrap_or_default())
                    .with_status(status);
                if let Some(id) = vessel {
                    mission = mission.with_vessel(id);
                }
                crew.into_iter()
                    .fold(mission, |mission, (name, seat)| mission.with_crew(name, seat))
                    .into()
            }
            Self::Design {
                name,
                capacity,
                description,
                properties,
                destinations,
            } => {
                let design = VesselDesign::new(name, capacity)
                    .with_description(description.unwrap_or_default());
                let design = properties
                    .into_iter()
                    .fold(design, |design, (key, value)| design.with_property(key, value));
                destinations
                    .into_iter()
                    .fold(design, |design, (body, approach)| {
                        design.with_destination(body, approach)
                    })
                    .into()
            }
            Self::Vessel {
                id,
                name,
                design,
                description,
                status,
            } => Vessel::new(id, name, design)
                .with_description(description.unwrap_or_default())
                .with_status(status)
                .into(),
        }
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Record kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Crew members
    Kerbal,
    /// Missions
    Mission,
    /// Vessel designs
    Design,
    /// Built vessels
    Vessel,
}

impl From<KindArg> for Kind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Kerbal => Self::Kerbal,
            KindArg::Mission => Self::Mission,
            KindArg::Design => Self::Design,
            KindArg::Vessel => Self::Vessel,
        }
    }
}

fn choice<T: Copy + fmt::Display>(
    text: &str,
    parse: fn(&str) -> Option<T>,
    all: &[T],
) -> Result<T, String> {
    parse(&text.to_lowercase()).ok_or_else(|| {
        let expected: Vec<String> = all.iter().map(ToString::to_string).collect();
        format!("expected one of: {}", expected.join(", "))
    })
}

fn gender(text: &str) -> Result<Gender, String> {
    choice(text, Gender::parse, Gender::ALL)
}

fn role(text: &str) -> Result<Role, String> {
    choice(text, Role::parse, Role::ALL)
}

fn mission_status(text: &str) -> Result<MissionStatus, String> {
    choice(text, MissionStatus::parse, MissionStatus::ALL)
}

fn vessel_status(text: &str) -> Result<VesselStatus, String> {
    choice(text, VesselStatus::parse, VesselStatus::ALL)
}

fn pair(text: &str) -> Result<(String, String), String> {
    text.split_once('=')
        .map(|(left, right)| (left.to_string(), right.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{text}'"))
}

fn crew(text: &str) -> Result<(String, Seat), String> {
    match text.rsplit_once('=') {
        Some((name, seat)) => Ok((name.to_string(), choice(seat, Seat::parse, Seat::ALL)?)),
        None => Ok((text.to_string(), Seat::Crew)),
    }
}

fn destination(text: &str) -> Result<(String, Approach), String> {
    let (body, approach) = pair(text)?;
    Ok((body, choice(&approach, Approach::parse, Approach::ALL)?))
}

fn commendation(text: &str) -> Result<Commendation, String> {
    let (title, mission) = pair(text)?;
    Ok(Commendation::new("", title, mission))
}

fn flight(text: &str) -> Result<FlightLogEntry, String> {
    let mut parts = text.rsplitn(3, '=');
    let (Some(outcome), Some(body), Some(mission)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected MISSION=BODY=OUTCOME, got '{text}'"));
    };
    let outcome = choice(outcome, Outcome::parse, Outcome::ALL)?;
    Ok(FlightLogEntry::new("", mission, body, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_arg_conversion() {
        assert_eq!(Kind::from(KindArg::Kerbal), Kind::Kerbal);
        assert_eq!(Kind::from(KindArg::Mission), Kind::Mission);
        assert_eq!(Kind::from(KindArg::Design), Kind::Design);
        assert_eq!(Kind::from(KindArg::Vessel), Kind::Vessel);
    }

    #[test]
    fn test_choice_is_case_insensitive() {
        assert_eq!(gender("Female"), Ok(Gender::Female));
        assert_eq!(role("PILOT"), Ok(Role::Pilot));
    }

    #[test]
    fn test_choice_lists_expected_values() {
        let err = role("captain").unwrap_err();
        assert_eq!(err, "expected one of: pilot, engineer, scientist, tourist");
    }

    #[test]
    fn test_crew_seat_defaults_to_crew() {
        assert_eq!(crew("Bob"), Ok(("Bob".to_string(), Seat::Crew)));
        assert_eq!(
            crew("Val=commander"),
            Ok(("Val".to_string(), Seat::Commander))
        );
        assert!(crew("Val=captain").is_err());
    }

    #[test]
    fn test_flight_parses_three_parts() {
        let entry = flight("Mun Flyby=Mun=partial").unwrap();
        assert_eq!(entry.mission(), "Mun Flyby");
        assert_eq!(entry.body(), "Mun");
        assert_eq!(entry.outcome(), Outcome::Partial);
        assert!(flight("Mun Flyby=Mun").is_err());
    }

    #[test]
    fn test_destination_and_pair() {
        assert_eq!(
            destination("Minmus=landing"),
            Ok(("Minmus".to_string(), Approach::Landing))
        );
        assert!(pair("no separator").is_err());
    }

    #[test]
    fn test_add_vessel_into_record() {
        let record = AddCommand::Vessel {
            id: 3,
            name: "Mun Lander".to_string(),
            design: "Kerbal X".to_string(),
            description: None,
            status: VesselStatus::Active,
        }
        .into_record();
        let vessel = record.as_vessel().unwrap();
        assert_eq!(vessel.id(), 3);
        assert_eq!(vessel.design().stored(), "Kerbal X");
    }

    #[test]
    fn test_add_mission_into_record() {
        let record = AddCommand::Mission {
            name: "Mun Flyby".to_string(),
            destination: "Mun".to_string(),
            description: None,
            status: MissionStatus::Planned,
            vessel: Some(3),
            crew: vec![("Val".to_string(), Seat::Commander)],
        }
        .into_record();
        let mission = record.as_mission().unwrap();
        assert_eq!(mission.crew().len(), 1);
        assert_eq!(mission.vessel().stored(), "3");
    }
}
