//! Vessel designs and the vessels built from them.

use super::{text_enum, DisplayField, Entity, Kind, Nested, RecordKey, Reference};
use crate::codec::{self, parse_u32, Codec, Composite};
use crate::error::Result;

text_enum! {
    /// How a design approaches a destination.
    Approach {
        /// Pass by without capture.
        Flyby => "flyby",
        /// Enter orbit.
        Orbit => "orbit",
        /// Touch down.
        Landing => "landing",
    }
}

text_enum! {
    /// Whereabouts of a built vessel.
    VesselStatus {
        /// In service.
        Active => "active",
        /// Brought home intact.
        Recovered => "recovered",
        /// Lost.
        Destroyed => "destroyed",
    }
}

/// An optional key/value property of a design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignProperty {
    description: String,
    key: String,
    value: String,
}

impl DesignProperty {
    /// Create a property.
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Property name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Property value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Codec for DesignProperty {
    const NAME: &'static str = "design property";
    const DELIMITER: &'static str = ":dp:";
    const FIELD_COUNT: usize = 3;

    fn storable_fields(&self) -> Vec<String> {
        vec![
            self.description.clone(),
            self.key.clone(),
            self.value.clone(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [description, key, value] = fields else {
            return None;
        };
        Some(Self::new(*description, *key, *value))
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("description", self.description.as_str()),
            ("key", self.key.as_str()),
            ("value", self.value.as_str()),
        ]
    }
}

/// A body a design is rated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    description: String,
    body: String,
    approach: Approach,
}

impl Destination {
    /// Create a destination.
    #[must_use]
    pub fn new(description: impl Into<String>, body: impl Into<String>, approach: Approach) -> Self {
        Self {
            description: description.into(),
            body: body.into(),
            approach,
        }
    }

    /// Celestial body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Approach profile.
    #[must_use]
    pub fn approach(&self) -> Approach {
        self.approach
    }
}

impl Codec for Destination {
    const NAME: &'static str = "destination";
    const DELIMITER: &'static str = ":ds:";
    const FIELD_COUNT: usize = 3;

    fn storable_fields(&self) -> Vec<String> {
        vec![
            self.description.clone(),
            self.body.clone(),
            self.approach.to_string(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [description, body, approach] = fields else {
            return None;
        };
        Some(Self::new(*description, *body, Approach::parse(approach)?))
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("description", self.description.as_str()),
            ("body", self.body.as_str()),
        ]
    }
}

/// A vessel design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VesselDesign {
    description: String,
    name: String,
    crew_capacity: u32,
    properties: Vec<DesignProperty>,
    destinations: Vec<Destination>,
}

impl VesselDesign {
    /// Create a design with no properties or destinations.
    #[must_use]
    pub fn new(name: impl Into<String>, crew_capacity: u32) -> Self {
        Self {
            description: codec::NO_DESCRIPTION.to_string(),
            name: name.into(),
            crew_capacity,
            properties: Vec::new(),
            destinations: Vec::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(DesignProperty::new("", key, value));
        self
    }

    /// Append a destination.
    #[must_use]
    pub fn with_destination(mut self, body: impl Into<String>, approach: Approach) -> Self {
        self.destinations.push(Destination::new("", body, approach));
        self
    }

    /// Design name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seats available.
    #[must_use]
    pub fn crew_capacity(&self) -> u32 {
        self.crew_capacity
    }

    /// Optional properties.
    #[must_use]
    pub fn properties(&self) -> &[DesignProperty] {
        &self.properties
    }

    /// Rated destinations, in entry order.
    #[must_use]
    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }
}

impl Codec for VesselDesign {
    const NAME: &'static str = "vessel design";
    const DELIMITER: &'static str = ":vd:";
    const FIELD_COUNT: usize = 5;

    fn storable_fields(&self) -> Vec<String> {
        vec![
            self.description.clone(),
            self.name.clone(),
            self.crew_capacity.to_string(),
            codec::encode_list::<Self, _>(&self.properties),
            codec::encode_list::<Self, _>(&self.destinations),
        ]
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [description, name, crew_capacity, properties, destinations] = fields else {
            return None;
        };
        Some(Self {
            description: (*description).to_string(),
            name: (*name).to_string(),
            crew_capacity: parse_u32(crew_capacity)?,
            properties: codec::decode_list::<Self, _>(properties)?,
            destinations: codec::decode_list::<Self, _>(destinations)?,
        })
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("description", self.description.as_str()),
            ("name", self.name.as_str()),
        ]
    }

    fn check_encodable(&self) -> Result<()> {
        codec::check_text_fields(self)?;
        self.properties
            .iter()
            .try_for_each(Codec::check_encodable)?;
        self.destinations
            .iter()
            .try_for_each(Codec::check_encodable)
    }
}

impl Composite for VesselDesign {
    const SEPARATOR: &'static str = ":vd,:";
}

impl Entity for VesselDesign {
    const KIND: Kind = Kind::Design;

    fn key(&self) -> RecordKey {
        RecordKey::Name(self.name.clone())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn display_fields(&self) -> Vec<DisplayField> {
        let properties = self
            .properties
            .iter()
            .map(|property| Nested {
                summary: format!("{} = {}", property.key, property.value),
                fields: vec![
                    DisplayField::text("Key", property.key.as_str()),
                    DisplayField::text("Value", property.value.as_str()),
                    DisplayField::text("Description", property.description.as_str()),
                ],
            })
            .collect();
        let destinations = self
            .destinations
            .iter()
            .map(|destination| Nested {
                summary: format!("{} ({})", destination.body, destination.approach),
                fields: vec![
                    DisplayField::text("Body", destination.body.as_str()),
                    DisplayField::text("Approach", destination.approach),
                    DisplayField::text("Description", destination.description.as_str()),
                ],
            })
            .collect();
        vec![
            DisplayField::text("Name", self.name.as_str()),
            DisplayField::text("Description", self.description.as_str()),
            DisplayField::text("Crew capacity", self.crew_capacity),
            DisplayField::records("Properties", properties),
            DisplayField::records("Destinations", destinations),
        ]
    }

    fn summary(&self) -> String {
        format!(
            "{} ({} seats, {} destinations)",
            self.name,
            self.crew_capacity,
            self.destinations.len()
        )
    }

    fn references(&self) -> Vec<(&'static str, &Reference)> {
        Vec::new()
    }

    fn references_mut(&mut self) -> Vec<&mut Reference> {
        Vec::new()
    }
}

/// A vessel built from a design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vessel {
    description: String,
    id: u32,
    name: String,
    design: Reference,
    status: VesselStatus,
}

impl Vessel {
    /// Create an active vessel of the named design (resolved later).
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, design: impl Into<String>) -> Self {
        Self {
            description: codec::NO_DESCRIPTION.to_string(),
            id,
            name: name.into(),
            design: Reference::to(Kind::Design, RecordKey::Name(design.into())),
            status: VesselStatus::Active,
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
    pub fn with_status(mut self, status: VesselStatus) -> Self {
        self.status = status;
        self
    }

    /// Numeric id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Vessel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Design reference.
    #[must_use]
    pub fn design(&self) -> &Reference {
        &self.design
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> VesselStatus {
        self.status
    }
}

impl Codec for Vessel {
    const NAME: &'static str = "vessel";
    const DELIMITER: &'static str = ":v:";
    const FIELD_COUNT: usize = 5;

    fn storable_fields(&self) -> Vec<String> {
        vec![
            self.description.clone(),
            self.id.to_string(),
            self.name.clone(),
            self.design.stored(),
            self.status.to_string(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [description, id, name, design, status] = fields else {
            return None;
        };
        Some(Self {
            description: (*description).to_string(),
            id: parse_u32(id)?,
            name: (*name).to_string(),
            design: Reference::from_stored(Kind::Design, design)?,
            status: VesselStatus::parse(status)?,
        })
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![
            ("description", self.description.as_str()),
            ("name", self.name.as_str()),
        ];
        if let Some(design) = self.design.key().and_then(RecordKey::as_name) {
            fields.push(("design", design));
        }
        fields
    }
}

impl Entity for Vessel {
    const KIND: Kind = Kind::Vessel;

    fn key(&self) -> RecordKey {
        RecordKey::Id(self.id)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn display_fields(&self) -> Vec<DisplayField> {
        let mut fields = vec![
            DisplayField::text("Id", self.id),
            DisplayField::text("Name", self.name.as_str()),
            DisplayField::text("Description", self.description.as_str()),
        ];
        fields.extend(self.design.display_fields("Design"));
        fields.push(DisplayField::text("Status", self.status));
        fields
    }

    fn summary(&self) -> String {
        format!(
            "#{} {} ({}, {})",
            self.id,
            self.name,
            self.design.display(),
            self.status
        )
    }

    fn references(&self) -> Vec<(&'static str, &Reference)> {
        vec![("design", &self.design)]
    }

    fn references_mut(&mut self) -> Vec<&mut Reference> {
        vec![&mut self.design]
    }
}
