//! Domain DTOs for the roster API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch schema drift between the two crates. Field names
//! are camelCase on the wire.
//!
//! Identifiers arrive either as JSON numbers or as JSON strings depending on
//! the backend. [`EntityId`] normalizes both to one canonical string so that
//! `1` and `"1"` compare equal everywhere in the store.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::InvalidAcademicYear;

/// Identifier of a school or a class, compared by canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id as an integer, when its canonical form is a plain integer that
    /// fits in `i64`.
    pub fn as_integer(&self) -> Option<i64> {
        self.0.parse::<i64>().ok().filter(|n| n.to_string() == self.0)
    }

    fn as_unsigned(&self) -> Option<u64> {
        self.0.parse::<u64>().ok().filter(|n| n.to_string() == self.0)
    }

    /// Canonical text of a JSON number. Whole floats collapse to the integer
    /// spelling so `1.0` and `1` name the same entity.
    fn from_number(n: &serde_json::Number) -> Self {
        if n.is_f64() {
            if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < 9.0e15 {
                    return Self((f as i64).to_string());
                }
            }
        }
        Self(n.to_string())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(n) = self.as_integer() {
            serializer.serialize_i64(n)
        } else if let Some(n) = self.as_unsigned() {
            serializer.serialize_u64(n)
        } else {
            serializer.serialize_str(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self::from_number(&n),
            Raw::Text(s) => Self(s),
        })
    }
}

/// A school as returned by the API.
///
/// `class_ids` lists the classes currently assigned to this school. The
/// backend may omit it or send `null`; both decode as an empty list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: EntityId,
    pub name: String,
    #[serde(default, alias = "city", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub class_ids: Vec<EntityId>,
}

impl School {
    pub fn holds(&self, class_id: &EntityId) -> bool {
        self.class_ids.contains(class_id)
    }
}

/// Daily shift a class runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turno {
    #[serde(rename = "Manhã")]
    Morning,
    #[serde(rename = "Tarde")]
    Afternoon,
    #[serde(rename = "Noite")]
    Evening,
}

impl Turno {
    pub const ALL: [Turno; 3] = [Turno::Morning, Turno::Afternoon, Turno::Evening];

    /// Label used on the wire and in the UI.
    pub fn label(self) -> &'static str {
        match self {
            Turno::Morning => "Manhã",
            Turno::Afternoon => "Tarde",
            Turno::Evening => "Noite",
        }
    }
}

/// Academic year a class belongs to. Only four consecutive years are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct AnoLetivo(u16);

impl AnoLetivo {
    pub const FIRST: u16 = 2025;
    pub const LAST: u16 = 2028;

    pub fn new(year: u16) -> Result<Self, InvalidAcademicYear> {
        if (Self::FIRST..=Self::LAST).contains(&year) {
            Ok(Self(year))
        } else {
            Err(InvalidAcademicYear(year))
        }
    }

    pub fn year(self) -> u16 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = AnoLetivo> {
        (Self::FIRST..=Self::LAST).map(Self)
    }
}

impl TryFrom<u16> for AnoLetivo {
    type Error = InvalidAcademicYear;

    fn try_from(year: u16) -> Result<Self, Self::Error> {
        Self::new(year)
    }
}

impl From<AnoLetivo> for u16 {
    fn from(year: AnoLetivo) -> Self {
        year.0
    }
}

/// A class (school section) as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassEntity {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turno: Option<Turno>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ano_letivo: Option<AnoLetivo>,
}

impl ClassEntity {
    pub fn belongs_to(&self, school_id: &EntityId) -> bool {
        self.school_id.as_ref() == Some(school_id)
    }
}

/// Request payload for creating a school.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSchool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Request payload for creating a class.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClass {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turno: Option<Turno>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ano_letivo: Option<AnoLetivo>,
}

/// Partial update for a school. Only present fields are merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchoolUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl SchoolUpdate {
    pub fn apply_to(&self, school: &mut School) {
        if let Some(name) = &self.name {
            school.name = name.clone();
        }
        if let Some(address) = &self.address {
            school.address = Some(address.clone());
        }
    }
}

/// Partial update for a class. Only present fields are merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turno: Option<Turno>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ano_letivo: Option<AnoLetivo>,
}

impl ClassUpdate {
    pub fn apply_to(&self, class: &mut ClassEntity) {
        if let Some(name) = &self.name {
            class.name = name.clone();
        }
        if let Some(school_id) = &self.school_id {
            class.school_id = Some(school_id.clone());
        }
        if let Some(turno) = self.turno {
            class.turno = Some(turno);
        }
        if let Some(ano_letivo) = self.ano_letivo {
            class.ano_letivo = Some(ano_letivo);
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<EntityId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<EntityId>>::deserialize(deserializer)?.unwrap_or_default())
}
