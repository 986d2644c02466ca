use crate::projection::AttendanceStats;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    #[serde(alias = "tarde")]
    Later,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Later => "later",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            "later" | "tarde" => Some(Self::Later),
            _ => None,
        }
    }
}

/// Sub-tag of an `absent` event. An unset reason is an ordinary absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsenceReason {
    #[serde(alias = "justificada")]
    Justified,
}

impl AbsenceReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Justified => "justified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    /// Empty only in documents written before events carried ids; filled in
    /// by `Gradebook::normalize` at the load/import boundary.
    #[serde(default)]
    pub id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<AbsenceReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    #[default]
    #[serde(alias = "cursa")]
    Enrolled,
    #[serde(alias = "recursa")]
    Repeating,
}

impl Condition {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "enrolled" | "cursa" => Some(Self::Enrolled),
            "repeating" | "recursa" => Some(Self::Repeating),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeKind {
    #[default]
    #[serde(alias = "escrito")]
    Written,
    Oral,
    #[serde(alias = "practico", alias = "práctico")]
    Practical,
    Conceptual,
}

impl GradeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::Oral => "oral",
            Self::Practical => "practical",
            Self::Conceptual => "conceptual",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "written" | "escrito" => Some(Self::Written),
            "oral" => Some(Self::Oral),
            "practical" | "practico" | "práctico" => Some(Self::Practical),
            "conceptual" => Some(Self::Conceptual),
            _ => None,
        }
    }
}

/// Stored grade value. Commands only ever write numbers, but imported
/// documents may hold text or null.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl GradeValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) if v.is_finite() => Some(*v),
            Self::Number(_) | Self::Missing => None,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Number(v) => v.to_string(),
            Self::Text(s) => s.clone(),
            Self::Missing => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", alias = "tipo", default)]
    pub kind: GradeKind,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub value: GradeValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub stats: AttendanceStats,
    #[serde(default)]
    pub history: Vec<AttendanceEvent>,
    #[serde(default)]
    pub grades: Vec<GradeEntry>,
}

impl Student {
    pub fn new(name: impl Into<String>, condition: Condition) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            condition,
            stats: AttendanceStats::default(),
            history: Vec::new(),
            grades: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub students: BTreeMap<String, Student>,
}

impl Course {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            students: BTreeMap::new(),
        }
    }

    /// Display order: by name ignoring case and accents ("Álvaro" with the
    /// A's, "Ñato" with the N's), then accented after plain, then by id so
    /// the order is total and stable across runs.
    pub fn sorted_students(&self) -> Vec<&Student> {
        let mut keyed: Vec<(String, String, &Student)> = self
            .students
            .values()
            .map(|s| (fold_name(&s.name), s.name.to_lowercase(), s))
            .collect();
        keyed.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });
        keyed.into_iter().map(|(_, _, s)| s).collect()
    }

    pub fn roster_ids(&self) -> BTreeSet<String> {
        self.students.keys().cloned().collect()
    }
}

/// Lowercase name with combining marks stripped after canonical
/// decomposition.
pub fn fold_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            NaiveDate::parse_from_str(t, "%Y-%m-%d").ok()
        }
    }))
}
