//! Common type definitions and newtype wrappers for domain modeling.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of question slots in one survey.
pub const QUESTION_COUNT: u8 = 20;

/// Number of columns in an export row.
pub const EXPORT_COLUMNS: usize = 24;

/// Column index of the creation timestamp.
pub const CREATED_AT_COLUMN: usize = 22;

/// Display titles of the twenty questions, in slot order.
pub const QUESTION_TITLES: [&str; QUESTION_COUNT as usize] = [
    "RECEPTION/GUIDANCE SERVICE",
    "MEDICAL CARE",
    "NURSING CARE",
    "REGULATION SERVICE",
    "MULTIDISCIPLINARY TEAM CARE (PSYCHOLOGY / SOCIAL WORK / NUTRITION)",
    "DIAGNOSTIC EXAMS SERVICE",
    "TELEPHONE SERVICE",
    "UNIT CLEANLINESS",
    "FACILITIES",
    "WAITING TIME FOR CARE",
    "Would you recommend this hospital to your friends and family?",
    "Were your name and date of birth confirmed at any point during your care?",
    "Did you receive information about the continuity of your treatment?",
    "Were you properly instructed on how to use your medications?",
    "WAS YOUR HEALTH PROBLEM RESOLVED OR CONTROLLED AT THE DAY HOSPITAL?",
    "IF NOT, EXPLAIN WHY:",
    "DO YOU EAT AT LEAST 5 PORTIONS OF FRUITS AND VEGETABLES DAILY?",
    "Were you treated with kindness and empathy? Did our staff seem motivated?",
    "Time to access and return to the specialty",
    "WHAT MATTERS TO YOU IN OUR SERVICE:",
];

/// Header row of the export, in column order.
pub fn export_header() -> [&'static str; EXPORT_COLUMNS] {
    let mut header = [""; EXPORT_COLUMNS];
    header[0] = "FLOOR";
    header[1] = "Patient";
    header[2..22].copy_from_slice(&QUESTION_TITLES);
    header[22] = "Created At";
    header[23] = "Recorder";
    header
}

/// One of the twenty ordinal question slots (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionSlot(u8);

impl QuestionSlot {
    /// Slots holding free text rather than answer codes.
    pub const FREE_TEXT: [u8; 2] = [16, 20];

    /// Creates a slot, or `None` outside `1..=20`.
    pub fn new(number: u8) -> Option<Self> {
        (1..=QUESTION_COUNT).contains(&number).then_some(Self(number))
    }

    /// All twenty slots in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=QUESTION_COUNT).map(Self)
    }

    /// The 1-based question number.
    pub fn number(self) -> u8 {
        self.0
    }

    /// Column position in an export row (floor and patient come first).
    pub fn column(self) -> usize {
        1 + usize::from(self.0)
    }

    /// Whether the slot is free text.
    ///
    /// Free-text slots are never code-mapped and are only charted on request.
    /// The normalizer and the aggregator both go through this predicate.
    pub fn is_free_text(self) -> bool {
        Self::FREE_TEXT.contains(&self.0)
    }

    /// Default display title.
    pub fn title(self) -> &'static str {
        QUESTION_TITLES[usize::from(self.0 - 1)]
    }
}

impl fmt::Display for QuestionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "question {}", self.0)
    }
}

/// One survey submission as exported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyRow {
    pub floor: String,
    pub patient_name: String,
    pub answers: [String; QUESTION_COUNT as usize],
    pub created_at: String,
    pub recorder: String,
}

impl SurveyRow {
    /// Answer cell for a slot.
    pub fn answer(&self, slot: QuestionSlot) -> &str {
        &self.answers[usize::from(slot.number() - 1)]
    }

    /// Mutable answer cell for a slot.
    pub fn answer_mut(&mut self, slot: QuestionSlot) -> &mut String {
        &mut self.answers[usize::from(slot.number() - 1)]
    }

    /// The row as export fields, in header order.
    pub fn to_record(&self) -> Vec<&str> {
        let mut record = Vec::with_capacity(EXPORT_COLUMNS);
        record.push(self.floor.as_str());
        record.push(self.patient_name.as_str());
        record.extend(self.answers.iter().map(String::as_str));
        record.push(self.created_at.as_str());
        record.push(self.recorder.as_str());
        record
    }

    /// Builds a row from export fields; missing trailing fields are empty.
    pub fn from_record<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fields = fields.into_iter().map(str::to_string);
        let mut next = || fields.next().unwrap_or_default();
        let floor = next();
        let patient_name = next();
        let answers = std::array::from_fn(|_| next());
        let created_at = next();
        let recorder = next();
        Self {
            floor,
            patient_name,
            answers,
            created_at,
            recorder,
        }
    }
}

/// Label → occurrence count for one question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    counts: BTreeMap<String, u64>,
}

/// One ranked label of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub label: String,
    pub count: u64,
    /// Share of the total, 0.0 to 100.0
    pub percentage: f64,
}

impl Distribution {
    /// Creates an empty distribution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one occurrence of `label`.
    pub fn increment(&mut self, label: impl Into<String>) {
        *self.counts.entry(label.into()).or_insert(0) += 1;
    }

    /// Count for one label.
    pub fn count(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Labels by descending count, ties by ascending label text.
    pub fn ranked(&self) -> Vec<RankedEntry> {
        let total = self.total();
        let mut entries: Vec<RankedEntry> = self
            .counts
            .iter()
            .map(|(label, &count)| RankedEntry {
                label: label.clone(),
                count,
                percentage: if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64 * 100.0
                },
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        entries
    }
}

impl<L: Into<String>> FromIterator<(L, u64)> for Distribution {
    fn from_iter<T: IntoIterator<Item = (L, u64)>>(iter: T) -> Self {
        let mut distribution = Self::new();
        for (label, count) in iter {
            *distribution.counts.entry(label.into()).or_insert(0) += count;
        }
        distribution
    }
}

/// Pipeline stage, used to tag terminal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Config,
    Period,
    Database,
    Export,
    Aggregate,
    Render,
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Period => "period",
            Self::Database => "database",
            Self::Export => "export",
            Self::Aggregate => "aggregate",
            Self::Render => "render",
            Self::Assemble => "assemble",
        };
        f.write_str(name)
    }
}
