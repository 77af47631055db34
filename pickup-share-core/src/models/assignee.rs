use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who performs a duty: one of the four household participants, or nobody yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Assignee {
    #[default]
    #[serde(rename = "-")]
    Unassigned,
    A,
    B,
    C,
    D,
}

impl Assignee {
    /// Every value, unassigned first (the order totals are reported in).
    pub const ALL: [Assignee; 5] = [
        Assignee::Unassigned,
        Assignee::A,
        Assignee::B,
        Assignee::C,
        Assignee::D,
    ];

    pub const PARTICIPANTS: [Assignee; 4] = [Assignee::A, Assignee::B, Assignee::C, Assignee::D];

    pub fn tag(self) -> &'static str {
        match self {
            Assignee::Unassigned => "-",
            Assignee::A => "A",
            Assignee::B => "B",
            Assignee::C => "C",
            Assignee::D => "D",
        }
    }

    pub fn is_assigned(self) -> bool {
        self != Assignee::Unassigned
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Assignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for Assignee {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "a" => Ok(Assignee::A),
            "b" => Ok(Assignee::B),
            "c" => Ok(Assignee::C),
            "d" => Ok(Assignee::D),
            "-" | "none" | "unassigned" => Ok(Assignee::Unassigned),
            _ => Err(format!(
                "Invalid assignee '{}'. Valid options: A, B, C, D, - (unassigned)",
                s
            )),
        }
    }
}

/// Display names for the participants.
///
/// Documents only ever store the tags; labels are for people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Roster {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
    pub unassigned: String,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            a: "A".to_string(),
            b: "B".to_string(),
            c: "C".to_string(),
            d: "D".to_string(),
            unassigned: "Unassigned".to_string(),
        }
    }
}

impl Roster {
    pub fn label(&self, assignee: Assignee) -> &str {
        match assignee {
            Assignee::Unassigned => &self.unassigned,
            Assignee::A => &self.a,
            Assignee::B => &self.b,
            Assignee::C => &self.c,
            Assignee::D => &self.d,
        }
    }

    /// Resolves user input to an assignee, by tag or by (case-insensitive) label.
    pub fn resolve(&self, input: &str) -> Result<Assignee, String> {
        if let Ok(assignee) = input.parse() {
            return Ok(assignee);
        }
        Assignee::ALL
            .into_iter()
            .find(|a| self.label(*a).eq_ignore_ascii_case(input.trim()))
            .ok_or_else(|| format!("Unknown participant '{}'", input))
    }
}
