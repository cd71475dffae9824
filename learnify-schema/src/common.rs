use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role forwarded by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Parent,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
            Role::Admin => "admin",
        }
    }

    /// Teachers and admins author content and may act on other users.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "parent" => Ok(Role::Parent),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Concrete-pictorial-abstract phase of a lesson step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpaPhase {
    Concrete,
    Pictorial,
    Abstract,
}

impl CpaPhase {
    pub const ALL: [CpaPhase; 3] = [CpaPhase::Concrete, CpaPhase::Pictorial, CpaPhase::Abstract];

    pub fn as_str(self) -> &'static str {
        match self {
            CpaPhase::Concrete => "concrete",
            CpaPhase::Pictorial => "pictorial",
            CpaPhase::Abstract => "abstract",
        }
    }
}

impl FromStr for CpaPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concrete" => Ok(CpaPhase::Concrete),
            "pictorial" => Ok(CpaPhase::Pictorial),
            "abstract" => Ok(CpaPhase::Abstract),
            other => Err(format!("unknown CPA phase: {other}")),
        }
    }
}

/// Kind of a recorded study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionKind {
    Practice,
    Review,
    Reading,
    Other,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Practice => "PRACTICE",
            SessionKind::Review => "REVIEW",
            SessionKind::Reading => "READING",
            SessionKind::Other => "OTHER",
        }
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRACTICE" => Ok(SessionKind::Practice),
            "REVIEW" => Ok(SessionKind::Review),
            "READING" => Ok(SessionKind::Reading),
            "OTHER" => Ok(SessionKind::Other),
            other => Err(format!("unknown session kind: {other}")),
        }
    }
}

/// Reporting window for analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl TimeRange {
    /// Lenient parse: anything unrecognised reports the default month window.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("week") => TimeRange::Week,
            Some("year") => TimeRange::Year,
            Some("all") => TimeRange::All,
            _ => TimeRange::Month,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
            TimeRange::All => "all",
        }
    }
}
