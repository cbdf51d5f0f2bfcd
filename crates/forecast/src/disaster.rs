use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of hazard being forecast.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisasterKind {
    Fires,
    Floods,
    Landslides,
}

impl DisasterKind {
    /// Every tracked kind, in grid order.
    pub const ALL: [DisasterKind; 3] = [
        DisasterKind::Fires,
        DisasterKind::Floods,
        DisasterKind::Landslides,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DisasterKind::Fires => "fires",
            DisasterKind::Floods => "floods",
            DisasterKind::Landslides => "landslides",
        }
    }
}

impl fmt::Display for DisasterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown disaster kind {0:?}")]
pub struct UnknownDisasterKind(pub String);

impl FromStr for DisasterKind {
    type Err = UnknownDisasterKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisasterKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownDisasterKind(s.to_string()))
    }
}

/// Forecast lead time in whole hours. Always positive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Horizon(u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("forecast horizon must be a positive number of hours")]
pub struct InvalidHorizon;

impl Horizon {
    pub const fn new(hours: u32) -> Option<Self> {
        if hours == 0 { None } else { Some(Self(hours)) }
    }

    pub const fn hours(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Horizon {
    type Error = InvalidHorizon;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        Horizon::new(hours).ok_or(InvalidHorizon)
    }
}

impl From<Horizon> for u32 {
    fn from(h: Horizon) -> Self {
        h.0
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one grid cell: a single in-flight or cached request.
///
/// Small and copyable so it can key registries and logs without allocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestKey {
    pub disaster: DisasterKind,
    pub horizon: Horizon,
}

impl RequestKey {
    pub const fn new(disaster: DisasterKind, horizon: Horizon) -> Self {
        Self { disaster, horizon }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.disaster, self.horizon)
    }
}
