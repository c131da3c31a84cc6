//! Muscle group enum as the single source of truth for muscle strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Primary muscle groups an exercise can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MuscleGroup {
    Biceps,
    Triceps,
    Forearms,
    Chest,
    Shoulders,
    Back,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    Abs,
}

impl MuscleGroup {
    /// Every variant, in display order.
    pub const ALL: [Self; 11] = [
        Self::Biceps,
        Self::Triceps,
        Self::Forearms,
        Self::Chest,
        Self::Shoulders,
        Self::Back,
        Self::Quads,
        Self::Hamstrings,
        Self::Glutes,
        Self::Calves,
        Self::Abs,
    ];

    /// Returns the string representation used for SQL storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Biceps => "biceps",
            Self::Triceps => "triceps",
            Self::Forearms => "forearms",
            Self::Chest => "chest",
            Self::Shoulders => "shoulders",
            Self::Back => "back",
            Self::Quads => "quads",
            Self::Hamstrings => "hamstrings",
            Self::Glutes => "glutes",
            Self::Calves => "calves",
            Self::Abs => "abs",
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MuscleGroup {
    type Err = UnknownMuscleGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "biceps" => Ok(Self::Biceps),
            "triceps" => Ok(Self::Triceps),
            "forearms" => Ok(Self::Forearms),
            "chest" => Ok(Self::Chest),
            "shoulders" => Ok(Self::Shoulders),
            "back" => Ok(Self::Back),
            "quads" => Ok(Self::Quads),
            "hamstrings" => Ok(Self::Hamstrings),
            "glutes" => Ok(Self::Glutes),
            "calves" => Ok(Self::Calves),
            "abs" => Ok(Self::Abs),
            _ => Err(UnknownMuscleGroup(s.to_string())),
        }
    }
}

impl Serialize for MuscleGroup {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MuscleGroup {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown muscle group strings.
#[derive(Debug, Clone, Error)]
#[error("unknown muscle group: {0}")]
pub struct UnknownMuscleGroup(String);
