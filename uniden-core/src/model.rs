//! Detector model variants

use serde::{Deserialize, Serialize, Serializer};

/// Supported detector models.
///
/// Every model stores the same logical settings at different positions of
/// its configuration memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum Model {
    R4,
    R8,
    R9,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::R4, Model::R8, Model::R9];

    /// Get the model name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::R4 => "R4",
            Model::R8 => "R8",
            Model::R9 => "R9",
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl TryFrom<&str> for Model {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_ascii_lowercase().as_str() {
            "r4" => Ok(Model::R4),
            "r8" => Ok(Model::R8),
            "r9" => Ok(Model::R9),
            _ => Err(format!("Unknown model: {}", s)),
        }
    }
}

impl std::str::FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::try_from(s)
    }
}
