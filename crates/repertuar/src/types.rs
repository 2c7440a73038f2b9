use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
#[error("\"{0}\" is not supported. Accepted values: 'cinema-city', 'helios', 'multikino'")]
pub struct CinemaChainParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CinemaChain {
    CinemaCity,
    Helios,
    Multikino,
}

impl CinemaChain {
    pub const ALL: [CinemaChain; 3] = [
        CinemaChain::CinemaCity,
        CinemaChain::Helios,
        CinemaChain::Multikino,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            CinemaChain::CinemaCity => "cinema-city",
            CinemaChain::Helios => "helios",
            CinemaChain::Multikino => "multikino",
        }
    }
}

impl FromStr for CinemaChain {
    type Err = CinemaChainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "cinema-city" | "cc" => Ok(CinemaChain::CinemaCity),
            "helios" => Ok(CinemaChain::Helios),
            "multikino" => Ok(CinemaChain::Multikino),
            _ => Err(CinemaChainParseError(s.to_string())),
        }
    }
}

impl Display for CinemaChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CinemaChain::CinemaCity => write!(f, "Cinema City"),
            CinemaChain::Helios => write!(f, "Helios"),
            CinemaChain::Multikino => write!(f, "Multikino"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
}

impl Venue {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>6}  {}", self.id, self.name)
    }
}
