use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two sides of the front line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Army {
    Red,
    Blue,
}

impl Army {
    pub const ALL: [Self; 2] = [Self::Red, Self::Blue];

    #[must_use]
    pub const fn opposing(self) -> Self {
        match self {
            Self::Red => Self::Blue,
            Self::Blue => Self::Red,
        }
    }

    /// Numeric code used by the section format.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Red => 1,
            Self::Blue => 2,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Red),
            2 => Some(Self::Blue),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Blue => "Blue",
        }
    }
}

impl fmt::Display for Army {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Army {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown army code {code}"));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "blue" => Ok(Self::Blue),
            other => Err(format!("unknown army `{other}`")),
        }
    }
}
