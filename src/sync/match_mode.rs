use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a search combines a name filter with a category filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Match documents satisfying either filter.
    #[default]
    Any,
    /// Match documents satisfying both filters.
    All,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Any => write!(f, "any"),
            MatchMode::All => write!(f, "all"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" => Ok(MatchMode::Any),
            "all" => Ok(MatchMode::All),
            _ => Err(format!(
                "Invalid match mode '{}'. Valid options: any, all",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_mode_from_str() {
        assert_eq!("any".parse::<MatchMode>().unwrap(), MatchMode::Any);
        assert_eq!("ALL".parse::<MatchMode>().unwrap(), MatchMode::All);
        assert!("both".parse::<MatchMode>().is_err());
    }

    #[test]
    fn test_match_mode_default_is_any() {
        assert_eq!(MatchMode::default(), MatchMode::Any);
        assert_eq!(MatchMode::default().to_string(), "any");
    }
}
