//! Grid position codec: `btn-<row>-<col>`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const PREFIX: &str = "btn";

/// Zero-indexed cell in a button grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: u32,
    pub col: u32,
}

impl GridPosition {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid grid position '{0}' (expected btn-<row>-<col>)")]
pub struct PositionParseError(pub String);

impl FromStr for GridPosition {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PositionParseError(s.to_string());

        let parts: Vec<&str> = s.split('-').collect();
        let [prefix, row, col] = parts.as_slice() else {
            return Err(err());
        };
        if *prefix != PREFIX {
            return Err(err());
        }

        let row = row.parse::<u32>().map_err(|_| err())?;
        let col = col.parse::<u32>().map_err(|_| err())?;
        Ok(Self { row, col })
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", PREFIX, self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_positions() {
        assert_eq!("btn-0-0".parse::<GridPosition>(), Ok(GridPosition::new(0, 0)));
        assert_eq!("btn-1-2".parse::<GridPosition>(), Ok(GridPosition::new(1, 2)));
        assert_eq!("btn-12-7".parse::<GridPosition>(), Ok(GridPosition::new(12, 7)));
    }

    #[test]
    fn test_reject_malformed_positions() {
        for bad in ["", "btn", "btn-1", "btn-1-2-3", "cell-0-0", "btn-a-0", "btn-0-", "btn--1-0"] {
            assert!(bad.parse::<GridPosition>().is_err(), "accepted '{}'", bad);
        }
    }

    #[test]
    fn test_display_matches_key_format() {
        assert_eq!(GridPosition::new(2, 3).to_string(), "btn-2-3");
    }
}
