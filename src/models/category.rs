//! Closed set of POI semantic classes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::GeocodeError;

/// Category group assigned to every canonical POI.
///
/// Declaration order is the reporting order used by [`IngestionReport`].
///
/// [`IngestionReport`]: crate::models::IngestionReport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryGroup {
    /// Hospitals, clinics, pharmacies
    Health,
    /// Schools, colleges, universities
    Education,
    /// Shops, restaurants, banks, offices
    Commercial,
    /// Mosques, churches, temples
    Religious,
    /// Stations, stops, fuel, parking
    Transport,
    /// Parks, gardens, playgrounds
    Park,
    /// Museums, monuments, theatres
    Cultural,
    Other,
}

impl CategoryGroup {
    /// All groups in declaration order
    pub fn all() -> &'static [CategoryGroup] {
        &[
            CategoryGroup::Health,
            CategoryGroup::Education,
            CategoryGroup::Commercial,
            CategoryGroup::Religious,
            CategoryGroup::Transport,
            CategoryGroup::Park,
            CategoryGroup::Cultural,
            CategoryGroup::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryGroup::Health => "Health",
            CategoryGroup::Education => "Education",
            CategoryGroup::Commercial => "Commercial",
            CategoryGroup::Religious => "Religious",
            CategoryGroup::Transport => "Transport",
            CategoryGroup::Park => "Park",
            CategoryGroup::Cultural => "Cultural",
            CategoryGroup::Other => "Other",
        }
    }
}

impl std::fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryGroup {
    type Err = GeocodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CategoryGroup::all()
            .iter()
            .copied()
            .find(|g| g.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GeocodeError::invalid(format!("unknown category group '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("health".parse::<CategoryGroup>().unwrap(), CategoryGroup::Health);
        assert_eq!(" PARK ".parse::<CategoryGroup>().unwrap(), CategoryGroup::Park);
        assert!("hospital".parse::<CategoryGroup>().is_err());
    }

    #[test]
    fn test_display_matches_serde() {
        for group in CategoryGroup::all() {
            let json = serde_json::to_string(group).unwrap();
            assert_eq!(json, format!("\"{}\"", group));
        }
    }
}
