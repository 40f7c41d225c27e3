//! Tag-based category classification.
//!
//! One ordered rule table, evaluated top to bottom; the first matching rule
//! decides the group. Reordering [`RULES`] changes results, so the table is
//! the single place the namespace priority lives.

use std::collections::BTreeMap;

use crate::models::CategoryGroup;

/// Which values of a tag a rule accepts
#[derive(Debug, Clone, Copy)]
pub enum ValuePattern {
    /// Any non-empty value other than `no`
    Any,
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub key: &'static str,
    pub values: ValuePattern,
    pub group: CategoryGroup,
}

const fn rule(key: &'static str, values: ValuePattern, group: CategoryGroup) -> ClassificationRule {
    ClassificationRule { key, values, group }
}

use CategoryGroup::*;
use ValuePattern::{Any, OneOf};

pub const RULES: &[ClassificationRule] = &[
    // Religious
    rule("amenity", OneOf(&["place_of_worship", "monastery"]), Religious),
    rule("religion", Any, Religious),
    rule(
        "building",
        OneOf(&["mosque", "church", "temple", "cathedral", "chapel", "shrine", "synagogue"]),
        Religious,
    ),
    // Health
    rule(
        "amenity",
        OneOf(&["hospital", "clinic", "doctors", "dentist", "pharmacy", "nursing_home"]),
        Health,
    ),
    rule("healthcare", Any, Health),
    rule("building", OneOf(&["hospital"]), Health),
    // Education
    rule(
        "amenity",
        OneOf(&[
            "school",
            "college",
            "university",
            "kindergarten",
            "library",
            "language_school",
            "training",
        ]),
        Education,
    ),
    rule("building", OneOf(&["school", "university", "college"]), Education),
    // Transport
    rule(
        "amenity",
        OneOf(&[
            "bus_station",
            "ferry_terminal",
            "fuel",
            "parking",
            "taxi",
            "car_rental",
            "bicycle_rental",
        ]),
        Transport,
    ),
    rule("public_transport", Any, Transport),
    rule("railway", OneOf(&["station", "halt", "tram_stop", "subway_entrance"]), Transport),
    rule("highway", OneOf(&["bus_stop"]), Transport),
    rule("aeroway", OneOf(&["aerodrome", "terminal", "helipad"]), Transport),
    // Park
    rule(
        "leisure",
        OneOf(&["park", "garden", "playground", "nature_reserve", "dog_park", "common"]),
        Park,
    ),
    rule("landuse", OneOf(&["recreation_ground", "village_green"]), Park),
    rule("boundary", OneOf(&["national_park"]), Park),
    // Cultural
    rule(
        "tourism",
        OneOf(&["museum", "gallery", "artwork", "attraction", "viewpoint", "zoo"]),
        Cultural,
    ),
    rule("historic", Any, Cultural),
    rule(
        "amenity",
        OneOf(&["theatre", "arts_centre", "cinema", "community_centre"]),
        Cultural,
    ),
    // Commercial
    rule("shop", Any, Commercial),
    rule("office", Any, Commercial),
    rule("craft", Any, Commercial),
    rule(
        "amenity",
        OneOf(&[
            "restaurant",
            "cafe",
            "fast_food",
            "bank",
            "atm",
            "marketplace",
            "bar",
            "pub",
            "food_court",
            "ice_cream",
            "bureau_de_change",
        ]),
        Commercial,
    ),
    rule("tourism", OneOf(&["hotel", "guest_house", "hostel", "motel"]), Commercial),
    rule("building", OneOf(&["commercial", "retail"]), Commercial),
];

impl ClassificationRule {
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        let Some(raw) = tags.get(self.key) else {
            return false;
        };
        // OSM allows several values separated by ';'
        raw.split(';').map(|v| v.trim().to_ascii_lowercase()).any(|v| match self.values {
            ValuePattern::Any => !v.is_empty() && v != "no",
            ValuePattern::OneOf(values) => values.contains(&v.as_str()),
        })
    }
}

/// First rule in [`RULES`] that matches, if any
pub fn matching_rule(tags: &BTreeMap<String, String>) -> Option<&'static ClassificationRule> {
    RULES.iter().find(|r| r.matches(tags))
}

pub fn classify(tags: &BTreeMap<String, String>) -> CategoryGroup {
    matching_rule(tags).map(|r| r.group).unwrap_or(Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_religion_tag() {
        assert_eq!(classify(&tags(&[("name", "Faisal Mosque"), ("religion", "islam")])), Religious);
    }

    #[test]
    fn test_common_groups() {
        assert_eq!(classify(&tags(&[("amenity", "hospital")])), Health);
        assert_eq!(classify(&tags(&[("amenity", "University")])), Education);
        assert_eq!(classify(&tags(&[("highway", "bus_stop")])), Transport);
        assert_eq!(classify(&tags(&[("leisure", "park")])), Park);
        assert_eq!(classify(&tags(&[("historic", "monument")])), Cultural);
        assert_eq!(classify(&tags(&[("shop", "mall")])), Commercial);
        assert_eq!(classify(&tags(&[("highway", "residential")])), Other);
        assert_eq!(classify(&tags(&[])), Other);
    }

    #[test]
    fn test_first_rule_wins() {
        // amenity rules for Health sit above the shop rule
        assert_eq!(classify(&tags(&[("shop", "chemist"), ("amenity", "pharmacy")])), Health);
        // religion outranks everything below it
        assert_eq!(classify(&tags(&[("religion", "christian"), ("amenity", "school")])), Religious);
        // Cultural tourism is checked before Commercial tourism
        assert_eq!(classify(&tags(&[("tourism", "museum"), ("shop", "gift")])), Cultural);
    }

    #[test]
    fn test_multi_value_and_negative() {
        assert_eq!(classify(&tags(&[("amenity", "cafe;library")])), Education);
        assert_eq!(classify(&tags(&[("shop", "no")])), Other);
    }

    #[test]
    fn test_matching_rule_is_auditable() {
        let r = matching_rule(&tags(&[("public_transport", "platform")])).unwrap();
        assert_eq!(r.key, "public_transport");
        assert_eq!(r.group, Transport);
    }
}
