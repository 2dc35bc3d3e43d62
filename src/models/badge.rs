//! Badge catalog.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    Rank,
    Achievement,
}

/// Static catalog entry. The description may embed the current power cap,
/// which is only known at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Appended when a power cap is configured; `{cap}` is substituted.
    pub cap_suffix: Option<&'static str>,
    pub icon: &'static str,
    pub color: &'static str,
    pub category: BadgeCategory,
}

pub const BRIGHTEST: BadgeDefinition = BadgeDefinition {
    id: "brightest",
    name: "Brightest",
    description: "Top 10% power level among tracked Guardians",
    cap_suffix: Some(" (current power cap: {cap})"),
    icon: "sun",
    color: "#f5c518",
    category: BadgeCategory::Rank,
};

pub const VETERAN: BadgeDefinition = BadgeDefinition {
    id: "veteran",
    name: "Veteran",
    description: "Top 25% power level among tracked Guardians",
    cap_suffix: None,
    icon: "shield",
    color: "#9b59b6",
    category: BadgeCategory::Rank,
};

pub const RISING_STAR: BadgeDefinition = BadgeDefinition {
    id: "rising_star",
    name: "Rising Star",
    description: "Above-median power level",
    cap_suffix: None,
    icon: "star",
    color: "#3498db",
    category: BadgeCategory::Rank,
};

pub const COLLECTOR: BadgeDefinition = BadgeDefinition {
    id: "collector",
    name: "Collector",
    description: "Top 10% triumph score",
    cap_suffix: None,
    icon: "trophy",
    color: "#e67e22",
    category: BadgeCategory::Achievement,
};

pub const DEDICATED: BadgeDefinition = BadgeDefinition {
    id: "dedicated",
    name: "Dedicated",
    description: "Top 10% total play time",
    cap_suffix: None,
    icon: "clock",
    color: "#1abc9c",
    category: BadgeCategory::Achievement,
};

pub const TRINITY: BadgeDefinition = BadgeDefinition {
    id: "trinity",
    name: "Trinity",
    description: "Owns a Titan, a Hunter and a Warlock",
    cap_suffix: None,
    icon: "triangle",
    color: "#2ecc71",
    category: BadgeCategory::Achievement,
};

pub const BALANCED: BadgeDefinition = BadgeDefinition {
    id: "balanced",
    name: "Balanced",
    description: "All characters within 50 power levels of each other",
    cap_suffix: None,
    icon: "scale",
    color: "#95a5a6",
    category: BadgeCategory::Achievement,
};

pub const BADGE_CATALOG: [BadgeDefinition; 7] = [
    BRIGHTEST,
    VETERAN,
    RISING_STAR,
    COLLECTOR,
    DEDICATED,
    TRINITY,
    BALANCED,
];

/// A badge as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub category: BadgeCategory,
}

impl BadgeDefinition {
    pub fn description(&self, power_cap: Option<u32>) -> String {
        match (self.cap_suffix, power_cap) {
            (Some(suffix), Some(cap)) => {
                format!("{}{}", self.description, suffix.replace("{cap}", &cap.to_string()))
            }
            _ => self.description.to_string(),
        }
    }

    pub fn render(&self, power_cap: Option<u32>) -> Badge {
        Badge {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description(power_cap),
            icon: self.icon.to_string(),
            color: self.color.to_string(),
            category: self.category,
        }
    }
}

/// Render the full catalog.
pub fn badge_catalog(power_cap: Option<u32>) -> Vec<Badge> {
    BADGE_CATALOG.iter().map(|b| b.render(power_cap)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<_> = BADGE_CATALOG.iter().map(|b| b.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), BADGE_CATALOG.len());
    }

    #[test]
    fn test_power_cap_description() {
        assert_eq!(
            BRIGHTEST.description(Some(2010)),
            "Top 10% power level among tracked Guardians (current power cap: 2010)"
        );
        assert_eq!(
            BRIGHTEST.description(None),
            "Top 10% power level among tracked Guardians"
        );
    }

    #[test]
    fn test_cap_ignored_for_static_badges() {
        assert_eq!(TRINITY.description(Some(2010)), TRINITY.description);
    }

    #[test]
    fn test_catalog_render_does_not_mutate_definitions() {
        let first = badge_catalog(Some(1000));
        let second = badge_catalog(None);
        assert!(first[0].description.contains("1000"));
        assert!(!second[0].description.contains("1000"));
        assert_eq!(BRIGHTEST.description, "Top 10% power level among tracked Guardians");
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_value(COLLECTOR.render(None)).unwrap();
        assert_eq!(json["category"], "achievement");
        assert_eq!(json["id"], "collector");
    }
}
