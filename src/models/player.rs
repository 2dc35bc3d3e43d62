//! Raw player and character records supplied by the sync collaborators.

use serde::{Deserialize, Serialize};

use super::{EntityId, PlayerId};

/// Guardian class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ClassType {
    Titan,
    Hunter,
    Warlock,
}

impl ClassType {
    pub const ALL: [ClassType; 3] = [ClassType::Titan, ClassType::Hunter, ClassType::Warlock];

    /// Lowercase key used in JSON payloads.
    pub fn key(&self) -> &'static str {
        match self {
            ClassType::Titan => "titan",
            ClassType::Hunter => "hunter",
            ClassType::Warlock => "warlock",
        }
    }
}

impl TryFrom<u8> for ClassType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ClassType::Titan),
            1 => Ok(ClassType::Hunter),
            2 => Ok(ClassType::Warlock),
            other => Err(format!("unknown class type {}", other)),
        }
    }
}

impl From<ClassType> for u8 {
    fn from(class: ClassType) -> u8 {
        match class {
            ClassType::Titan => 0,
            ClassType::Hunter => 1,
            ClassType::Warlock => 2,
        }
    }
}

impl std::fmt::Display for ClassType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassType::Titan => write!(f, "Titan"),
            ClassType::Hunter => write!(f, "Hunter"),
            ClassType::Warlock => write!(f, "Warlock"),
        }
    }
}

/// One value per class. Always exactly three slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerClass<T> {
    pub titan: T,
    pub hunter: T,
    pub warlock: T,
}

impl<T> PerClass<T> {
    pub fn from_fn(mut f: impl FnMut(ClassType) -> T) -> Self {
        Self {
            titan: f(ClassType::Titan),
            hunter: f(ClassType::Hunter),
            warlock: f(ClassType::Warlock),
        }
    }

    pub fn get(&self, class: ClassType) -> &T {
        match class {
            ClassType::Titan => &self.titan,
            ClassType::Hunter => &self.hunter,
            ClassType::Warlock => &self.warlock,
        }
    }

    pub fn get_mut(&mut self, class: ClassType) -> &mut T {
        match class {
            ClassType::Titan => &mut self.titan,
            ClassType::Hunter => &mut self.hunter,
            ClassType::Warlock => &mut self.warlock,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(ClassType, &T) -> U) -> PerClass<U> {
        PerClass::from_fn(|class| f(class, self.get(class)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassType, &T)> {
        ClassType::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// Bungie membership platform.
pub fn platform_name(membership_type: u16) -> &'static str {
    match membership_type {
        1 => "Xbox",
        2 => "PlayStation",
        3 => "Steam",
        4 => "Blizzard",
        5 => "Stadia",
        6 => "Epic Games",
        10 => "Demon",
        254 => "BungieNext",
        _ => "Unknown",
    }
}

/// A tracked player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub membership_id: String,
    pub membership_type: u16,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bungie_global_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bungie_global_display_name_code: Option<String>,
    #[serde(default)]
    pub triumph_score: u32,
}

impl Player {
    /// Create a player with an ID derived from the membership.
    pub fn new(
        membership_type: u16,
        membership_id: impl Into<String>,
        display_name: impl Into<String>,
        triumph_score: u32,
    ) -> Self {
        let membership_id = membership_id.into();
        Self {
            id: EntityId::for_membership(membership_type, &membership_id),
            membership_id,
            membership_type,
            display_name: display_name.into(),
            bungie_global_display_name: None,
            bungie_global_display_name_code: None,
            triumph_score,
        }
    }

    /// Attach a Bungie global name (`Name#1234`).
    pub fn with_bungie_name(mut self, name: impl Into<String>, code: impl Into<String>) -> Self {
        self.bungie_global_display_name = Some(name.into());
        self.bungie_global_display_name_code = Some(code.into());
        self
    }

    /// `Name#Code` when a Bungie global name is known, else the platform name.
    pub fn full_display_name(&self) -> String {
        match (
            self.bungie_global_display_name.as_deref(),
            self.bungie_global_display_name_code.as_deref(),
        ) {
            (Some(name), Some(code)) if !name.is_empty() && !code.is_empty() => {
                format!("{}#{}", name, code)
            }
            _ => self.display_name.clone(),
        }
    }

    pub fn platform(&self) -> &'static str {
        platform_name(self.membership_type)
    }
}

/// A character owned by a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub player_id: PlayerId,
    #[serde(default)]
    pub character_id: String,
    pub class_type: ClassType,
    #[serde(default)]
    pub power_level: u32,
    #[serde(default)]
    pub minutes_played_total: u64,
}

impl Character {
    pub fn new(
        player_id: PlayerId,
        class_type: ClassType,
        power_level: u32,
        minutes_played_total: u64,
    ) -> Self {
        Self {
            player_id,
            character_id: String::new(),
            class_type,
            power_level,
            minutes_played_total,
        }
    }
}
