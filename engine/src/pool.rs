use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::error::RollError;
use crate::ruleset::RulesetConfig;
use crate::sheet::CharacterSheet;

/// Pool key of the vice roll.
pub const VICE_KEY: &str = "vice";

/// What a pool key refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Subject {
    Attribute,
    /// A skill's standalone count is only shown, never rolled on its own.
    Skill { attribute: String },
    Vice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolEntry {
    pub dice: u32,
    #[serde(flatten)]
    pub subject: Subject,
}

/// Dice available per attribute, per skill and for vice, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DicePool {
    entries: IndexMap<String, PoolEntry>,
}

impl DicePool {
    pub fn get(&self, key: &str) -> Option<u32> {
        self.entries.get(key).map(|e| e.dice)
    }

    pub fn entry(&self, key: &str) -> Option<&PoolEntry> {
        self.entries.get(key)
    }

    pub fn vice(&self) -> u32 {
        self.get(VICE_KEY).unwrap_or(0)
    }

    /// True when `key` names a skill, i.e. an action the player can choose a roll kind for.
    pub fn is_action(&self, key: &str) -> bool {
        matches!(
            self.entries.get(key),
            Some(PoolEntry {
                subject: Subject::Skill { .. },
                ..
            })
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PoolEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derives the dice pool from a sheet.
///
/// Each attribute rolls one die per skill rated above zero. Vice rolls the
/// lowest of the ruleset's three axis attributes, taken once every attribute
/// has been counted.
///
/// Every key names exactly one subject: a skill sharing its name with an
/// attribute, another skill or the vice entry is `InvalidInput`.
pub fn compute_dice_pool(
    sheet: &CharacterSheet,
    ruleset: &RulesetConfig,
) -> Result<DicePool, RollError> {
    let mut entries = IndexMap::new();

    for (attr_name, attribute) in &sheet.attributes {
        if attr_name == VICE_KEY {
            return Err(RollError::invalid("attribute", attr_name));
        }
        entries.insert(
            attr_name.clone(),
            PoolEntry {
                dice: attribute.rated_skills(),
                subject: Subject::Attribute,
            },
        );
        for (skill_name, skill) in &attribute.skills {
            if skill_name == VICE_KEY
                || sheet.attributes.contains_key(skill_name)
                || entries.contains_key(skill_name)
            {
                return Err(RollError::invalid("skill", skill_name));
            }
            entries.insert(
                skill_name.clone(),
                PoolEntry {
                    dice: u32::from(skill.value.value()),
                    subject: Subject::Skill {
                        attribute: attr_name.clone(),
                    },
                },
            );
        }
    }

    let mut vice = u32::MAX;
    for axis in &ruleset.vice_axes {
        let dice = sheet
            .attribute(axis)
            .map(|a| a.rated_skills())
            .ok_or_else(|| RollError::MissingAxisAttribute(axis.clone()))?;
        vice = vice.min(dice);
    }
    entries.insert(
        VICE_KEY.to_string(),
        PoolEntry {
            dice: vice,
            subject: Subject::Vice,
        },
    );

    let pool = DicePool { entries };
    debug!(entries = pool.len(), vice, "computed dice pool");
    Ok(pool)
}
