use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::content::builtin_rulesets;
use crate::error::RollError;

/// Inclusive range of dice modifiers offered to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierRange {
    pub min: i32,
    pub max: i32,
    #[serde(default)]
    pub default: i32,
}

impl ModifierRange {
    pub fn contains(&self, modifier: i32) -> bool {
        (self.min..=self.max).contains(&modifier)
    }
}

impl Default for ModifierRange {
    fn default() -> Self {
        Self {
            min: -3,
            max: 3,
            default: 0,
        }
    }
}

/// Per-ruleset knobs for pool computation, the selection form and record creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RulesetConfig {
    pub name: String,
    /// The mind/body/will attributes whose lowest count is the vice pool.
    pub vice_axes: [String; 3],
    pub modifier_range: ModifierRange,
    pub max_engagement_dice: u8,
    pub max_tier: u8,
    /// Record type → whether its prototype token is linked to the sheet.
    pub token_sync: BTreeMap<String, bool>,
}

impl Default for RulesetConfig {
    fn default() -> Self {
        Self {
            name: "Blades in the Dark".to_string(),
            vice_axes: [
                "insight".to_string(),
                "prowess".to_string(),
                "resolve".to_string(),
            ],
            modifier_range: ModifierRange::default(),
            max_engagement_dice: 10,
            max_tier: 4,
            token_sync: BTreeMap::from([
                ("character".to_string(), true),
                ("crew".to_string(), true),
                ("clock".to_string(), true),
            ]),
        }
    }
}

impl RulesetConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, RollError> {
        let cfg: Self =
            serde_yaml::from_str(text).map_err(|e| RollError::Config(e.to_string()))?;
        cfg.validate()
    }

    pub fn from_json_str(text: &str) -> Result<Self, RollError> {
        let cfg: Self =
            serde_json::from_str(text).map_err(|e| RollError::Config(e.to_string()))?;
        cfg.validate()
    }

    /// Loads a ruleset file, picking the format from its extension (`.json`, otherwise YAML).
    pub fn load(path: &Path) -> Result<Self, RollError> {
        let text = fs::read_to_string(path)
            .map_err(|e| RollError::Config(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    pub fn builtin(id: &str) -> Result<Self, RollError> {
        let text = builtin_rulesets()
            .get(id)
            .copied()
            .ok_or_else(|| RollError::Config(format!("no built-in ruleset '{}'", id)))?;
        Self::from_yaml_str(text)
    }

    fn validate(self) -> Result<Self, RollError> {
        let range = self.modifier_range;
        if range.min > range.max || !range.contains(range.default) {
            return Err(RollError::Config(format!(
                "modifier range {}..={} must contain default {}",
                range.min, range.max, range.default
            )));
        }
        let [a, b, c] = &self.vice_axes;
        if a.is_empty() || b.is_empty() || c.is_empty() || a == b || b == c || a == c {
            return Err(RollError::Config(format!(
                "vice axes must be three distinct attributes, got {:?}",
                self.vice_axes
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_blades_matches_default() {
        assert_eq!(RulesetConfig::builtin("blades").unwrap(), RulesetConfig::default());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = RulesetConfig::from_yaml_str(
            "name: Scum and Villainy\nvice_axes: [insight, prowess, resolve]\nmax_tier: 5\n",
        )
        .unwrap();
        assert_eq!(cfg.max_tier, 5);
        assert_eq!(cfg.max_engagement_dice, 10);
        assert_eq!(cfg.modifier_range, ModifierRange::default());
    }

    #[test]
    fn renamed_axes_from_json() {
        let cfg = RulesetConfig::from_json_str(
            r#"{ "vice_axes": ["intuition", "body", "willpower"] }"#,
        )
        .unwrap();
        assert_eq!(cfg.vice_axes[1], "body");
    }

    #[test]
    fn rejects_bad_ranges_and_axes() {
        let err = RulesetConfig::from_yaml_str("modifier_range: { min: 2, max: -2 }\n").unwrap_err();
        assert!(matches!(err, RollError::Config(_)));

        let err =
            RulesetConfig::from_yaml_str("vice_axes: [insight, insight, resolve]\n").unwrap_err();
        assert!(matches!(err, RollError::Config(_)));
    }
}
