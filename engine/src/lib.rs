pub mod content;
pub mod display;
pub mod error;
pub mod evaluator;
pub mod pool;
pub mod records;
pub mod roll;
pub mod ruleset;
pub mod sheet;

pub use error::{EvaluatorError, RollError};
pub use evaluator::{with_timeout, DiceRoller, Outcome, Reading, RollEvaluator, RollResult};
pub use pool::{compute_dice_pool, DicePool, PoolEntry, Subject, VICE_KEY};
pub use records::RecordDefaults;
pub use roll::{
    DialogOutcome, Effect, Position, Resolved, RollIntentResolver, RollKind, RollRequest,
    SelectionForm, UserSelection,
};
pub use ruleset::{ModifierRange, RulesetConfig};
pub use sheet::{Attribute, CharacterSheet, Skill, SkillRating, Stress, MAX_RATING};

/// Loads one of the characters shipped under `content/characters`.
pub fn builtin_character(id: &str) -> Result<CharacterSheet, RollError> {
    let text = content::builtin_characters()
        .get(id)
        .copied()
        .ok_or_else(|| RollError::Config(format!("no built-in character '{}'", id)))?;
    CharacterSheet::from_json(text)
}
