use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::RollError;

/// Highest rating a skill can carry.
pub const MAX_RATING: u8 = 4;

/// A skill rating in `0..=MAX_RATING`.
///
/// Host records store ratings as text whose first character is the digit
/// (`"2"`), sometimes wrapped in a list (`["2"]`). Both shapes are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRating", into = "String")]
pub struct SkillRating(u8);

impl SkillRating {
    pub fn new(value: u8) -> Result<Self, RollError> {
        if value > MAX_RATING {
            return Err(RollError::invalid("skill rating", value.to_string()));
        }
        Ok(Self(value))
    }

    /// Reads the rating from the first character of `text`.
    pub fn parse(text: &str) -> Result<Self, RollError> {
        let digit = text
            .trim_start()
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| RollError::invalid("skill rating", text))?;
        Self::new(digit as u8).map_err(|_| RollError::invalid("skill rating", text))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRating {
    Number(u8),
    Text(String),
    List(Vec<String>),
}

impl TryFrom<RawRating> for SkillRating {
    type Error = RollError;

    fn try_from(raw: RawRating) -> Result<Self, Self::Error> {
        match raw {
            RawRating::Number(n) => SkillRating::new(n),
            RawRating::Text(text) => SkillRating::parse(&text),
            RawRating::List(items) => match items.first() {
                Some(first) => SkillRating::parse(first),
                None => Err(RollError::invalid("skill rating", "[]")),
            },
        }
    }
}

impl From<SkillRating> for String {
    fn from(rating: SkillRating) -> Self {
        rating.0.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub value: SkillRating,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub skills: IndexMap<String, Skill>,
}

impl Attribute {
    /// Builds an attribute from `(skill, rating)` pairs, validating each rating.
    pub fn from_ratings<I, S>(ratings: I) -> Result<Self, RollError>
    where
        I: IntoIterator<Item = (S, u8)>,
        S: Into<String>,
    {
        let mut skills = IndexMap::new();
        for (name, rating) in ratings {
            skills.insert(
                name.into(),
                Skill {
                    value: SkillRating::new(rating)?,
                },
            );
        }
        Ok(Self { skills })
    }

    /// Number of skills rated above zero.
    pub fn rated_skills(&self) -> u32 {
        self.skills.values().filter(|s| s.value.value() > 0).count() as u32
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stress {
    #[serde(default, deserialize_with = "lenient_count")]
    pub value: u32,
}

/// The slice of a host character record the roller reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSheet {
    #[serde(default)]
    pub attributes: IndexMap<String, Attribute>,
    #[serde(default)]
    pub stress: Stress,
}

impl CharacterSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, RollError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn with_stress(mut self, stress: u32) -> Self {
        self.stress.value = stress;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Name of the attribute owning `skill`, if any.
    pub fn attribute_of(&self, skill: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(_, attr)| attr.skills.contains_key(skill))
            .map(|(name, _)| name.as_str())
    }
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(text) if text.trim().is_empty() => Ok(0),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected a whole number, got {text:?}"))),
    }
}
