//! Option lists for the roll selection form.
//!
//! These only build markup; choosing and validating happens in [`crate::roll`].

use std::collections::HashMap;

use crate::content::builtin_catalogs;
use crate::error::RollError;
use crate::roll::{Effect, Position};
use crate::sheet::CharacterSheet;

/// Localization service injected into the display helpers.
pub trait Translate {
    fn translate(&self, key: &str) -> String;
}

impl<F> Translate for F
where
    F: Fn(&str) -> String,
{
    fn translate(&self, key: &str) -> String {
        self(key)
    }
}

/// Key → text table; unknown keys translate to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    pub fn from_json(text: &str) -> Result<Self, RollError> {
        let entries =
            serde_json::from_str(text).map_err(|e| RollError::Config(format!("catalog: {}", e)))?;
        Ok(Self { entries })
    }

    pub fn builtin(lang: &str) -> Result<Self, RollError> {
        let text = builtin_catalogs()
            .get(lang)
            .copied()
            .ok_or_else(|| RollError::Config(format!("no built-in catalog '{}'", lang)))?;
        Self::from_json(text)
    }
}

impl Translate for Catalog {
    fn translate(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// `<option>`s for every modifier in `min..=max`, e.g. `-1d`, `+0d`, `+1d`.
pub fn modifier_options(min: i32, max: i32, selected: i32) -> String {
    let mut text = String::new();
    for i in min..=max {
        text.push_str(&format!(r#"<option value="{}""#, i));
        if i == selected {
            text.push_str(" selected");
        }
        text.push_str(&format!(">{:+}d</option>", i));
    }
    text
}

/// One `<optgroup>` per attribute: the attribute as a resistance roll, then its skills.
pub fn action_options(sheet: &CharacterSheet, tr: &impl Translate) -> String {
    let mut text = String::new();
    let actions = tr.translate("roll.actions");
    let resist = tr.translate("roll.resist");
    for (attribute, attr) in &sheet.attributes {
        let name = escape(attribute);
        text.push_str(&format!(r#"<optgroup label="{} {}">"#, name, escape(&actions)));
        text.push_str(&format!(
            r#"<option value="{}">{} ({})</option>"#,
            name,
            name,
            escape(&resist)
        ));
        for skill in attr.skills.keys() {
            let skill = escape(skill);
            text.push_str(&format!(r#"<option value="{}">{}</option>"#, skill, skill));
        }
        text.push_str("</optgroup>");
    }
    text
}

pub fn position_options(selected: Position, tr: &impl Translate) -> String {
    let mut text = String::new();
    for p in Position::ALL {
        let label = tr.translate(&format!("position.{}", p.id()));
        push_option(&mut text, p.id(), p == selected, &label);
    }
    text
}

pub fn effect_options(selected: Effect, tr: &impl Translate) -> String {
    let mut text = String::new();
    for e in Effect::ALL {
        let label = tr.translate(&format!("effect.{}", e.id()));
        push_option(&mut text, e.id(), e == selected, &label);
    }
    text
}

/// Engagement dice quantities `0d..=maxd`.
pub fn engagement_options(max: u8) -> String {
    let mut text = String::new();
    for i in 0..=max {
        push_option(&mut text, &i.to_string(), false, &format!("{}d", i));
    }
    text
}

pub fn tier_options(max: u8) -> String {
    let mut text = String::new();
    for i in 0..=max {
        let value = i.to_string();
        push_option(&mut text, &value, false, &value);
    }
    text
}

fn push_option(text: &mut String, value: &str, selected: bool, label: &str) {
    text.push_str(&format!(r#"<option value="{}""#, escape(value)));
    if selected {
        text.push_str(" selected");
    }
    text.push_str(&format!(">{}</option>", escape(label)));
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
