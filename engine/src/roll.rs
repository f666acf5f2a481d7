use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RollError;
use crate::evaluator::{RollEvaluator, RollResult};
use crate::pool::{compute_dice_pool, DicePool, VICE_KEY};
use crate::ruleset::RulesetConfig;
use crate::sheet::CharacterSheet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Controlled,
    #[default]
    Risky,
    Desperate,
}

impl Position {
    pub const ALL: [Position; 3] = [Position::Controlled, Position::Risky, Position::Desperate];

    pub fn id(self) -> &'static str {
        match self {
            Position::Controlled => "controlled",
            Position::Risky => "risky",
            Position::Desperate => "desperate",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Position {
    type Err = RollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RollError::invalid("position", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Limited,
    #[default]
    Standard,
    Great,
}

impl Effect {
    pub const ALL: [Effect; 3] = [Effect::Limited, Effect::Standard, Effect::Great];

    pub fn id(self) -> &'static str {
        match self {
            Effect::Limited => "limited",
            Effect::Standard => "standard",
            Effect::Great => "great",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Effect {
    type Err = RollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Effect::ALL
            .into_iter()
            .find(|e| e.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RollError::invalid("effect", s))
    }
}

/// Which rule applies to a roll, with the inputs only that rule needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RollKind {
    Action { position: Position, effect: Effect },
    Fortune,
    GatherInfo,
    IndulgeVice,
    Engagement { dice: u8 },
    AcquireAsset { tier: u8 },
    /// Rolling an attribute directly, or a submission with no kind chosen.
    Resistance,
}

impl Default for RollKind {
    fn default() -> Self {
        RollKind::Action {
            position: Position::default(),
            effect: Effect::default(),
        }
    }
}

impl RollKind {
    /// Form id of the kind; resistance has none on the form.
    pub fn id(&self) -> &'static str {
        match self {
            RollKind::Action { .. } => "actionRoll",
            RollKind::Fortune => "fortune",
            RollKind::GatherInfo => "gatherInfo",
            RollKind::IndulgeVice => "indulgeVice",
            RollKind::Engagement { .. } => "engagement",
            RollKind::AcquireAsset { .. } => "acquireAsset",
            RollKind::Resistance => "resistance",
        }
    }

    /// Translation key of the label shown instead of the subject name.
    pub fn label_key(&self) -> Option<&'static str> {
        match self {
            RollKind::Action { .. } | RollKind::Resistance => None,
            RollKind::Fortune => Some("roll.fortune"),
            RollKind::GatherInfo => Some("roll.gather_information"),
            RollKind::IndulgeVice => Some("roll.vice"),
            RollKind::Engagement { .. } => Some("roll.engagement"),
            RollKind::AcquireAsset { .. } => Some("roll.acquire_asset"),
        }
    }
}

/// A validated choice from the selection form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSelection {
    pub subject: String,
    pub modifier: i32,
    pub kind: RollKind,
    #[serde(default)]
    pub note: String,
}

/// Raw field values as a selection form submits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionForm {
    pub subject: String,
    pub modifier: String,
    /// Id of the checked roll-kind radio, if any.
    pub kind: Option<String>,
    pub position: String,
    pub effect: String,
    pub quantity: String,
    pub tier: String,
    pub note: String,
}

impl SelectionForm {
    /// Validates the raw fields against `ruleset`.
    ///
    /// Auxiliary fields are only read for the kind that uses them, and an
    /// unchecked radio group resolves to a resistance roll.
    pub fn parse(&self, ruleset: &RulesetConfig) -> Result<UserSelection, RollError> {
        let modifier = parse_number::<i32>("modifier", &self.modifier)?;
        if !ruleset.modifier_range.contains(modifier) {
            return Err(RollError::invalid("modifier", &self.modifier));
        }

        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") => RollKind::Resistance,
            Some("actionRoll") => RollKind::Action {
                position: or_default(&self.position)?,
                effect: or_default(&self.effect)?,
            },
            Some("fortune") => RollKind::Fortune,
            Some("gatherInfo") => RollKind::GatherInfo,
            Some("indulgeVice") => RollKind::IndulgeVice,
            Some("engagement") => {
                let dice = parse_number::<u8>("quantity", &self.quantity)?;
                if dice > ruleset.max_engagement_dice {
                    return Err(RollError::invalid("quantity", &self.quantity));
                }
                RollKind::Engagement { dice }
            }
            Some("acquireAsset") => {
                let tier = parse_number::<u8>("tier", &self.tier)?;
                if tier > ruleset.max_tier {
                    return Err(RollError::invalid("tier", &self.tier));
                }
                RollKind::AcquireAsset { tier }
            }
            Some(other) => return Err(RollError::invalid("roll kind", other)),
        };

        Ok(UserSelection {
            subject: self.subject.trim().to_string(),
            modifier,
            kind,
            note: self.note.clone(),
        })
    }
}

fn parse_number<T: FromStr>(field: &'static str, raw: &str) -> Result<T, RollError> {
    raw.trim()
        .parse()
        .map_err(|_| RollError::invalid(field, raw))
}

fn or_default<T: FromStr<Err = RollError> + Default>(raw: &str) -> Result<T, RollError> {
    if raw.trim().is_empty() {
        Ok(T::default())
    } else {
        raw.parse()
    }
}

/// What the selection dialog produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Submitted(SelectionForm),
    Dismissed,
}

/// Everything the roll evaluator needs for one roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollRequest {
    pub subject: String,
    /// Subject key for action and resistance rolls, otherwise a translation key.
    pub label: String,
    /// May be zero or negative; the evaluator decides how such pools roll.
    pub dice: i32,
    pub modifier: i32,
    pub kind: RollKind,
    pub note: String,
    /// Current stress, forwarded for rolls that spend or clear it.
    pub stress: Option<u32>,
}

impl RollRequest {
    pub fn position(&self) -> Option<Position> {
        match self.kind {
            RollKind::Action { position, .. } => Some(position),
            _ => None,
        }
    }

    pub fn effect(&self) -> Option<Effect> {
        match self.kind {
            RollKind::Action { effect, .. } => Some(effect),
            _ => None,
        }
    }

    pub fn tier(&self) -> Option<u8> {
        match self.kind {
            RollKind::AcquireAsset { tier } => Some(tier),
            _ => None,
        }
    }
}

/// A dispatched roll and what the evaluator made of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub request: RollRequest,
    pub result: RollResult,
}

/// Turns a selection into a [`RollRequest`] and hands it to a [`RollEvaluator`].
#[derive(Debug, Clone, Copy)]
pub struct RollIntentResolver<'a> {
    ruleset: &'a RulesetConfig,
}

impl<'a> RollIntentResolver<'a> {
    pub fn new(ruleset: &'a RulesetConfig) -> Self {
        Self { ruleset }
    }

    /// Works out the dice count and forwarded parameters without rolling.
    pub fn plan(
        &self,
        pool: &DicePool,
        selection: &UserSelection,
        stress: u32,
    ) -> Result<RollRequest, RollError> {
        let modifier = selection.modifier;
        if !self.ruleset.modifier_range.contains(modifier) {
            return Err(RollError::invalid("modifier", modifier.to_string()));
        }
        // Only actions offer roll kinds; an attribute always rolls to resist.
        if selection.kind != RollKind::Resistance {
            match pool.entry(&selection.subject) {
                None => return Err(RollError::invalid("subject", &selection.subject)),
                Some(_) if !pool.is_action(&selection.subject) => {
                    return Err(RollError::invalid("roll kind", selection.kind.id()));
                }
                Some(_) => {}
            }
        }
        let subject_dice = || {
            pool.get(&selection.subject)
                .map(|d| d as i32)
                .ok_or_else(|| RollError::invalid("subject", &selection.subject))
        };

        let (dice, stress) = match selection.kind {
            RollKind::Action { .. } | RollKind::Resistance => {
                (subject_dice()? + modifier, Some(stress))
            }
            RollKind::Fortune | RollKind::GatherInfo => (subject_dice()? + modifier, None),
            RollKind::IndulgeVice => (pool.vice() as i32 + modifier, Some(stress)),
            RollKind::Engagement { dice } => {
                if dice > self.ruleset.max_engagement_dice {
                    return Err(RollError::invalid("quantity", dice.to_string()));
                }
                (i32::from(dice), None)
            }
            RollKind::AcquireAsset { tier } => {
                if tier > self.ruleset.max_tier {
                    return Err(RollError::invalid("tier", tier.to_string()));
                }
                (i32::from(tier) + modifier, None)
            }
        };

        let subject = match selection.kind {
            RollKind::IndulgeVice => VICE_KEY.to_string(),
            _ => selection.subject.clone(),
        };
        let label = selection
            .kind
            .label_key()
            .map(str::to_string)
            .unwrap_or_else(|| subject.clone());

        let request = RollRequest {
            subject,
            label,
            dice,
            modifier,
            kind: selection.kind,
            note: selection.note.clone(),
            stress,
        };
        debug!(?request, "planned roll");
        Ok(request)
    }

    /// Plans the roll and waits for the evaluator to perform it.
    pub async fn resolve<E>(
        &self,
        pool: &DicePool,
        selection: &UserSelection,
        stress: u32,
        evaluator: &E,
    ) -> Result<Resolved, RollError>
    where
        E: RollEvaluator + ?Sized,
    {
        let request = self.plan(pool, selection, stress)?;
        info!(label = %request.label, dice = request.dice, "dispatching roll");
        match evaluator.perform(&request).await {
            Ok(result) => Ok(Resolved { request, result }),
            Err(err) => {
                warn!(label = %request.label, error = %err, "roll evaluator failed");
                Err(err.into())
            }
        }
    }

    /// Full round trip for one dialog: a dismissed dialog rolls nothing.
    ///
    /// The pool is recomputed from `sheet` on every call.
    pub async fn roll_for_sheet<E>(
        &self,
        sheet: &CharacterSheet,
        outcome: DialogOutcome,
        evaluator: &E,
    ) -> Result<Option<Resolved>, RollError>
    where
        E: RollEvaluator + ?Sized,
    {
        let form = match outcome {
            DialogOutcome::Submitted(form) => form,
            DialogOutcome::Dismissed => {
                debug!("selection dialog dismissed");
                return Ok(None);
            }
        };
        let selection = form.parse(self.ruleset)?;
        let pool = compute_dice_pool(sheet, self.ruleset)?;
        self.resolve(&pool, &selection, sheet.stress.value, evaluator)
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluatorError;
    use crate::evaluator::{MockRollEvaluator, Outcome, Reading};
    use crate::sheet::Attribute;

    fn sheet() -> CharacterSheet {
        CharacterSheet::new()
            .with_attribute("insight", Attribute::from_ratings([("hunt", 1), ("study", 3)]).unwrap())
            .with_attribute(
                "prowess",
                Attribute::from_ratings([("skirmish", 2), ("wreck", 0)]).unwrap(),
            )
            .with_attribute(
                "resolve",
                Attribute::from_ratings([("attune", 0), ("command", 0)]).unwrap(),
            )
            .with_stress(4)
    }

    fn canned_result() -> RollResult {
        RollResult {
            rolls: vec![5],
            kept: 5,
            outcome: Outcome::Partial,
            reading: Reading::Outcome,
        }
    }

    fn form(kind: Option<&str>) -> SelectionForm {
        SelectionForm {
            subject: "skirmish".into(),
            modifier: "1".into(),
            kind: kind.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn dismissed_dialog_never_calls_evaluator() {
        let ruleset = RulesetConfig::default();
        let mut evaluator = MockRollEvaluator::new();
        evaluator.expect_perform().times(0);

        let out = RollIntentResolver::new(&ruleset)
            .roll_for_sheet(&sheet(), DialogOutcome::Dismissed, &evaluator)
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn submitted_dialog_calls_evaluator_once() {
        let ruleset = RulesetConfig::default();
        let mut evaluator = MockRollEvaluator::new();
        evaluator
            .expect_perform()
            .withf(|req| req.subject == "skirmish" && req.dice == 3)
            .times(1)
            .returning(|_| Ok(canned_result()));

        let out = RollIntentResolver::new(&ruleset)
            .roll_for_sheet(&sheet(), DialogOutcome::Submitted(form(Some("actionRoll"))), &evaluator)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out.request.position(), Some(Position::Risky));
        assert_eq!(out.request.effect(), Some(Effect::Standard));
        assert_eq!(out.request.stress, Some(4));
        assert_eq!(out.result.outcome, Outcome::Partial);
    }

    #[tokio::test]
    async fn evaluator_failure_propagates() {
        let ruleset = RulesetConfig::default();
        let mut evaluator = MockRollEvaluator::new();
        evaluator
            .expect_perform()
            .times(1)
            .returning(|_| Err(EvaluatorError::Rejected("table closed".into())));

        let err = RollIntentResolver::new(&ruleset)
            .roll_for_sheet(&sheet(), DialogOutcome::Submitted(form(Some("fortune"))), &evaluator)
            .await
            .unwrap_err();
        assert!(matches!(err, RollError::EvaluatorFailure(EvaluatorError::Rejected(_))));
    }

    #[tokio::test]
    async fn invalid_form_is_rejected_before_rolling() {
        let ruleset = RulesetConfig::default();
        let mut evaluator = MockRollEvaluator::new();
        evaluator.expect_perform().times(0);

        let mut bad = form(Some("actionRoll"));
        bad.modifier = "two".into();
        let err = RollIntentResolver::new(&ruleset)
            .roll_for_sheet(&sheet(), DialogOutcome::Submitted(bad), &evaluator)
            .await
            .unwrap_err();
        assert!(matches!(err, RollError::InvalidInput { field: "modifier", .. }));
    }

    #[test]
    fn unchecked_kind_is_resistance() {
        let selection = form(None).parse(&RulesetConfig::default()).unwrap();
        assert_eq!(selection.kind, RollKind::Resistance);
    }

    #[test]
    fn auxiliary_fields_are_validated_for_their_kind_only() {
        let ruleset = RulesetConfig::default();

        let mut f = form(Some("fortune"));
        f.tier = "lots".into();
        assert_eq!(f.parse(&ruleset).unwrap().kind, RollKind::Fortune);

        let mut f = form(Some("acquireAsset"));
        f.tier = "lots".into();
        assert!(matches!(
            f.parse(&ruleset),
            Err(RollError::InvalidInput { field: "tier", .. })
        ));

        let mut f = form(Some("engagement"));
        f.quantity = "11".into();
        assert!(matches!(
            f.parse(&ruleset),
            Err(RollError::InvalidInput { field: "quantity", .. })
        ));

        let mut f = form(Some("actionRoll"));
        f.position = "desperate".into();
        f.effect = "great".into();
        assert_eq!(
            f.parse(&ruleset).unwrap().kind,
            RollKind::Action {
                position: Position::Desperate,
                effect: Effect::Great
            }
        );

        let mut f = form(Some("actionRoll"));
        f.effect = "huge".into();
        assert!(matches!(
            f.parse(&ruleset),
            Err(RollError::InvalidInput { field: "effect", .. })
        ));

        assert!(matches!(
            form(Some("flashback")).parse(&ruleset),
            Err(RollError::InvalidInput { field: "roll kind", .. })
        ));
    }

    #[test]
    fn modifier_outside_range_is_rejected() {
        let mut f = form(Some("fortune"));
        f.modifier = "+4".into();
        assert!(f.parse(&RulesetConfig::default()).is_err());
        f.modifier = "-3".into();
        assert_eq!(f.parse(&RulesetConfig::default()).unwrap().modifier, -3);
    }
}
