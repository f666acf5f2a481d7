use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::error::EvaluatorError;
use crate::roll::{Position, RollKind, RollRequest};

/// The collaborator that actually throws dice and reports the outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RollEvaluator: Send + Sync {
    async fn perform(&self, request: &RollRequest) -> Result<RollResult, EvaluatorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Critical,
    Success,
    Partial,
    Failure,
}

impl Outcome {
    pub fn label_key(self) -> &'static str {
        match self {
            Outcome::Critical => "outcome.critical",
            Outcome::Success => "outcome.success",
            Outcome::Partial => "outcome.partial",
            Outcome::Failure => "outcome.failure",
        }
    }
}

/// What an outcome means for the kind of roll that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Reading {
    /// The outcome speaks for itself (action, fortune, gather information).
    Outcome,
    /// Stress paid to resist; negative on a critical, which clears stress.
    StressCost { stress: i32 },
    /// Stress cleared by indulging; overindulged when it exceeds current stress.
    StressCleared { cleared: u32, overindulged: bool },
    StartingPosition { position: Position },
    AssetQuality { quality: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollResult {
    pub rolls: Vec<u8>,
    pub kept: u8,
    pub outcome: Outcome,
    pub reading: Reading,
}

/// Picks the deciding die: highest normally, lowest when the pool had no dice.
pub fn read_dice(rolls: &[u8], zero_pool: bool) -> (u8, Outcome) {
    let kept = if zero_pool {
        rolls.iter().min()
    } else {
        rolls.iter().max()
    }
    .copied()
    .unwrap_or(1);
    let sixes = rolls.iter().filter(|&&d| d == 6).count();
    let outcome = match kept {
        6 if !zero_pool && sixes >= 2 => Outcome::Critical,
        6 => Outcome::Success,
        4 | 5 => Outcome::Partial,
        _ => Outcome::Failure,
    };
    (kept, outcome)
}

/// Interprets a result for `request`'s roll kind.
pub fn interpret(request: &RollRequest, kept: u8, outcome: Outcome) -> Reading {
    match request.kind {
        RollKind::Action { .. } | RollKind::Fortune | RollKind::GatherInfo => Reading::Outcome,
        RollKind::Resistance => {
            let stress = match outcome {
                Outcome::Critical => -1,
                _ => 6 - i32::from(kept),
            };
            Reading::StressCost { stress }
        }
        RollKind::IndulgeVice => {
            let cleared = u32::from(kept);
            Reading::StressCleared {
                cleared,
                overindulged: cleared > request.stress.unwrap_or(0),
            }
        }
        RollKind::Engagement { .. } => Reading::StartingPosition {
            position: match outcome {
                Outcome::Critical | Outcome::Success => Position::Controlled,
                Outcome::Partial => Position::Risky,
                Outcome::Failure => Position::Desperate,
            },
        },
        RollKind::AcquireAsset { tier } => {
            let quality = match outcome {
                Outcome::Critical => i32::from(tier) + 2,
                Outcome::Success => i32::from(tier) + 1,
                Outcome::Partial => i32::from(tier),
                Outcome::Failure => i32::from(tier) - 1,
            };
            Reading::AssetQuality {
                quality: quality.max(0) as u8,
            }
        }
    }
}

enum DieSource {
    Seeded(ChaCha8Rng),
    Scripted(VecDeque<u8>),
}

/// Reference d6 evaluator: seeded for reproducible sessions, scripted for tests.
pub struct DiceRoller {
    source: Mutex<DieSource>,
}

impl DiceRoller {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: Mutex::new(DieSource::Seeded(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Hands out `faces` in order; running out fails the roll.
    pub fn from_scripted(faces: Vec<u8>) -> Self {
        Self {
            source: Mutex::new(DieSource::Scripted(faces.into())),
        }
    }

    fn throw(&self, count: usize) -> Result<Vec<u8>, EvaluatorError> {
        let mut source = self
            .source
            .lock()
            .map_err(|_| EvaluatorError::Rejected("dice source poisoned".to_string()))?;
        let mut rolls = Vec::with_capacity(count);
        for _ in 0..count {
            let face = match &mut *source {
                DieSource::Seeded(rng) => rng.gen_range(1..=6),
                DieSource::Scripted(faces) => faces.pop_front().ok_or_else(|| {
                    EvaluatorError::Rejected("scripted dice exhausted".to_string())
                })?,
            };
            rolls.push(face);
        }
        Ok(rolls)
    }
}

#[async_trait]
impl RollEvaluator for DiceRoller {
    async fn perform(&self, request: &RollRequest) -> Result<RollResult, EvaluatorError> {
        let zero_pool = request.dice <= 0;
        let count = if zero_pool { 2 } else { request.dice as usize };
        let rolls = self.throw(count)?;
        let (kept, outcome) = read_dice(&rolls, zero_pool);
        let reading = interpret(request, kept, outcome);
        Ok(RollResult {
            rolls,
            kept,
            outcome,
            reading,
        })
    }
}

/// Evaluator wrapper that gives up after `limit`.
pub struct Timed<E> {
    inner: E,
    limit: Duration,
}

pub fn with_timeout<E: RollEvaluator>(inner: E, limit: Duration) -> Timed<E> {
    Timed { inner, limit }
}

#[async_trait]
impl<E: RollEvaluator> RollEvaluator for Timed<E> {
    async fn perform(&self, request: &RollRequest) -> Result<RollResult, EvaluatorError> {
        tokio::time::timeout(self.limit, self.inner.perform(request))
            .await
            .map_err(|_| EvaluatorError::TimedOut(self.limit))?
    }
}
