use std::time::Duration;

use async_trait::async_trait;
use bladesroll_engine::{
    with_timeout, DiceRoller, EvaluatorError, Outcome, Position, Reading, RollEvaluator,
    RollKind, RollRequest, RollResult,
};

fn request(dice: i32, kind: RollKind, stress: Option<u32>) -> RollRequest {
    RollRequest {
        subject: "skirmish".into(),
        label: "skirmish".into(),
        dice,
        modifier: 0,
        kind,
        note: String::new(),
        stress,
    }
}

#[tokio::test]
async fn action_keeps_the_highest_die() {
    let roller = DiceRoller::from_scripted(vec![2, 5, 1]);
    let res = roller
        .perform(&request(3, RollKind::default(), Some(0)))
        .await
        .unwrap();
    assert_eq!(res.rolls, vec![2, 5, 1]);
    assert_eq!(res.kept, 5);
    assert_eq!(res.outcome, Outcome::Partial);
    assert_eq!(res.reading, Reading::Outcome);
}

#[tokio::test]
async fn empty_pool_rolls_two_and_keeps_the_lowest() {
    let roller = DiceRoller::from_scripted(vec![6, 6]);
    let res = roller
        .perform(&request(-1, RollKind::Fortune, None))
        .await
        .unwrap();
    assert_eq!(res.rolls.len(), 2);
    assert_eq!(res.outcome, Outcome::Success);
}

#[tokio::test]
async fn resistance_costs_six_minus_highest() {
    let roller = DiceRoller::from_scripted(vec![4, 2, 6, 6]);
    let res = roller
        .perform(&request(2, RollKind::Resistance, Some(3)))
        .await
        .unwrap();
    assert_eq!(res.reading, Reading::StressCost { stress: 2 });

    let crit = roller
        .perform(&request(2, RollKind::Resistance, Some(3)))
        .await
        .unwrap();
    assert_eq!(crit.outcome, Outcome::Critical);
    assert_eq!(crit.reading, Reading::StressCost { stress: -1 });
}

#[tokio::test]
async fn vice_can_overindulge() {
    let roller = DiceRoller::from_scripted(vec![5]);
    let res = roller
        .perform(&request(1, RollKind::IndulgeVice, Some(3)))
        .await
        .unwrap();
    assert_eq!(
        res.reading,
        Reading::StressCleared {
            cleared: 5,
            overindulged: true
        }
    );
}

#[tokio::test]
async fn engagement_and_asset_readings() {
    let roller = DiceRoller::from_scripted(vec![3, 6, 6]);
    let engagement = roller
        .perform(&request(1, RollKind::Engagement { dice: 1 }, None))
        .await
        .unwrap();
    assert_eq!(
        engagement.reading,
        Reading::StartingPosition {
            position: Position::Desperate
        }
    );

    let asset = roller
        .perform(&request(2, RollKind::AcquireAsset { tier: 2 }, None))
        .await
        .unwrap();
    assert_eq!(asset.reading, Reading::AssetQuality { quality: 4 });
}

#[tokio::test]
async fn exhausted_script_is_a_failure() {
    let roller = DiceRoller::from_scripted(vec![1]);
    let err = roller
        .perform(&request(2, RollKind::Fortune, None))
        .await
        .unwrap_err();
    assert!(matches!(err, EvaluatorError::Rejected(_)));
}

struct Stalled;

#[async_trait]
impl RollEvaluator for Stalled {
    async fn perform(&self, _request: &RollRequest) -> Result<RollResult, EvaluatorError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(EvaluatorError::Rejected("unreachable".into()))
    }
}

#[tokio::test]
async fn timeout_bounds_a_stalled_evaluator() {
    let limit = Duration::from_millis(20);
    let err = with_timeout(Stalled, limit)
        .perform(&request(1, RollKind::Fortune, None))
        .await
        .unwrap_err();
    assert!(matches!(err, EvaluatorError::TimedOut(d) if d == limit));
}

#[tokio::test]
async fn timeout_passes_results_through() {
    let res = with_timeout(DiceRoller::from_seed(9), Duration::from_secs(5))
        .perform(&request(4, RollKind::GatherInfo, None))
        .await
        .unwrap();
    assert_eq!(res.rolls.len(), 4);
}
