//! End-to-end duel scenarios: authority worker, replication stream,
//! attacker-side prediction, and reconciliation.
//!
//! Tests run on a paused tokio clock; sleeps advance virtual time, so the
//! worker's tick loop fires deterministically.

use std::time::Duration;

use tokio::sync::broadcast;

use combat_core::ZeroHealthOutcome;
use combat_core::resolve::{HitEvent, Outcome};
use combat_core::state::{EntityId, SwingId};
use runtime::{
    CombatEvent, CombatTagUpdate, Event, Predictor, Reconciliation, Runtime, RuntimeError, Topic,
};

const ATTACKER: EntityId = EntityId(1);
const DEFENDER: EntityId = EntityId(2);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Feeds every buffered replication event into the predictor.
fn drain_replication(rx: &mut broadcast::Receiver<Event>, predictor: &mut Predictor) {
    while let Ok(event) = rx.try_recv() {
        if let Event::Replication(sync) = event {
            predictor.observe(&sync);
        }
    }
}

/// Collects every buffered combat event.
fn drain_combat(rx: &mut broadcast::Receiver<Event>) -> Vec<CombatEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Combat(combat) = event {
            events.push(combat);
        }
    }
    events
}

#[tokio::test(start_paused = true)]
async fn predicted_parry_is_confirmed_by_authority() {
    init_tracing();
    let rt = Runtime::builder().build();
    let handle = rt.handle();
    let mut replication = handle.subscribe(Topic::Replication);
    let mut combat = handle.subscribe(Topic::Combat);

    handle.join(ATTACKER).await.unwrap();
    handle.join(DEFENDER).await.unwrap();

    let t0 = handle.now().await.unwrap();
    handle.activate_block(DEFENDER).await.unwrap();

    // Let the machine reach its parry window and the facts replicate.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut predictor = Predictor::new(ATTACKER);
    drain_replication(&mut replication, &mut predictor);

    // Swing lands 100ms after activation, inside [t0+0.03, t0+0.3275).
    let (event, provisional) = predictor.predict_swing(DEFENDER, t0 + 0.10, true);
    assert_eq!(provisional.outcome, Outcome::Parried);
    assert!(!provisional.authoritative);

    let verdict = handle.submit_hit(event).await.unwrap();
    assert_eq!(verdict.outcome, Outcome::Parried);
    assert!(verdict.authoritative);
    assert_eq!(
        predictor.reconcile(&verdict),
        Some(Reconciliation::Confirmed {
            outcome: Outcome::Parried
        })
    );

    // No suspicion: the declared parry start came from real replicated facts.
    let events = drain_combat(&mut combat);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, CombatEvent::VerdictReached { verdict } if verdict.outcome == Outcome::Parried))
    );
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, CombatEvent::SuspiciousClaim { .. }))
    );

    drop(handle);
    rt.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stale_prediction_rolls_back_cosmetically() {
    init_tracing();
    let rt = Runtime::builder().build();
    let handle = rt.handle();

    handle.join(ATTACKER).await.unwrap();
    handle.join(DEFENDER).await.unwrap();

    let t0 = handle.now().await.unwrap();
    handle.activate_block(DEFENDER).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // This predictor never saw the defender's facts: it predicts a clean
    // hit, but the authority knows the swing landed in a parry window.
    let mut predictor = Predictor::new(ATTACKER);
    let (event, provisional) = predictor.predict_swing(DEFENDER, t0 + 0.10, true);
    assert_eq!(provisional.outcome, Outcome::Hit);

    let verdict = handle.submit_hit(event).await.unwrap();
    assert_eq!(verdict.outcome, Outcome::Parried);
    assert_eq!(
        predictor.reconcile(&verdict),
        Some(Reconciliation::CosmeticRollback {
            predicted: Outcome::Hit,
            actual: Outcome::Parried,
        })
    );

    drop(handle);
    rt.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn fabricated_parry_claim_is_downgraded_and_flagged() {
    init_tracing();
    let rt = Runtime::builder().build();
    let handle = rt.handle();
    let mut combat = handle.subscribe(Topic::Combat);

    handle.join(ATTACKER).await.unwrap();
    handle.join(DEFENDER).await.unwrap();

    let t0 = handle.now().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The defender never activated anything; the claim is impossible.
    let event = HitEvent {
        swing_id: SwingId(42),
        attacker: ATTACKER,
        target: DEFENDER,
        attack_timestamp: t0 + 0.02,
        declared_outcome: Outcome::Parried,
        declared_parry_start: Some(t0 + 0.01),
    };
    let verdict = handle.submit_hit(event).await.unwrap();
    assert_eq!(verdict.outcome, Outcome::Hit);

    let events = drain_combat(&mut combat);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, CombatEvent::SuspiciousClaim { swing_id, .. } if *swing_id == SwingId(42)))
    );

    // Re-delivery returns the cached verdict and publishes nothing new.
    let replay = handle.submit_hit(event).await.unwrap();
    assert_eq!(replay, verdict);
    assert!(
        !drain_combat(&mut combat)
            .iter()
            .any(|e| matches!(e, CombatEvent::VerdictReached { .. }))
    );

    drop(handle);
    rt.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn knockdown_recovery_and_immunity_flow() {
    init_tracing();
    let rt = Runtime::builder().build();
    let handle = rt.handle();
    let mut combat = handle.subscribe(Topic::Combat);

    handle.join(DEFENDER).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    // 40% prior health: knockdown, not death.
    let outcome = handle.report_zero_health(DEFENDER, 0.40).await.unwrap();
    let recover_at = match outcome {
        ZeroHealthOutcome::KnockedDown { recover_at } => recover_at,
        other => panic!("expected knockdown, got {other:?}"),
    };

    let events = drain_combat(&mut combat);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, CombatEvent::HealthClampRequired { entity } if *entity == DEFENDER))
    );
    assert!(
        events
            .iter()
            .any(|e| matches!(e, CombatEvent::KnockdownStarted { entity, .. } if *entity == DEFENDER))
    );

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.get(DEFENDER).unwrap().knocked_down);

    // Recovery fires after the 6s knockdown and grants immunity.
    tokio::time::sleep(Duration::from_secs(7)).await;
    let events = drain_combat(&mut combat);
    let immune_until = events
        .iter()
        .find_map(|e| match e {
            CombatEvent::KnockdownRecovered {
                entity,
                immune_until,
            } if *entity == DEFENDER => Some(*immune_until),
            _ => None,
        })
        .expect("recovery event");
    assert_eq!(immune_until, recover_at + 8.0);

    // Still immune shortly after recovery: clamp only.
    let outcome = handle.report_zero_health(DEFENDER, 0.05).await.unwrap();
    assert_eq!(outcome, ZeroHealthOutcome::ClampedByImmunity);

    // Once immunity lapses a fresh knockdown is permitted.
    tokio::time::sleep(Duration::from_secs(9)).await;
    let outcome = handle.report_zero_health(DEFENDER, 0.40).await.unwrap();
    assert!(matches!(outcome, ZeroHealthOutcome::KnockedDown { .. }));

    drop(handle);
    rt.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn disconnect_during_fight_awards_kill_credit() {
    init_tracing();
    let rt = Runtime::builder().build();
    let handle = rt.handle();
    let mut combat = handle.subscribe(Topic::Combat);
    let mut tag = handle.subscribe(Topic::Tag);

    handle.join(ATTACKER).await.unwrap();
    handle.join(DEFENDER).await.unwrap();

    let t0 = handle.now().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    // A clean hit tags both combatants.
    let event = HitEvent {
        swing_id: SwingId::compose(ATTACKER, 1),
        attacker: ATTACKER,
        target: DEFENDER,
        attack_timestamp: t0 + 0.01,
        declared_outcome: Outcome::Hit,
        declared_parry_start: None,
    };
    let verdict = handle.submit_hit(event).await.unwrap();
    assert_eq!(verdict.outcome, Outcome::Hit);

    // The periodic sweep pushes tag countdowns to the UI.
    tokio::time::sleep(Duration::from_secs(2)).await;
    let mut saw_countdown = false;
    while let Ok(event) = tag.try_recv() {
        if let Event::Tag(CombatTagUpdate { entity, remaining }) = event
            && entity == DEFENDER
        {
            assert!(remaining > 0.0 && remaining <= 30.0);
            saw_countdown = true;
        }
    }
    assert!(saw_countdown);

    // Leaving mid-tag counts as a death credited to the attacker.
    handle.leave(DEFENDER).await.unwrap();
    let events = drain_combat(&mut combat);
    assert!(events.iter().any(|e| matches!(
        e,
        CombatEvent::KillCredit { victim, attacker }
            if *victim == DEFENDER && *attacker == ATTACKER
    )));

    // A swing resolved after the defender left is a no-effect miss.
    let late = HitEvent {
        swing_id: SwingId::compose(ATTACKER, 2),
        attacker: ATTACKER,
        target: DEFENDER,
        attack_timestamp: t0 + 0.5,
        declared_outcome: Outcome::Hit,
        declared_parry_start: None,
    };
    let verdict = handle.submit_hit(late).await.unwrap();
    assert_eq!(verdict.outcome, Outcome::Miss);
    assert!(verdict.effects.is_empty());

    drop(handle);
    rt.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn activation_while_guardbroken_is_rejected() {
    init_tracing();
    let rt = Runtime::builder().build();
    let handle = rt.handle();

    handle.join(ATTACKER).await.unwrap();
    handle.join(DEFENDER).await.unwrap();

    let t0 = handle.now().await.unwrap();
    handle.activate_block(DEFENDER).await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    // Seven blocked hits saturate the 100-point meter at 15 each.
    for i in 0..7u32 {
        let event = HitEvent {
            swing_id: SwingId::compose(ATTACKER, i + 1),
            attacker: ATTACKER,
            target: DEFENDER,
            attack_timestamp: t0 + 0.55,
            declared_outcome: Outcome::Blocked,
            declared_parry_start: None,
        };
        handle.submit_hit(event).await.unwrap();
    }

    let err = handle.activate_block(DEFENDER).await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Activation(combat_core::ActivationError::Guardbroken { .. })
    ));

    // Guardbreak expires after 1.5s; the machine is engageable again.
    tokio::time::sleep(Duration::from_secs(2)).await;
    handle.activate_block(DEFENDER).await.unwrap();

    drop(handle);
    rt.shutdown().await.unwrap();
}
