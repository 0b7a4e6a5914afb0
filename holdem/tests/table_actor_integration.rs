//! Integration tests for the table actor
//!
//! These tests run real actors on the Tokio runtime and talk to them only
//! through `TableHandle`, the way the server does.

use std::time::Duration;

use holdem::{
    Action, ClientEvent, GameError, InvalidTransition, PlayerId, Stage, StartOutcome,
    table::{TableActor, TableConfig, TableError, TableEvent, TableHandle},
};
use tokio::{sync::mpsc, time::timeout};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

fn spawn(config: TableConfig) -> TableHandle {
    let (actor, handle) = TableActor::new(7, config);
    tokio::spawn(actor.run());
    handle
}

fn heads_up_config(action_timeout_ms: Option<u64>) -> TableConfig {
    TableConfig {
        name: "heads up".to_string(),
        max_players: 2,
        deck_seed: Some(11),
        action_timeout_ms,
        ..Default::default()
    }
}

async fn seat_two(handle: &TableHandle) -> (PlayerId, PlayerId) {
    let alice = PlayerId::new("alice-conn");
    let bob = PlayerId::new("bob-conn");
    handle.join(alice.clone(), "alice".to_string()).await.unwrap();
    handle.join(bob.clone(), "bob".to_string()).await.unwrap();
    (alice, bob)
}

/// Wait for the next game update matching `predicate`, skipping others.
async fn wait_for_update(
    rx: &mut mpsc::Receiver<TableEvent>,
    predicate: impl Fn(&holdem::TableSnapshot) -> bool,
) -> holdem::TableSnapshot {
    loop {
        let event = timeout(RECV_TIMEOUT, rx.recv())
            .await
            .expect("timed out waiting for update")
            .expect("table hung up");
        if let TableEvent::GameUpdate(snapshot) = event
            && predicate(&snapshot)
        {
            return *snapshot;
        }
    }
}

#[tokio::test]
async fn test_idle_player_is_folded_after_timeout() {
    let handle = spawn(heads_up_config(Some(50)));
    let (alice, bob) = seat_two(&handle).await;

    let (tx, mut rx) = mpsc::channel(64);
    handle.subscribe(bob.clone(), tx).await.unwrap();

    handle.request_start(alice.clone()).await.unwrap();
    // Alice is on the button and acts first, then never does.
    let snapshot = wait_for_update(&mut rx, |s| s.stage == Stage::HandComplete).await;

    let folded = snapshot.players.iter().find(|p| p.id == alice).unwrap();
    assert!(folded.folded);
    assert_eq!(snapshot.winners.len(), 1);
    assert_eq!(snapshot.winners[0].player_id, bob);
    assert_eq!(snapshot.winners[0].amount, 15);
}

#[tokio::test]
async fn test_acting_in_time_cancels_the_fold() {
    let handle = spawn(heads_up_config(Some(300)));
    let (alice, bob) = seat_two(&handle).await;

    handle.request_start(alice.clone()).await.unwrap();
    handle.take_action(alice.clone(), Action::Call).await.unwrap();
    handle.take_action(bob.clone(), Action::Check).await.unwrap();

    // Well past both deadlines; nobody holds the turn so nothing may fire.
    tokio::time::sleep(Duration::from_millis(600)).await;

    let snapshot = handle.snapshot(None).await.unwrap();
    assert_eq!(snapshot.stage, Stage::PreFlop);
    assert!(snapshot.current_turn.is_none());
    assert!(snapshot.players.iter().all(|p| !p.folded));
    assert_eq!(snapshot.pot_total, 20);
}

#[tokio::test]
async fn test_no_timeout_waits_forever() {
    let handle = spawn(heads_up_config(None));
    let (alice, _) = seat_two(&handle).await;
    handle.request_start(alice.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let snapshot = handle.snapshot(None).await.unwrap();
    assert_eq!(snapshot.current_turn, Some(alice));
}

#[tokio::test]
async fn test_restart_vote_is_broadcast() {
    let handle = spawn(heads_up_config(None));
    let (alice, bob) = seat_two(&handle).await;

    handle.request_start(alice.clone()).await.unwrap();
    handle.take_action(alice.clone(), Action::Fold).await.unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    handle.subscribe(alice.clone(), tx).await.unwrap();

    assert_eq!(
        handle.request_start(bob.clone()).await.unwrap(),
        StartOutcome::VoteOpened
    );
    handle.respond_start(alice.clone(), true).await.unwrap();

    let mut saw_request = false;
    let mut saw_ballot = false;
    while !(saw_request && saw_ballot) {
        let event = timeout(RECV_TIMEOUT, rx.recv()).await.unwrap().unwrap();
        match event {
            TableEvent::StartGameRequest { requester } => {
                assert_eq!(requester, bob);
                saw_request = true;
            }
            TableEvent::RestartVoteRecorded { player_id, accept } => {
                assert_eq!(player_id, alice);
                assert!(accept);
                saw_ballot = true;
            }
            TableEvent::GameUpdate(_) => {}
        }
    }

    let snapshot = wait_for_update(&mut rx, |s| s.hand_number == 2).await;
    assert_eq!(snapshot.stage, Stage::PreFlop);
}

#[tokio::test]
async fn test_aborted_deal_is_broadcast() {
    // Too many seats for one deck of hole cards.
    let handle = spawn(TableConfig {
        name: "crowded".to_string(),
        max_players: 27,
        starting_stack: 100,
        small_blind: 5,
        big_blind: 10,
        deck_seed: Some(5),
        ..Default::default()
    });
    let ids: Vec<PlayerId> = (0..27).map(|i| PlayerId::new(&format!("conn-{i}"))).collect();
    for (i, id) in ids.iter().enumerate() {
        handle.join(id.clone(), format!("p{i}")).await.unwrap();
    }

    let (tx, mut rx) = mpsc::channel(64);
    handle.subscribe(ids[1].clone(), tx).await.unwrap();

    let err = handle.request_start(ids[0].clone()).await.unwrap_err();
    assert!(matches!(
        err,
        TableError::Game(GameError::DeckExhausted { .. })
    ));

    // The aborted hand still counts, so this skips the pre-start views.
    let snapshot = wait_for_update(&mut rx, |s| s.hand_number == 1).await;
    assert_eq!(snapshot.stage, Stage::Lobby);
    assert_eq!(snapshot.pot_total, 0);
    assert!(snapshot.current_turn.is_none());
    assert!(snapshot.players.iter().all(|p| p.chips == 100));
}

#[tokio::test]
async fn test_dispatch_routes_client_events() {
    let handle = spawn(heads_up_config(None));
    let alice = PlayerId::new("a");
    let bob = PlayerId::new("b");

    for (id, name) in [(&alice, "alice"), (&bob, "bob")] {
        handle
            .dispatch(
                id,
                ClientEvent::JoinGame {
                    name: name.to_string(),
                },
            )
            .await
            .unwrap();
    }
    handle
        .dispatch(&alice, ClientEvent::RequestStartGame {})
        .await
        .unwrap();

    let err = handle
        .dispatch(&alice, ClientEvent::DealFlop {})
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TableError::Game(GameError::InvalidTransition(
            InvalidTransition::RoundInProgress
        ))
    );

    handle
        .dispatch(&alice, ClientEvent::Bet(Action::Call))
        .await
        .unwrap();
    handle
        .dispatch(&bob, ClientEvent::Bet(Action::Check))
        .await
        .unwrap();
    handle
        .dispatch(&bob, ClientEvent::DealFlop {})
        .await
        .unwrap();

    let snapshot = handle.snapshot(Some(bob.clone())).await.unwrap();
    assert_eq!(snapshot.stage, Stage::Flop);
    assert_eq!(snapshot.board.len(), 3);
}

#[tokio::test]
async fn test_dropped_subscriber_is_forgotten() {
    let handle = spawn(heads_up_config(None));
    let (tx, rx) = mpsc::channel(4);
    handle.subscribe(PlayerId::new("gone"), tx).await.unwrap();
    drop(rx);

    // Further mutations must not fail because a receiver went away.
    let (alice, _) = seat_two(&handle).await;
    handle.request_start(alice).await.unwrap();
    assert_eq!(handle.summary().await.unwrap().hand_number, 1);
}

#[tokio::test]
async fn test_closed_table_rejects_requests() {
    let handle = spawn(heads_up_config(None));
    handle.close().await.unwrap();
    assert_eq!(
        handle.snapshot(None).await.unwrap_err(),
        TableError::Closed(7)
    );
}
