//! Integration tests for game flow scenarios
//!
//! These tests drive a `TableSession` through whole hands: seating, blinds,
//! betting rounds, showdown, restart votes and the snapshots clients see.

use holdem::{
    Action, GameError, GameSettings, IllegalAction, InvalidTransition, PlayerId, Stage,
    StartOutcome, TableSession,
    game::{betting::RoundStatus, restart::VoteProgress},
};
use proptest::prelude::*;

fn table(settings: GameSettings, names: &[&str]) -> (TableSession, Vec<PlayerId>) {
    let mut session = TableSession::from(settings);
    let ids: Vec<PlayerId> = names.iter().map(|name| PlayerId::new(name)).collect();
    for (id, name) in ids.iter().zip(names) {
        session.join(id.clone(), name).unwrap();
    }
    (session, ids)
}

fn three_handed() -> (TableSession, Vec<PlayerId>) {
    table(GameSettings::default().with_seed(42), &["alice", "bob", "carol"])
}

fn chips(session: &TableSession, id: &PlayerId) -> u32 {
    session.player(id).unwrap().chips
}

fn check_around(session: &mut TableSession) {
    while let Some(id) = session.current_turn().cloned() {
        session.apply_action(&id, Action::Check).unwrap();
    }
}

#[test]
fn test_first_hand_posts_blinds_and_deals() {
    let (mut session, ids) = three_handed();
    assert_eq!(
        session.request_start(&ids[0]).unwrap(),
        StartOutcome::HandStarted
    );

    let snapshot = session.snapshot();
    assert_eq!(snapshot.stage, Stage::PreFlop);
    assert_eq!(snapshot.hand_number, 1);
    assert_eq!(snapshot.dealer.as_ref(), Some(&ids[0]));
    assert_eq!(snapshot.pot_total, 15);
    assert_eq!(snapshot.highest_bet, 10);
    // Under the gun is the seat after the big blind, which wraps to the button.
    assert_eq!(snapshot.current_turn.as_ref(), Some(&ids[0]));
    assert_eq!(chips(&session, &ids[1]), 995);
    assert_eq!(chips(&session, &ids[2]), 990);
    assert!(session.players().iter().all(|p| p.cards.len() == 2));
}

#[test]
fn test_fold_to_one_awards_pot_without_showdown() {
    let (mut session, ids) = three_handed();
    session.request_start(&ids[0]).unwrap();

    session.apply_action(&ids[0], Action::Fold).unwrap();
    let status = session.apply_action(&ids[1], Action::Fold).unwrap();
    assert_eq!(status, RoundStatus::HandWon(2));

    assert_eq!(session.stage(), Stage::HandComplete);
    assert_eq!(chips(&session, &ids[2]), 1005);
    assert_eq!(chips(&session, &ids[1]), 995);
    assert_eq!(session.total_chips(), 3000);

    let winners = session.winners();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].player_id, ids[2]);
    assert_eq!(winners[0].amount, 15);
    assert!(winners[0].hand.is_none());

    // Nobody had to show.
    let snapshot = session.snapshot();
    assert!(snapshot.players.iter().all(|p| p.cards.is_empty()));
    assert!(session.board().is_empty());
}

#[test]
fn test_out_of_turn_action_changes_nothing() {
    let (mut session, ids) = three_handed();
    session.request_start(&ids[0]).unwrap();

    let before = serde_json::to_string(&session.snapshot()).unwrap();
    let version = session.version();

    let err = session.apply_action(&ids[1], Action::Call).unwrap_err();
    assert_eq!(err, GameError::IllegalAction(IllegalAction::OutOfTurn));

    let err = session
        .apply_action(&ids[0], Action::Raise { amount: 15 })
        .unwrap_err();
    assert_eq!(
        err,
        GameError::IllegalAction(IllegalAction::RaiseTooSmall { min: 20 })
    );

    let err = session
        .apply_action(&ids[0], Action::Raise { amount: 5000 })
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::IllegalAction(IllegalAction::InsufficientFunds { .. })
    ));

    assert_eq!(serde_json::to_string(&session.snapshot()).unwrap(), before);
    assert_eq!(session.version(), version);
}

#[test]
fn test_check_down_to_showdown() {
    let (mut session, ids) = three_handed();
    session.request_start(&ids[0]).unwrap();

    session.apply_action(&ids[0], Action::Call).unwrap();
    session.apply_action(&ids[1], Action::Call).unwrap();
    let status = session.apply_action(&ids[2], Action::Check).unwrap();
    assert_eq!(status, RoundStatus::RoundComplete);

    // Streets can't be skipped.
    let err = session.deal(Stage::Turn).unwrap_err();
    assert_eq!(
        err,
        GameError::InvalidTransition(InvalidTransition::WrongStage {
            current: Stage::PreFlop,
            requested: Stage::Turn,
        })
    );

    for (stage, board) in [(Stage::Flop, 3), (Stage::Turn, 4), (Stage::River, 5)] {
        assert_eq!(session.deal(stage).unwrap(), stage);
        assert_eq!(session.board().len(), board);
        // Post-flop action starts left of the button.
        assert_eq!(session.current_turn(), Some(&ids[1]));
        check_around(&mut session);
    }

    session.resolve_showdown().unwrap();
    assert_eq!(session.stage(), Stage::HandComplete);
    assert_eq!(session.total_chips(), 3000);
    assert!(session.ledger().is_empty());

    let won: u32 = session.winners().iter().map(|w| w.amount).sum();
    assert_eq!(won, 30);
    assert!(session.winners().iter().all(|w| w.hand.is_some()));

    // Hands that went to showdown are shown to everyone.
    let snapshot = session.snapshot();
    assert!(snapshot.players.iter().all(|p| p.cards.len() == 2));
}

#[test]
fn test_showdown_before_river_is_rejected() {
    let (mut session, ids) = three_handed();
    session.request_start(&ids[0]).unwrap();
    let err = session.resolve_showdown().unwrap_err();
    assert_eq!(
        err,
        GameError::InvalidTransition(InvalidTransition::NotAtShowdown)
    );
}

#[test]
fn test_all_in_runs_out_the_board() {
    let (mut session, ids) = table(
        GameSettings::new(2, 100, 5, 10).with_seed(3),
        &["alice", "bob"],
    );
    session.request_start(&ids[0]).unwrap();

    // Heads-up the button posts the small blind and acts first.
    assert_eq!(session.current_turn(), Some(&ids[0]));
    session.apply_action(&ids[0], Action::AllIn).unwrap();
    let status = session.apply_action(&ids[1], Action::Call).unwrap();
    assert_eq!(status, RoundStatus::RoundComplete);

    for stage in [Stage::Flop, Stage::Turn, Stage::River] {
        session.deal(stage).unwrap();
        assert!(session.current_turn().is_none());
    }
    session.resolve_showdown().unwrap();

    assert_eq!(session.total_chips(), 200);
    let won: u32 = session.winners().iter().map(|w| w.amount).sum();
    assert_eq!(won, 200);
}

#[test]
fn test_restart_requires_unanimous_consent() {
    let (mut session, ids) = three_handed();
    session.request_start(&ids[0]).unwrap();
    session.apply_action(&ids[0], Action::Fold).unwrap();
    session.apply_action(&ids[1], Action::Fold).unwrap();
    let first_hand: Vec<_> = session.players().iter().map(|p| p.cards.clone()).collect();

    // One rejection declines the proposal.
    assert_eq!(
        session.request_start(&ids[0]).unwrap(),
        StartOutcome::VoteOpened
    );
    assert_eq!(
        session.respond_start(&ids[1], false).unwrap(),
        VoteProgress::Declined
    );
    assert_eq!(session.stage(), Stage::HandComplete);
    assert_eq!(session.hand_number(), 1);
    assert!(!session.restart_vote().is_open());
    assert_eq!(
        session.respond_start(&ids[2], true).unwrap_err(),
        GameError::InvalidTransition(InvalidTransition::NoVoteOpen)
    );

    // Everyone agreeing deals the next hand.
    assert_eq!(
        session.request_start(&ids[2]).unwrap(),
        StartOutcome::VoteOpened
    );
    assert_eq!(
        session.request_start(&ids[0]).unwrap_err(),
        GameError::InvalidTransition(InvalidTransition::VoteInProgress)
    );
    assert_eq!(
        session.respond_start(&ids[0], true).unwrap(),
        VoteProgress::Pending
    );
    assert_eq!(
        session.respond_start(&ids[0], true).unwrap_err(),
        GameError::IllegalAction(IllegalAction::AlreadyVoted)
    );
    assert_eq!(
        session.respond_start(&ids[1], true).unwrap(),
        VoteProgress::Approved
    );

    assert_eq!(session.stage(), Stage::PreFlop);
    assert_eq!(session.hand_number(), 2);
    assert_eq!(session.snapshot().dealer.as_ref(), Some(&ids[1]));

    // Stacks carried over: carol posts the small blind, alice the big.
    assert_eq!(chips(&session, &ids[0]), 990);
    assert_eq!(chips(&session, &ids[1]), 995);
    assert_eq!(chips(&session, &ids[2]), 1000);
    assert_eq!(session.total_chips(), 3000);

    let second_hand: Vec<_> = session.players().iter().map(|p| p.cards.clone()).collect();
    assert_ne!(first_hand, second_hand);
}

#[test]
fn test_join_rejected_once_playing() {
    let (mut session, ids) = three_handed();
    session.request_start(&ids[0]).unwrap();
    assert_eq!(
        session.join(PlayerId::new("dave"), "dave").unwrap_err(),
        GameError::AlreadyStarted
    );
}

#[test]
fn test_seeded_tables_serialize_identically() {
    let script = |session: &mut TableSession, ids: &[PlayerId]| {
        session.request_start(&ids[0]).unwrap();
        session.apply_action(&ids[0], Action::Raise { amount: 30 }).unwrap();
        session.apply_action(&ids[1], Action::Call).unwrap();
        session.apply_action(&ids[2], Action::Fold).unwrap();
        session.deal(Stage::Flop).unwrap();
    };

    let (mut a, ids) = three_handed();
    let (mut b, _) = three_handed();
    script(&mut a, &ids);
    script(&mut b, &ids);

    assert_eq!(
        serde_json::to_string(&a.snapshot()).unwrap(),
        serde_json::to_string(&b.snapshot()).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&a.snapshot_for(&ids[1])).unwrap(),
        serde_json::to_string(&b.snapshot_for(&ids[1])).unwrap()
    );
}

#[test]
fn test_private_snapshot_shows_only_own_cards() {
    let (mut session, ids) = three_handed();
    session.request_start(&ids[0]).unwrap();

    let view = session.snapshot_for(&ids[1]);
    for player in &view.players {
        if player.id == ids[1] {
            assert_eq!(player.cards.len(), 2);
        } else {
            assert!(player.cards.is_empty());
        }
    }
}

#[test]
fn test_running_out_of_hole_cards_refunds_and_returns_to_lobby() {
    // 27 seats need 54 hole cards.
    let names: Vec<String> = (0..27).map(|i| format!("p{i}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let (mut session, ids) = table(GameSettings::new(30, 100, 5, 10).with_seed(3), &names);
    let version = session.version();

    let err = session.request_start(&ids[0]).unwrap_err();
    assert!(matches!(err, GameError::DeckExhausted { .. }));

    assert_eq!(session.stage(), Stage::Lobby);
    assert!(session.version() > version);
    assert!(session.current_turn().is_none());
    assert_eq!(session.total_chips(), 2700);
    for id in &ids {
        assert_eq!(chips(&session, id), 100);
    }

    let snapshot = session.snapshot();
    assert_eq!(snapshot.pot_total, 0);
    assert!(snapshot.board.is_empty());
    assert!(snapshot.players.iter().all(|p| p.round_bet == 0 && p.cards.is_empty()));
}

fn pick_action(choice: u8, extra: u32, session: &TableSession, id: &PlayerId) -> Action {
    let round = session.round().unwrap();
    match choice {
        0 => Action::Fold,
        1 => Action::Check,
        2 => Action::Call,
        3 => Action::AllIn,
        _ => {
            let base = round.highest_bet + round.min_raise;
            let stack = session.player(id).map_or(0, |p| p.chips + p.round_bet);
            Action::Raise {
                amount: (base + extra).min(stack.max(base)),
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_chips_are_conserved(
        moves in prop::collection::vec((0u8..5, 0u32..60), 1..300),
        seed in any::<u64>(),
    ) {
        let (mut session, ids) = table(
            GameSettings::new(4, 200, 5, 10).with_seed(seed),
            &["a", "b", "c", "d"],
        );
        session.request_start(&ids[0]).unwrap();

        for (choice, extra) in moves {
            match session.stage() {
                Stage::HandComplete => {
                    let funded = ids
                        .iter()
                        .find(|id| session.player(id).is_some_and(|p| p.chips > 0));
                    let Some(requester) = funded else {
                        break;
                    };
                    if session.request_start(requester).is_err() {
                        break;
                    }
                    for id in &ids {
                        if session.stage() != Stage::HandComplete {
                            break;
                        }
                        if id != requester {
                            session.respond_start(id, true).unwrap();
                        }
                    }
                }
                Stage::Showdown => session.resolve_showdown().unwrap(),
                stage if session.is_round_complete() => {
                    let next = stage.next().unwrap();
                    session.deal(next).unwrap();
                }
                _ => {
                    let id = session.current_turn().cloned().unwrap();
                    let version = session.version();
                    let action = pick_action(choice, extra, &session, &id);
                    if session.apply_action(&id, action).is_err() {
                        prop_assert_eq!(session.version(), version);
                    }
                }
            }
            prop_assert_eq!(session.total_chips(), 800);
            if let Some(round) = session.round() {
                let deepest = session.players().iter().map(|p| p.round_bet).max().unwrap_or(0);
                prop_assert!(round.highest_bet >= deepest);
            }
        }
    }
}
