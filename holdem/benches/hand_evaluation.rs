use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use holdem::{
    Action, GameSettings, PlayerId, Stage, TableSession,
    entities::{Card, Deck, Suit},
    functional::{argmax, evaluate},
};
use std::hint::black_box;

/// Seat `n_players` and deal the first hand.
fn setup_table(n_players: usize) -> (TableSession, Vec<PlayerId>) {
    let settings = GameSettings::new(n_players, 1000, 5, 10).with_seed(17);
    let mut session = TableSession::from(settings);
    let ids: Vec<PlayerId> = (0..n_players)
        .map(|i| PlayerId::new(&format!("player{i}")))
        .collect();
    for id in &ids {
        session.join(id.clone(), id.as_str()).unwrap();
    }
    session.request_start(&ids[0]).unwrap();
    (session, ids)
}

/// Benchmark hand evaluation with 5 cards
fn bench_evaluate_5_cards(c: &mut Criterion) {
    let cards = vec![
        Card(14, Suit::Spade),
        Card(13, Suit::Spade),
        Card(12, Suit::Heart),
        Card(11, Suit::Club),
        Card(9, Suit::Diamond),
    ];

    c.bench_function("evaluate_5_cards", |b| {
        b.iter(|| evaluate(black_box(&cards)));
    });
}

/// Benchmark hand evaluation with 7 cards (hole cards + board)
fn bench_evaluate_7_cards(c: &mut Criterion) {
    let cards = vec![
        Card(14, Suit::Spade),
        Card(13, Suit::Spade),
        Card(12, Suit::Spade),
        Card(11, Suit::Spade),
        Card(10, Suit::Spade),
        Card(2, Suit::Heart),
        Card(3, Suit::Diamond),
    ];

    c.bench_function("evaluate_7_cards", |b| {
        b.iter(|| evaluate(black_box(&cards)));
    });
}

/// Benchmark evaluating a batch of shuffled seven-card hands
fn bench_evaluate_100_hands(c: &mut Criterion) {
    let hands: Vec<Vec<Card>> = (0..100)
        .map(|seed| Deck::shuffled(Some(seed)).draw(7).unwrap())
        .collect();

    c.bench_function("evaluate_100_hands", |b| {
        b.iter(|| {
            for hand in &hands {
                let _ = evaluate(black_box(hand));
            }
        });
    });
}

/// Benchmark picking the winners out of a table's worth of hands
fn bench_argmax(c: &mut Criterion) {
    let mut group = c.benchmark_group("argmax");

    for n_hands in [2, 6, 10] {
        let ranks: Vec<_> = (0..n_hands)
            .map(|seed| evaluate(&Deck::shuffled(Some(seed)).draw(7).unwrap()).unwrap())
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(n_hands), &ranks, |b, ranks| {
            b.iter(|| argmax(black_box(ranks)));
        });
    }

    group.finish();
}

/// Benchmark building the snapshot sent to each subscriber
fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_for");

    for n_players in [2, 6, 10] {
        let (session, ids) = setup_table(n_players);
        group.bench_with_input(BenchmarkId::from_parameter(n_players), &n_players, |b, _| {
            b.iter(|| session.snapshot_for(black_box(&ids[0])));
        });
    }

    group.finish();
}

/// Benchmark a whole checked-down hand through showdown
fn bench_full_hand(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_hand");

    for n_players in [2, 6, 10] {
        group.bench_with_input(BenchmarkId::from_parameter(n_players), &n_players, |b, &n| {
            b.iter(|| {
                let (mut session, _) = setup_table(n);
                while let Some(id) = session.current_turn().cloned() {
                    session.apply_action(&id, Action::Call).unwrap();
                }
                for stage in [Stage::Flop, Stage::Turn, Stage::River] {
                    session.deal(stage).unwrap();
                    while let Some(id) = session.current_turn().cloned() {
                        session.apply_action(&id, Action::Check).unwrap();
                    }
                }
                session.resolve_showdown().unwrap();
                session
            });
        });
    }

    group.finish();
}

criterion_group!(
    hand_evaluation,
    bench_evaluate_5_cards,
    bench_evaluate_7_cards,
    bench_evaluate_100_hands,
    bench_argmax,
);

criterion_group!(table_operations, bench_snapshot, bench_full_hand);

criterion_main!(hand_evaluation, table_operations);
