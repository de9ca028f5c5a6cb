//! Match throughput benchmarks
//!
//! Plays whole matches between zero and random controllers with no tick
//! interval, measuring `update()` plus input servicing per match. Run with
//! `--no-default-features` to measure without verbose log formatting.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mtg_rules_engine::{
    core::EntityId,
    game::{tick, InputSource, Match, RandomController, VerbosityLevel, ZeroController},
    loader::{CardDatabase, DeckList, DeckLoader, MatchInitializer},
    MatchConfig,
};

const BEAR_DECK: &str = "[Main]\n20 Forest\n16 Grizzly Bears\n4 Llanowar Elves\n";
const BOLT_DECK: &str = "[Main]\n18 Mountain\n12 Lightning Bolt\n6 Hill Giant\n4 Gray Ogre\n";

fn new_match(db: &CardDatabase, deck: &DeckList, seed: u64) -> Match {
    let config = MatchConfig {
        seed: Some(seed),
        max_turns: Some(100),
        ..MatchConfig::default()
    };
    let mut game = MatchInitializer::new(db)
        .init_match(config, [deck, deck])
        .expect("deck loads");
    game.logger.set_verbosity(VerbosityLevel::Silent);
    game
}

fn play(mut game: Match, mut sources: Vec<Box<dyn InputSource>>) -> u32 {
    while !game.is_finished() {
        tick(&mut game, &mut sources).expect("match runs");
    }
    game.turn_number
}

fn bench_zero_vs_zero(c: &mut Criterion) {
    let db = CardDatabase::builtin();
    let mut group = c.benchmark_group("zero_vs_zero");

    for (label, text) in [("bears", BEAR_DECK), ("bolts", BOLT_DECK)] {
        let deck = DeckLoader::parse(text).expect("deck parses");
        group.bench_with_input(BenchmarkId::from_parameter(label), &deck, |b, deck| {
            b.iter(|| {
                let game = new_match(&db, deck, 42);
                let sources: Vec<Box<dyn InputSource>> = vec![
                    Box::new(ZeroController::new(EntityId::new(0))),
                    Box::new(ZeroController::new(EntityId::new(1))),
                ];
                black_box(play(game, sources))
            });
        });
    }
    group.finish();
}

fn bench_random_vs_random(c: &mut Criterion) {
    let db = CardDatabase::builtin();
    let deck = DeckLoader::parse(BEAR_DECK).expect("deck parses");
    let mut seed = 0u64;

    c.bench_function("random_vs_random/bears", |b| {
        b.iter(|| {
            seed += 1;
            let game = new_match(&db, &deck, seed);
            let sources: Vec<Box<dyn InputSource>> = vec![
                Box::new(RandomController::with_seed(EntityId::new(0), seed)),
                Box::new(RandomController::with_seed(EntityId::new(1), seed ^ 0xff)),
            ];
            black_box(play(game, sources))
        });
    });
}

criterion_group!(benches, bench_zero_vs_zero, bench_random_vs_random);
criterion_main!(benches);
