//! Deck fixture tests
//!
//! One test per `.dck` file in `test_decks/`, generated by `dir-test`. Each
//! deck must parse, load against the built-in card database and play a short
//! match to the end between two zero controllers.

use dir_test::{dir_test, Fixture};
use mtg_rules_engine::core::EntityId;
use mtg_rules_engine::game::{tick, InputSource, ZeroController};
use mtg_rules_engine::loader::{CardDatabase, DeckLoader, MatchInitializer};
use mtg_rules_engine::MatchConfig;
use similar_asserts::assert_eq;

#[dir_test(
    dir: "$CARGO_MANIFEST_DIR/test_decks",
    glob: "**/*.dck",
)]
fn test_deck_plays_out(fixture: Fixture<&str>) {
    let deck = DeckLoader::parse(fixture.content())
        .unwrap_or_else(|e| panic!("{} failed to parse: {e}", fixture.path()));
    assert!(deck.name.is_some(), "{} has no Name= line", fixture.path());
    assert_eq!(deck.total_cards(), 40, "{} should be a 40-card deck", fixture.path());

    let db = CardDatabase::builtin();
    for entry in deck.main_deck.iter().chain(&deck.sideboard) {
        assert!(
            db.contains(&entry.card_name),
            "{} uses unknown card {}",
            fixture.path(),
            entry.card_name
        );
    }

    let config = MatchConfig {
        seed: Some(42),
        max_turns: Some(40),
        ..MatchConfig::default()
    };
    let mut game = MatchInitializer::new(&db)
        .init_match(config, [&deck, &deck])
        .unwrap();
    game.logger.enable_capture();

    let mut sources: Vec<Box<dyn InputSource>> = vec![
        Box::new(ZeroController::new(EntityId::new(0))),
        Box::new(ZeroController::new(EntityId::new(1))),
    ];
    for _ in 0..500_000 {
        if game.is_finished() {
            break;
        }
        tick(&mut game, &mut sources).unwrap();
    }

    assert!(game.is_finished(), "{} never finished", fixture.path());
    assert!(game.result().unwrap().turns_played <= 40);
}

#[test]
fn test_deck_file_matches_inline_parse() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/test_decks/grizzly_forest.dck");
    let from_file = DeckLoader::load_from_file(std::path::Path::new(path)).unwrap();
    let inline = DeckLoader::parse(
        "Name=Grizzly Forest\n[Main]\n20 Forest\n16 Grizzly Bears\n4 Llanowar Elves\n",
    )
    .unwrap();
    assert_eq!(from_file, inline);
}
