//! MTG Rules Engine - Main Binary
//!
//! Runs two-player matches between automated controllers at a fixed tick rate

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use mtg_rules_engine::{
    core::{EntityId, PlayerId},
    game::{
        tick, InputSource, Match, MatchSnapshot, MatchView, OutputFormat, RandomController,
        VerbosityLevel, ZeroController,
    },
    loader::{CardDatabase, DeckList, DeckLoader, MatchInitializer},
    MatchConfig,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Controller type for each seat
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ControllerType {
    /// Always chooses the first legal intent (for testing)
    Zero,
    /// Makes random choices
    Random,
}

#[derive(Parser)]
#[command(name = "mtg-rules")]
#[command(about = "Two-player Magic: The Gathering rules engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one match between two controllers
    Play {
        /// Deck file (.dck) for player 1
        #[arg(value_name = "PLAYER1_DECK")]
        deck1: PathBuf,

        /// Deck file (.dck) for player 2
        #[arg(value_name = "PLAYER2_DECK")]
        deck2: PathBuf,

        /// Player 1 controller type
        #[arg(long, value_enum, default_value = "random")]
        p1: ControllerType,

        /// Player 2 controller type
        #[arg(long, value_enum, default_value = "random")]
        p2: ControllerType,

        /// Player 1 name (overrides the config file)
        #[arg(long)]
        p1_name: Option<String>,

        /// Player 2 name (overrides the config file)
        #[arg(long)]
        p2_name: Option<String>,

        /// Match configuration file (JSON)
        #[arg(long, value_name = "CONFIG_FILE")]
        config: Option<PathBuf>,

        /// Set random seed for deterministic matches
        #[arg(long)]
        seed: Option<u64>,

        /// Milliseconds between ticks (0 runs as fast as possible)
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Stop after this many turns
        #[arg(long)]
        max_turns: Option<u32>,

        /// Verbosity level for match output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityLevel,

        /// Print log entries as JSON lines
        #[arg(long)]
        json_logs: bool,

        /// Buffer the log and print only the last N entries when the match ends
        #[arg(long, value_name = "LINES")]
        log_tail: Option<usize>,

        /// Write a JSON snapshot of the final state to this file
        #[arg(long, value_name = "FILE")]
        snapshot_output: Option<PathBuf>,
    },

    /// Run matches back to back for profiling
    Profile {
        /// Number of matches to run
        #[arg(long, short = 'g', default_value_t = 100)]
        games: usize,

        /// Base seed; match N uses seed + N
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Deck file to use (uses same deck for both players)
        #[arg(long, short = 'd', default_value = "test_decks/grizzly_forest.dck")]
        deck: PathBuf,
    },

    /// List the built-in cards
    Cards,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            deck1,
            deck2,
            p1,
            p2,
            p1_name,
            p2_name,
            config,
            seed,
            tick_ms,
            max_turns,
            verbosity,
            json_logs,
            log_tail,
            snapshot_output,
        } => {
            let mut config = match config {
                Some(path) => MatchConfig::load_from_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => MatchConfig::default(),
            };
            if let Some(name) = p1_name {
                config.player_names[0] = name;
            }
            if let Some(name) = p2_name {
                config.player_names[1] = name;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            if max_turns.is_some() {
                config.max_turns = max_turns;
            }
            let interval_ms = tick_ms.unwrap_or(config.tick_interval_ms);

            let options = PlayOptions {
                controllers: [p1, p2],
                verbosity,
                json_logs,
                log_tail,
                interval_ms,
                snapshot_output,
            };
            run_play(&deck1, &deck2, config, options).await?
        }
        Commands::Profile { games, seed, deck } => run_profile(games, seed, &deck)?,
        Commands::Cards => {
            let db = CardDatabase::builtin();
            for name in db.card_names() {
                println!("{name}");
            }
        }
    }

    Ok(())
}

struct PlayOptions {
    controllers: [ControllerType; 2],
    verbosity: VerbosityLevel,
    json_logs: bool,
    log_tail: Option<usize>,
    interval_ms: u64,
    snapshot_output: Option<PathBuf>,
}

fn load_deck(path: &Path) -> anyhow::Result<DeckList> {
    DeckLoader::load_from_file(path).with_context(|| format!("loading deck {}", path.display()))
}

fn make_controller(kind: ControllerType, player: PlayerId, seed: Option<u64>) -> Box<dyn InputSource> {
    match kind {
        ControllerType::Zero => Box::new(ZeroController::new(player)),
        ControllerType::Random => match seed {
            // Offset per seat so the two controllers don't mirror each other
            Some(seed) => Box::new(RandomController::with_seed(
                player,
                seed.wrapping_add(0x1000 + player.as_u32() as u64),
            )),
            None => Box::new(RandomController::new(player)),
        },
    }
}

async fn run_play(
    deck1: &Path,
    deck2: &Path,
    config: MatchConfig,
    options: PlayOptions,
) -> anyhow::Result<()> {
    let decks = [load_deck(deck1)?, load_deck(deck2)?];
    let db = CardDatabase::builtin();
    let seed = config.seed;
    let mut game = MatchInitializer::new(&db).init_match(config, [&decks[0], &decks[1]])?;

    game.logger.set_verbosity(options.verbosity);
    if options.json_logs {
        game.logger.set_output_format(OutputFormat::Json);
    }
    if options.log_tail.is_some() {
        game.logger.enable_capture();
    }

    let mut sources: Vec<Box<dyn InputSource>> = options
        .controllers
        .iter()
        .enumerate()
        .map(|(seat, &kind)| make_controller(kind, EntityId::new(seat as u32), seed))
        .collect();

    if options.verbosity >= VerbosityLevel::Minimal {
        println!("=== MTG Rules Engine ===");
        for (player, source) in game.players.iter().zip(&sources) {
            println!("{}: {} ({})", player.name, source.name(), decks_label(&decks, player.id));
        }
        println!();
    }

    if options.interval_ms == 0 {
        while !game.is_finished() {
            tick(&mut game, &mut sources)?;
        }
    } else {
        let mut interval = tokio::time::interval(Duration::from_millis(options.interval_ms));
        while !game.is_finished() {
            interval.tick().await;
            tick(&mut game, &mut sources)?;
        }
    }

    if let Some(lines) = options.log_tail {
        game.logger.flush_tail(lines);
    }

    for source in sources.iter_mut() {
        let player = source.player_id();
        let won = game.result().and_then(|r| r.winner) == Some(player);
        source.on_match_end(&MatchView::new(&game, player), won);
    }

    print_summary(&game);

    if let Some(path) = options.snapshot_output {
        MatchSnapshot::capture(&game)
            .save_to_file(&path)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        println!("Snapshot written to {}", path.display());
    }

    Ok(())
}

fn decks_label(decks: &[DeckList; 2], player: PlayerId) -> String {
    let deck = &decks[player.as_u32() as usize];
    match &deck.name {
        Some(name) => format!("{name}, {} cards", deck.total_cards()),
        None => format!("{} cards", deck.total_cards()),
    }
}

fn print_summary(game: &Match) {
    println!("\n=== Match Over ===");
    match game.result() {
        Some(result) => {
            match result.winner {
                Some(winner) => {
                    let name = game.player(winner).map(|p| p.name.as_str()).unwrap_or("?");
                    println!("Winner: {name}");
                }
                None => println!("Match ended in a draw"),
            }
            println!("Turns played: {}", result.turns_played);
            println!("Reason: {:?}", result.end_reason);
        }
        None => println!("Match stopped without a result"),
    }

    println!("\n=== Final State ===");
    for player in &game.players {
        println!(
            "{}: {} life, {} cards in library, {} in hand",
            player.name,
            player.life,
            player.library.len(),
            player.hand.len()
        );
    }
}

/// Run matches without a tick interval and report throughput
fn run_profile(games: usize, seed: u64, deck_path: &Path) -> anyhow::Result<()> {
    println!("=== Profiling Mode ===");
    println!("Running {games} matches with seed {seed}");
    println!("Deck: {}\n", deck_path.display());

    let deck = load_deck(deck_path)?;
    let db = CardDatabase::builtin();
    let initializer = MatchInitializer::new(&db);

    let start = Instant::now();
    let mut total_turns = 0u64;
    let mut total_messages = 0u64;
    let mut wins = [0usize; 2];

    for i in 0..games {
        let match_seed = seed.wrapping_add(i as u64);
        let config = MatchConfig {
            seed: Some(match_seed),
            max_turns: Some(200),
            ..MatchConfig::default()
        };
        let mut game = initializer.init_match(config, [&deck, &deck])?;
        game.logger.set_verbosity(VerbosityLevel::Silent);

        let mut sources: Vec<Box<dyn InputSource>> = (0..2u32)
            .map(|seat| make_controller(ControllerType::Random, EntityId::new(seat), Some(match_seed)))
            .collect();
        while !game.is_finished() {
            tick(&mut game, &mut sources)?;
        }

        if let Some(result) = game.result() {
            total_turns += u64::from(result.turns_played);
            if let Some(winner) = result.winner {
                wins[winner.as_u32() as usize] += 1;
            }
        }
        total_messages += game.bus().delivered();

        if (i + 1) % 100 == 0 {
            println!("Completed {} matches", i + 1);
        }
    }

    let elapsed = start.elapsed();
    println!("\n=== Profile Complete ===");
    println!("Total matches: {games}");
    println!("Total time: {:.2?}", elapsed);
    if games > 0 {
        println!("Avg time per match: {:.2?}", elapsed / games as u32);
        println!("Avg turns per match: {:.1}", total_turns as f64 / games as f64);
    }
    println!("Messages delivered: {total_messages}");
    println!("Wins: P1 {} / P2 {}", wins[0], wins[1]);

    Ok(())
}
