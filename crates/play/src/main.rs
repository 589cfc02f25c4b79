//! Command-line driver for the MCTS engines.
//!
//! Plays interactive tic-tac-toe, pits engines against each other, trains
//! the heuristic engine's state-value table through self-play and runs
//! Nim against a human or another engine.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use playout_core::{Game, PlayoutError};
use playout_mcts::{
    games::{Nim, NimAction, NimState, Player, TicTacToe, TicTacToeAction, TicTacToeState},
    BackupRule, HeuristicMcts, Mcts, MctsConfig, Uct,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Play, pit and train Monte Carlo Tree Search engines.
#[derive(Parser)]
#[command(name = "playout")]
#[command(about = "Play tic-tac-toe and Nim against UCT engines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game of tic-tac-toe.
    Play {
        /// Who plays X.
        #[arg(long, value_enum, default_value_t = AgentKind::Human)]
        x: AgentKind,

        /// Who plays O.
        #[arg(long, value_enum, default_value_t = AgentKind::Heuristic)]
        o: AgentKind,

        /// State-value table used by heuristic engines; updated after the game.
        #[arg(long)]
        table: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Play engine-versus-engine tic-tac-toe games in parallel.
    Arena {
        /// Number of games to play.
        #[arg(short, long, default_value = "100")]
        games: usize,

        /// Engine playing X.
        #[arg(long, value_enum, default_value_t = AgentKind::Heuristic)]
        x: AgentKind,

        /// Engine playing O.
        #[arg(long, value_enum, default_value_t = AgentKind::Uct)]
        o: AgentKind,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Accumulate a state-value table through heuristic self-play.
    Train {
        /// Number of self-play games.
        #[arg(short, long, default_value = "100")]
        games: usize,

        /// Table file; loaded if present and saved when training ends.
        #[arg(long, default_value = "data/tictactoe.msgpack")]
        table: PathBuf,

        /// Temperature for move selection (1.0 = proportional to visit counts).
        #[arg(short, long, default_value = "1.0")]
        temperature: f64,

        /// Move number after which temperature drops to 0 (greedy).
        #[arg(long, default_value = "2")]
        temperature_drop: usize,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Play one game of Nim.
    Nim {
        /// Starting pile sizes.
        #[arg(long, value_delimiter = ',', default_value = "3,4,5")]
        piles: Vec<u8>,

        /// Who moves first (player 0).
        #[arg(long, value_enum, default_value_t = AgentKind::Uct)]
        p0: AgentKind,

        /// Who moves second (player 1).
        #[arg(long, value_enum, default_value_t = AgentKind::Uct)]
        p1: AgentKind,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

/// Search settings shared by every subcommand.
#[derive(Args, Clone, Debug)]
struct EngineArgs {
    /// Number of MCTS simulations per move.
    #[arg(short, long, default_value = "1000")]
    simulations: usize,

    /// Random seed for reproducibility.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// How rollout outcomes are credited along the search path.
    #[arg(long, value_enum, default_value_t = Backup::Alternating)]
    backup: Backup,

    /// UCT exploration constant.
    #[arg(long, default_value_t = std::f64::consts::SQRT_2)]
    exploration: f64,

    /// Wall-clock limit per move in milliseconds.
    #[arg(long)]
    time_limit_ms: Option<u64>,
}

impl EngineArgs {
    fn config(&self) -> Result<MctsConfig> {
        let mut config = MctsConfig::default()
            .with_backup(self.backup.into())
            .with_exploration_constant(self.exploration);
        if let Some(ms) = self.time_limit_ms {
            config = config.with_time_limit(Duration::from_millis(ms));
        }
        config.validate().context("Invalid engine settings")?;
        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum AgentKind {
    Human,
    Uct,
    Heuristic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backup {
    Uniform,
    Alternating,
}

impl From<Backup> for BackupRule {
    fn from(backup: Backup) -> Self {
        match backup {
            Backup::Uniform => BackupRule::Uniform,
            Backup::Alternating => BackupRule::Alternating,
        }
    }
}

/// One side of a tic-tac-toe game.
enum Agent {
    Human,
    Uct(Uct<TicTacToe, ChaCha8Rng>),
    Heuristic(HeuristicMcts<TicTacToe, ChaCha8Rng>),
}

impl Agent {
    fn new(kind: AgentKind, config: &MctsConfig, seed: u64) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(seed);
        match kind {
            AgentKind::Human => Agent::Human,
            AgentKind::Uct => Agent::Uct(Mcts::uct(config.clone(), rng)),
            AgentKind::Heuristic => Agent::Heuristic(Mcts::heuristic(config.clone(), rng)),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Agent::Human => "human",
            Agent::Uct(_) => "uct",
            Agent::Heuristic(_) => "heuristic",
        }
    }

    fn choose_move(
        &mut self,
        game: &TicTacToe,
        state: &TicTacToeState,
        simulations: usize,
    ) -> Result<TicTacToeAction> {
        match self {
            Agent::Human => {
                let stdin = io::stdin();
                let stdout = io::stdout();
                read_human_move(game, state, &mut stdin.lock(), &mut stdout.lock())
            }
            Agent::Uct(mcts) => Ok(mcts.search(game, state, simulations)?),
            Agent::Heuristic(mcts) => Ok(mcts.search(game, state, simulations)?),
        }
    }
}

/// Prompt until the human enters a legal cell.
///
/// Unparsable input and illegal cells are reported and re-prompted; end of
/// input is an error.
fn read_human_move<B: BufRead, W: Write>(
    game: &TicTacToe,
    state: &TicTacToeState,
    input: &mut B,
    out: &mut W,
) -> Result<TicTacToeAction> {
    loop {
        write!(out, "{} to move, enter a cell (0-8): ", state.current_player())?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("input closed before a move was entered");
        }

        let cell: u8 = match line.trim().parse() {
            Ok(cell) => cell,
            Err(_) => {
                writeln!(out, "'{}' is not a cell number", line.trim())?;
                continue;
            }
        };

        let action = TicTacToeAction(cell);
        match game.apply(state, action) {
            Ok(_) => return Ok(action),
            Err(PlayoutError::InvalidAction(msg)) => writeln!(out, "Illegal move: {}", msg)?,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Play a game of tic-tac-toe to the end and return the final position.
fn play_tictactoe(
    game: &TicTacToe,
    x: &mut Agent,
    o: &mut Agent,
    simulations: usize,
    verbose: bool,
) -> Result<TicTacToeState> {
    let mut state = game.initial_state();
    if verbose {
        println!("{}\n", state);
    }

    while !game.is_terminal(&state) {
        let mover = state.current_player();
        let agent = match mover {
            Player::X => &mut *x,
            Player::O => &mut *o,
        };
        let action = agent.choose_move(game, &state, simulations)?;
        state = game.apply(&state, action)?;

        if verbose {
            println!("{} ({}) plays {}\n{}\n", mover, agent.name(), action, state);
        }
    }

    Ok(state)
}

/// Win/draw totals over a batch of games.
#[derive(Debug, Default, PartialEq, Eq)]
struct Tally {
    x_wins: usize,
    o_wins: usize,
    draws: usize,
}

impl Tally {
    fn record(&mut self, winner: Option<Player>) {
        match winner {
            Some(Player::X) => self.x_wins += 1,
            Some(Player::O) => self.o_wins += 1,
            None => self.draws += 1,
        }
    }

    fn total(&self) -> usize {
        self.x_wins + self.o_wins + self.draws
    }

    fn percent(&self, count: usize) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            count as f64 / self.total() as f64 * 100.0
        }
    }
}

/// Replace the engine's table with the one stored at `path`.
///
/// A missing file leaves the table empty. So does an unreadable one, with a
/// warning, so that a stale or corrupt file never blocks training.
fn load_table(mcts: &mut HeuristicMcts<TicTacToe, ChaCha8Rng>, path: &Path) -> Result<()> {
    match mcts.load_from_path(path) {
        Ok(()) => Ok(()),
        Err(PlayoutError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no saved table, starting empty");
            Ok(())
        }
        Err(PlayoutError::Format(msg)) => {
            warn!(path = %path.display(), error = %msg, "ignoring unreadable table, starting empty");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load table from {:?}", path)),
    }
}

fn save_table(mcts: &HeuristicMcts<TicTacToe, ChaCha8Rng>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    mcts.save_to_path(path)
        .with_context(|| format!("Failed to save table to {:?}", path))
}

/// Run the play command.
fn cmd_play(x: AgentKind, o: AgentKind, table: Option<PathBuf>, engine: &EngineArgs) -> Result<()> {
    let config = engine.config()?;
    let game = TicTacToe;
    let mut agent_x = Agent::new(x, &config, engine.seed);
    let mut agent_o = Agent::new(o, &config, engine.seed.wrapping_add(1));

    if let Some(path) = &table {
        for agent in [&mut agent_x, &mut agent_o] {
            if let Agent::Heuristic(mcts) = agent {
                load_table(mcts, path)?;
            }
        }
    }

    println!(
        "X: {}  O: {}  ({} simulations/move)\n",
        agent_x.name(),
        agent_o.name(),
        engine.simulations
    );
    let state = play_tictactoe(&game, &mut agent_x, &mut agent_o, engine.simulations, true)?;

    match state.winner() {
        Some(player) => println!("{} wins", player),
        None => println!("Draw"),
    }

    // Only one table can be written back; X's takes precedence
    if let Some(path) = &table {
        let heuristic = [&agent_x, &agent_o].into_iter().find_map(|agent| match agent {
            Agent::Heuristic(mcts) => Some(mcts),
            _ => None,
        });
        if let Some(mcts) = heuristic {
            save_table(mcts, path)?;
        }
    }

    Ok(())
}

/// Play `games` independent engine games, one engine pair per game.
fn run_arena(games: usize, x: AgentKind, o: AgentKind, engine: &EngineArgs) -> Result<Tally> {
    if x == AgentKind::Human || o == AgentKind::Human {
        bail!("arena games are engine versus engine; use `play` for human games");
    }
    let config = engine.config()?;

    let winners: Vec<Option<Player>> = (0..games)
        .into_par_iter()
        .map(|i| -> Result<Option<Player>> {
            let game_seed = engine.seed.wrapping_add(i as u64 * 1000);
            let mut agent_x = Agent::new(x, &config, game_seed);
            let mut agent_o = Agent::new(o, &config, game_seed.wrapping_add(1));
            let state =
                play_tictactoe(&TicTacToe, &mut agent_x, &mut agent_o, engine.simulations, false)
                    .with_context(|| format!("Game {} failed", i))?;
            Ok(state.winner())
        })
        .collect::<Result<_>>()?;

    let mut tally = Tally::default();
    for winner in winners {
        tally.record(winner);
    }
    Ok(tally)
}

/// Run the arena command.
fn cmd_arena(games: usize, x: AgentKind, o: AgentKind, engine: &EngineArgs) -> Result<()> {
    println!(
        "Playing {} games: {:?} (X) vs {:?} (O), {} simulations/move",
        games, x, o, engine.simulations
    );
    let start = Instant::now();
    let tally = run_arena(games, x, o, engine)?;

    println!("\nCompleted in {:.2}s", start.elapsed().as_secs_f64());
    println!("X wins: {} ({:.1}%)", tally.x_wins, tally.percent(tally.x_wins));
    println!("O wins: {} ({:.1}%)", tally.o_wins, tally.percent(tally.o_wins));
    println!("Draws:  {} ({:.1}%)", tally.draws, tally.percent(tally.draws));
    Ok(())
}

/// Self-play `games` games with one heuristic engine, accumulating its table.
fn run_training(
    mcts: &mut HeuristicMcts<TicTacToe, ChaCha8Rng>,
    games: usize,
    simulations: usize,
    temperature: f64,
    temperature_drop: usize,
    seed: u64,
) -> Result<Tally> {
    let game = TicTacToe;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut tally = Tally::default();

    for i in 0..games {
        let mut state = game.initial_state();
        let mut move_number = 0;

        while !game.is_terminal(&state) {
            let result = mcts.search_with_stats(&game, &state, simulations)?;
            let temp = if move_number < temperature_drop {
                temperature
            } else {
                0.0
            };
            let action = result.select_action(temp, &mut rng);
            state = game.apply(&state, action)?;
            move_number += 1;
        }
        tally.record(state.winner());

        if (i + 1) % 10 == 0 || i + 1 == games {
            println!(
                "Game {}/{}: X {} - {} O ({} draws), {} positions",
                i + 1,
                games,
                tally.x_wins,
                tally.o_wins,
                tally.draws,
                mcts.table().len()
            );
        }
    }

    Ok(tally)
}

/// Run the train command.
fn cmd_train(
    games: usize,
    table: PathBuf,
    temperature: f64,
    temperature_drop: usize,
    engine: &EngineArgs,
) -> Result<()> {
    let config = engine.config()?;
    let mut mcts: HeuristicMcts<TicTacToe, _> =
        Mcts::heuristic(config, ChaCha8Rng::seed_from_u64(engine.seed));
    load_table(&mut mcts, &table)?;
    let initial_positions = mcts.table().len();

    println!(
        "Training on {} games with {} simulations/move, table {:?} ({} positions)",
        games, engine.simulations, table, initial_positions
    );
    let start = Instant::now();
    run_training(
        &mut mcts,
        games,
        engine.simulations,
        temperature,
        temperature_drop,
        engine.seed.wrapping_add(1),
    )?;

    save_table(&mcts, &table)?;
    println!("\nCompleted in {:.2}s", start.elapsed().as_secs_f64());
    println!(
        "Table: {} positions ({} new), {} total visits",
        mcts.table().len(),
        mcts.table().len().saturating_sub(initial_positions),
        mcts.table().total_visits()
    );
    Ok(())
}

/// One side of a Nim game.
enum NimAgent {
    Human,
    Uct(Uct<Nim, ChaCha8Rng>),
    Heuristic(HeuristicMcts<Nim, ChaCha8Rng>),
}

impl NimAgent {
    fn new(kind: AgentKind, config: &MctsConfig, seed: u64) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(seed);
        match kind {
            AgentKind::Human => NimAgent::Human,
            AgentKind::Uct => NimAgent::Uct(Mcts::uct(config.clone(), rng)),
            AgentKind::Heuristic => NimAgent::Heuristic(Mcts::heuristic(config.clone(), rng)),
        }
    }

    fn choose_move(&mut self, game: &Nim, state: &NimState, simulations: usize) -> Result<NimAction> {
        match self {
            NimAgent::Human => {
                let stdin = io::stdin();
                let stdout = io::stdout();
                read_nim_move(game, state, &mut stdin.lock(), &mut stdout.lock())
            }
            NimAgent::Uct(mcts) => Ok(mcts.search(game, state, simulations)?),
            NimAgent::Heuristic(mcts) => Ok(mcts.search(game, state, simulations)?),
        }
    }
}

/// Prompt until the human enters a legal `pile count` pair.
fn read_nim_move<B: BufRead, W: Write>(
    game: &Nim,
    state: &NimState,
    input: &mut B,
    out: &mut W,
) -> Result<NimAction> {
    loop {
        write!(
            out,
            "Player {}, take tokens as `pile count` (piles {:?}): ",
            state.player_to_move(),
            state.piles()
        )?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("input closed before a move was entered");
        }

        let numbers: Vec<u8> = match line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
        {
            Ok(numbers) => numbers,
            Err(_) => {
                writeln!(out, "'{}' is not a pile and a count", line.trim())?;
                continue;
            }
        };
        let action = match numbers.as_slice() {
            &[pile, count] => NimAction { pile, count },
            _ => {
                writeln!(out, "expected two numbers, got '{}'", line.trim())?;
                continue;
            }
        };

        match game.apply(state, action) {
            Ok(_) => return Ok(action),
            Err(PlayoutError::InvalidAction(msg)) => writeln!(out, "Illegal move: {}", msg)?,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Play a game of Nim; returns the winning player (0 or 1).
fn play_nim(
    game: &Nim,
    p0: AgentKind,
    p1: AgentKind,
    engine: &EngineArgs,
    verbose: bool,
) -> Result<u8> {
    let config = engine.config()?;
    let mut players = [
        NimAgent::new(p0, &config, engine.seed),
        NimAgent::new(p1, &config, engine.seed.wrapping_add(1)),
    ];

    let mut state = game.initial_state();
    if game.is_terminal(&state) {
        bail!("all piles are empty");
    }
    if verbose {
        println!("{} (nim-sum {})", state, state.nim_sum());
    }

    let mut last_mover = state.player_to_move();
    while !game.is_terminal(&state) {
        last_mover = state.player_to_move();
        let action = players[last_mover as usize].choose_move(game, &state, engine.simulations)?;
        state = game.apply(&state, action)?;
        if verbose {
            println!("Player {} {}: {}", last_mover, action, state);
        }
    }

    Ok(last_mover)
}

/// Run the nim command.
fn cmd_nim(piles: Vec<u8>, p0: AgentKind, p1: AgentKind, engine: &EngineArgs) -> Result<()> {
    let game = Nim::new(piles);
    let winner = play_nim(&game, p0, p1, engine, true)?;
    println!("\nPlayer {} takes the last token and wins", winner);
    Ok(())
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing("info");
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            x,
            o,
            table,
            engine,
        } => cmd_play(x, o, table, &engine),

        Commands::Arena {
            games,
            x,
            o,
            engine,
        } => cmd_arena(games, x, o, &engine),

        Commands::Train {
            games,
            table,
            temperature,
            temperature_drop,
            engine,
        } => cmd_train(games, table, temperature, temperature_drop, &engine),

        Commands::Nim {
            piles,
            p0,
            p1,
            engine,
        } => cmd_nim(piles, p0, p1, &engine),
    }
}
