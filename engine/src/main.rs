//! Corvid's UCI front end.
//!
//! Reads UCI commands from stdin, drives a single-threaded search, and
//! writes UCI messages back out to stdout.

use std::io::stdout;
use std::io::BufRead;
use std::io::Write;

use chess::board::Board;
use clap::Parser;
use colored::Colorize;

use corvid::history_tables::SearchTables;
use corvid::position::Position;
use corvid::time_control::{TimeControlHandle, TimeController};
use corvid::transpositions::TTable;
use uci::client::UciClientMessage;
use uci::engine::{IdType, UciEngineMessage};
use uci::options::{OptionType, UciOption};

const NAME: &str = "Corvid";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHOR: &str = "a student of the game";

const DEFAULT_TT_SIZE: usize = 16;

const UCI_OPTIONS: [UciOption; 2] = [
    UciOption {
        name: "Hash",
        option_type: OptionType::Spin { min: 1, max: 4096, default: DEFAULT_TT_SIZE as i32 },
    },
    UciOption {
        name: "Threads",
        option_type: OptionType::Spin { min: 1, max: 1, default: 1 },
    },
];

/// Chess engine search core, spoken over the UCI protocol.
#[derive(Parser, Debug)]
#[command(name = "corvid", version)]
struct Cli {
    /// Run a one-off perft of the given depth on the starting position
    /// and exit, instead of entering the UCI loop.
    #[arg(long)]
    perft: Option<u8>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Some(depth) = cli.perft {
        let board = Board::default();
        let result = board.perft_divide(depth as usize);
        let total: u64 = result.iter().map(|(_, nodes)| nodes).sum();

        for (mv, nodes) in result.iter() {
            println!("{mv}: {nodes}");
        }
        println!("\n{total}");

        return Ok(());
    }

    UciListener::new(Board::default()).run()
}

/// Owns the current game state and a single search session; reads UCI
/// commands from stdin and prints the resulting UCI messages to stdout.
struct UciListener {
    position: Position,
    debug: bool,
    tc_handle: Option<TimeControlHandle>,
    tt: TTable,
    tables: SearchTables,
}

impl UciListener {
    fn new(board: Board) -> Self {
        Self {
            position: Position::new(board),
            debug: false,
            tc_handle: None,
            tt: TTable::with_capacity(DEFAULT_TT_SIZE),
            tables: SearchTables::new(corvid::evaluate::MAX_PLY),
        }
    }

    fn run(&mut self) -> anyhow::Result<()> {
        eprintln!("{} {}", NAME.blue(), VERSION.blue());
        eprintln!("{}: {AUTHOR}", "Author".blue());

        let stdin = std::io::stdin().lock();

        for input in stdin.lines() {
            let input = input?;

            match input.trim().parse::<UciClientMessage>() {
                Ok(command) => self.handle(command)?,
                Err(err) => println!("{err}: {input}"),
            }

            stdout().flush()?;
        }

        Ok(())
    }

    fn handle(&mut self, command: UciClientMessage) -> anyhow::Result<()> {
        use UciClientMessage::*;

        match command {
            Uci => {
                println!("{}", UciEngineMessage::Id(IdType::Name(format!("{NAME} {VERSION}"))));
                println!("{}", UciEngineMessage::Id(IdType::Author(AUTHOR.to_string())));

                for option in UCI_OPTIONS {
                    println!("{}", UciEngineMessage::UciOption(option));
                }

                println!("{}", UciEngineMessage::UciOk);
            }

            IsReady => println!("{}", UciEngineMessage::ReadyOk),

            UciNewGame => {
                self.position = Position::new(Board::default());
                self.tc_handle = None;
                self.tt.clear();
                self.tables.clear();
            }

            Debug(flag) => self.debug = flag,

            Position(board, moves) => {
                let mut position = Position::new(board);
                for mv in moves {
                    position = position.play_bare_move(mv);
                }
                self.position = position;
            }

            Go(tc_type) => {
                let root_prev_move = None;
                let (mut tc, tc_handle) = TimeController::new(tc_type, self.position.board.current);
                self.tc_handle = Some(tc_handle);
                self.tt.increment_age();

                let report = self.position.search(
                    &mut self.tt,
                    &mut self.tables,
                    &mut tc,
                    root_prev_move,
                    |report| {
                        println!("{}", UciEngineMessage::Info(report.into()));
                    },
                );

                if let Some(&best_move) = report.pv.first() {
                    println!("{}", UciEngineMessage::BestMove(best_move));
                }
            }

            Stop => {
                if let Some(handle) = &self.tc_handle {
                    handle.stop();
                }
            }

            SetOption(name, value) => match name.as_str() {
                "Hash" => {
                    if let Ok(size) = value.parse() {
                        self.tt.resize(size);
                    }
                }
                "Threads" => {
                    // Single-threaded search core; accepted for UCI
                    // compliance but otherwise a no-op.
                }
                _ => eprintln!("unknown option {name}"),
            },

            Quit => std::process::exit(0),
        }

        Ok(())
    }
}
