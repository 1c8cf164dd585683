//! Iterative-deepening alpha-beta search.
//!
//! The main entry point repeatedly searches to increasing depths (an
//! "iterative deepening" search), relying on the transposition table and
//! move-ordering heuristics gathered during shallower iterations to make
//! each subsequent, deeper iteration fast. Every iteration is itself a
//! negamax search with alpha-beta pruning (`negamax`), falling back to a
//! quiescence search (`quiescence`) once it runs out of depth, so the
//! search doesn't misjudge a position purely because it stopped abruptly
//! mid-exchange.

use std::time::Duration;

use chess::movegen::moves::Move;
use log::debug;
use uci::search_info::{Score as UciScore, SearchInfo};

use crate::evaluate::{Eval, Score, ScoreExt, MAX_PLY};
use crate::history_tables::pv::PVTable;
use crate::history_tables::SearchTables;
use crate::position::Position;
use crate::time_control::TimeController;
use crate::transpositions::TTable;

pub mod aspiration;
pub mod negamax;
pub mod params;
pub mod quiescence;
pub mod zero_window;

use params::{SearchParams, MAX_DEPTH};

/// Per-ply scratch data that needs to be visible to both a node and its
/// descendants (the static eval two plies up for the "improving" heuristic,
/// a move excluded from singular-extension verification searches, ...).
#[derive(Debug, Copy, Clone, Default)]
struct SearchStackEntry {
    eval: Score,
    excluded: Option<Move>,
    double_exts: u8,

    /// The move played to reach this ply, used to index the countermove and
    /// countermove-history tables at this node.
    last_move: Option<Move>,
}

/// Holds everything a single `go` command's search needs beyond the board
/// itself: the transposition table, move-ordering tables, time control, and
/// running statistics.
pub struct Search<'a> {
    pub depth: usize,
    pub seldepth: usize,
    pub nodes: u64,

    pub tt: &'a mut TTable,
    pub tables: &'a mut SearchTables,
    pub tc: &'a mut TimeController,
    pub params: SearchParams,

    aborted: bool,
    stack: Vec<SearchStackEntry>,

    /// The move played immediately before entering this search, if any —
    /// used to index the countermove/countermove-history tables.
    root_prev_move: Option<Move>,
}

impl<'a> Search<'a> {
    pub fn new(
        tt: &'a mut TTable,
        tables: &'a mut SearchTables,
        tc: &'a mut TimeController,
        root_prev_move: Option<Move>,
    ) -> Self {
        Search {
            depth: 1,
            seldepth: 0,
            nodes: 0,
            tt,
            tables,
            tc,
            params: SearchParams::default(),
            aborted: false,
            stack: vec![SearchStackEntry::default(); MAX_PLY],
            root_prev_move,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub(super) fn mark_aborted(&mut self) {
        self.aborted = true;
    }

    /// The move played immediately before the position at `ply`, used to
    /// index the countermove tables. At the root, this is whatever move (if
    /// any) led to the position the search was invoked on.
    pub(super) fn root_prev_move_at(&self, ply: usize) -> Option<Move> {
        if ply == 0 {
            self.root_prev_move
        } else {
            self.stack[ply].last_move
        }
    }
}

impl Position {
    /// Run an iterative-deepening search, calling `on_iteration` after every
    /// completed (non-aborted) depth so the caller can emit UCI `info`
    /// lines. Returns the report for the last fully-completed iteration.
    pub fn search(
        &self,
        tt: &mut TTable,
        tables: &mut SearchTables,
        tc: &mut TimeController,
        root_prev_move: Option<Move>,
        mut on_iteration: impl FnMut(&SearchReport),
    ) -> SearchReport {
        let mut latest_report = SearchReport::default();
        let mut pv = PVTable::new();
        let mut prev_best_move = None;
        let mut bm_stability = 0;
        let mut score_stability = 0;
        let mut prev_score = Score::MINUS_INF;

        if self.board.legal_moves::<true>().len() == 1 {
            tc.stop_early();
        }

        let mut search = Search::new(tt, tables, tc, root_prev_move);

        while search.depth <= MAX_DEPTH && search.tc.should_start_search(search.depth) {
            pv.clear();

            let score = self.aspiration_search(search.depth, latest_report.score, &mut pv, &mut search);

            if search.is_aborted() {
                break;
            }

            latest_report = SearchReport::new(&search, score, pv.moves().to_vec());

            if prev_best_move == pv.pv_move() {
                bm_stability += 1;
            } else {
                bm_stability = 0;
            }
            prev_best_move = pv.pv_move();

            if (score - prev_score).abs() < 10 {
                score_stability += 1;
            } else {
                score_stability = 0;
            }
            prev_score = score;

            let node_frac = 0.0; // per-move node accounting isn't tracked without per-root-move counters
            search.tc.update(bm_stability, node_frac, score_stability);

            on_iteration(&latest_report);
            debug!("completed depth {} in {:?}", search.depth, search.tc.elapsed());

            search.depth += 1;
        }

        latest_report
    }
}

/// Everything about a completed (or partially-completed) iteration that's
/// worth reporting to the UCI frontend.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub depth: usize,
    pub seldepth: usize,
    pub nodes: u64,
    pub duration: Duration,
    pub score: Score,
    pub pv: Vec<Move>,
    pub hashfull: u32,
}

impl SearchReport {
    pub fn new(search: &Search, score: Score, pv: Vec<Move>) -> Self {
        Self {
            depth: search.depth,
            seldepth: search.seldepth,
            nodes: search.nodes,
            duration: search.tc.elapsed(),
            score,
            pv,
            hashfull: search.tt.occupancy(),
        }
    }

    pub fn default() -> Self {
        Self {
            depth: 0,
            seldepth: 0,
            nodes: 0,
            duration: Duration::ZERO,
            score: 0,
            pv: Vec::new(),
            hashfull: 0,
        }
    }
}

impl From<&SearchReport> for SearchInfo {
    fn from(report: &SearchReport) -> Self {
        let nps = (1_000_000 * report.nodes)
            .checked_div(report.duration.as_micros().max(1) as u64)
            .unwrap_or_default();

        SearchInfo {
            depth: Some(report.depth as u8),
            seldepth: Some(report.seldepth as u8),
            time: Some(report.duration.as_millis() as u64),
            nodes: Some(report.nodes as u32),
            score: Some(report.score.to_uci()),
            pv: report.pv.clone(),
            hashfull: Some(report.hashfull),
            nps: Some(nps),
            currmove: None,
            currmovenumber: None,
            extra: Vec::new(),
        }
    }
}

trait ScoreUciExt {
    fn to_uci(self) -> UciScore;
}

impl ScoreUciExt for Score {
    fn to_uci(self) -> UciScore {
        if self.is_mate() {
            UciScore::Mate(self.signum() * (self.mate_distance() + 1) / 2)
        } else {
            UciScore::Cp(self)
        }
    }
}
