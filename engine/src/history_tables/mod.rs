//! Move-ordering tables used outside of the transposition table: killers,
//! history, countermoves, countermove history, and the PV triangle.

pub mod counter_history;
pub mod countermoves;
pub mod history;
pub mod killers;
pub mod pv;

use chess::board::Board;
use chess::movegen::moves::Move;

pub use counter_history::CounterHistoryTable;
pub use countermoves::CountermoveTable;
pub use history::{HistoryIndex, HistoryTable};
pub use killers::{KillerTable, Killers, MAX_KILLERS};
pub use pv::PVTable;

/// Bundles every quiet move-ordering table the search maintains across an
/// entire search call (as opposed to `PVTable`, which lives per-node).
pub struct SearchTables {
    pub killers: KillerTable,
    pub history: HistoryTable,
    pub countermoves: CountermoveTable,
    pub counter_history: CounterHistoryTable,
}

impl SearchTables {
    pub fn new(max_ply: usize) -> Self {
        Self {
            killers: KillerTable::new(max_ply),
            history: HistoryTable::new(),
            countermoves: CountermoveTable::new(),
            counter_history: CounterHistoryTable::new(),
        }
    }

    pub fn clear(&mut self) {
        self.killers.clear();
        self.history.clear();
        self.countermoves.clear();
        self.counter_history.clear();
    }

    /// Record that `best_move` caused a beta cutoff at `ply`/`depth`,
    /// rewarding it and penalizing every other quiet move that was tried
    /// and failed to cut off (`tried_quiets`), relative to the move
    /// played on the previous ply (`prev_move`, if any).
    pub fn record_cutoff(
        &mut self,
        board: &Board,
        ply: usize,
        depth: usize,
        prev_move: Option<Move>,
        best_move: Move,
        tried_quiets: &[Move],
    ) {
        if best_move.is_quiet() {
            self.killers.add(ply, best_move);

            let bonus = HistoryTable::bonus(depth);
            self.history.update(HistoryIndex::new(board, best_move), bonus);

            if let Some(prev) = prev_move {
                self.countermoves.update(prev, best_move);
                self.counter_history.update(
                    prev,
                    board,
                    best_move,
                    CounterHistoryTable::bonus(depth),
                );
            }
        }

        let malus = HistoryTable::malus(depth);
        for &quiet in tried_quiets {
            if quiet == best_move {
                continue;
            }

            self.history.update(HistoryIndex::new(board, quiet), -malus);

            if let Some(prev) = prev_move {
                self.counter_history.update(
                    prev,
                    board,
                    quiet,
                    -CounterHistoryTable::malus(depth),
                );
            }
        }
    }
}
