//! A null-window (PVS) search: probe whether the score is above or below
//! `value` without caring by how much, which is enough to decide whether a
//! move needs a full re-search.

use crate::evaluate::{Eval, Score};
use crate::history_tables::pv::PVTable;
use crate::position::Position;

use super::Search;

impl Position {
    pub fn zero_window(
        &self,
        ply: usize,
        depth: usize,
        value: Score,
        pv: &mut PVTable,
        eval: Eval,
        try_null: bool,
        cutnode: bool,
        search: &mut Search,
    ) -> Score {
        self.negamax::<false>(ply, depth, value - 1, value, pv, eval, try_null, cutnode, search)
    }
}
