//! The negamax node: alpha-beta search with the usual complement of
//! pruning techniques and extensions.

use chess::movegen::moves::Move;

use crate::evaluate::{Eval, Score, ScoreExt};
use crate::history_tables::history::HistoryIndex;
use crate::history_tables::pv::PVTable;
use crate::move_picker::MovePicker;
use crate::position::Position;
use crate::transpositions::{NodeType, TTEntry};

use super::Search;

fn is_tactical(mv: Move) -> bool {
    mv.is_capture() || mv.is_promotion()
}

impl Position {
    /// The main negamax function. `PV` marks whether this node is on the
    /// principal variation (and therefore gets a full window and none of
    /// the more aggressive non-PV pruning).
    #[allow(clippy::too_many_arguments)]
    pub fn negamax<const PV: bool>(
        &self,
        ply: usize,
        mut depth: usize,
        mut alpha: Score,
        beta: Score,
        pv: &mut PVTable,
        eval_state: Eval,
        try_null: bool,
        cutnode: bool,
        search: &mut Search,
    ) -> Score {
        if search.is_aborted() {
            return Score::MINUS_INF;
        }

        let in_root = ply == 0;
        let excluded = search.stack[ply].excluded;

        if ply > 0 {
            search.stack[ply].double_exts = search.stack[ply - 1].double_exts;
        }

        // Check extension: always search at least one extra ply out of check.
        let in_check = self.board.in_check();
        if in_check {
            depth += 1;
        }

        if depth == 0 || ply >= super::params::MAX_DEPTH {
            return self.quiescence(ply, alpha, beta, eval_state, search);
        }

        search.nodes += 1;
        search.seldepth = search.seldepth.max(ply);

        if !in_root && (self.board.is_rule_draw() || self.is_repetition()) {
            return eval_state.draw_score(search.nodes);
        }

        let tt_entry = if excluded.is_none() { search.tt.probe(self.hash) } else { None };
        let tt_move = tt_entry.and_then(|entry| entry.get_move());

        if !PV && !in_root {
            if let Some(entry) = tt_entry {
                if let Some(score) = entry.try_score(depth, alpha, beta, ply) {
                    return score;
                }
            }
        }

        let raw_eval = if excluded.is_some() {
            Score::MINUS_INF
        } else if let Some(entry) = tt_entry {
            entry.get_eval()
        } else {
            eval_state.total(&self.board)
        };

        let static_eval = if excluded.is_some() { search.stack[ply].eval } else { raw_eval };
        search.stack[ply].eval = static_eval;

        search.tables.killers.clear_ply(ply + 1);

        let improving =
            !in_check && ply >= 2 && search.stack[ply - 2].eval < static_eval;

        let params = search.params;

        // Reverse futility pruning: if the static eval is already well
        // above beta, assume the search would fail high and return early.
        let rfp_margin = params.rfp_margin * depth as Score;
        if !PV
            && !in_root
            && !in_check
            && excluded.is_none()
            && depth <= params.rfp_max_depth
            && static_eval - rfp_margin >= beta
        {
            return (static_eval + beta) / 2;
        }

        // Razoring: at very shallow depth, if the static eval is far below
        // alpha, drop straight into quiescence to confirm there's no tactic
        // that saves the position.
        if !PV
            && !in_root
            && !in_check
            && excluded.is_none()
            && depth <= params.razor_max_depth
            && static_eval + params.razor_margin < alpha
        {
            let score = self.quiescence(ply, alpha, beta, eval_state, search);
            if score < alpha {
                return score;
            }
        }

        // Null-move pruning: if passing the turn entirely still produces a
        // cutoff, the position was already winning enough not to need
        // searching further.
        let nmp_margin = params.nmp_eval_divisor;
        let should_null_prune = try_null
            && !PV
            && !in_root
            && !in_check
            && excluded.is_none()
            && depth >= params.nmp_min_depth
            && static_eval + nmp_margin >= beta
            && self.board.zugzwang_unlikely();

        if should_null_prune {
            let reduction =
                (params.nmp_base_reduction + depth / params.nmp_depth_divisor).min(depth);

            let null_score = -self.play_null_move().zero_window(
                ply + 1,
                depth - reduction,
                -beta + 1,
                &mut PVTable::new(),
                eval_state,
                false,
                !cutnode,
                search,
            );

            if null_score >= beta {
                return null_score;
            }
        }

        // Internal iterative reduction: without a TT move to trust, shave a
        // ply off so we don't sink full depth into an unordered node.
        if tt_move.is_none() && (PV || cutnode) && depth >= params.iir_min_depth {
            depth -= 1;
        }

        let all_moves = self.board.legal_moves::<true>();
        let mut legal_moves =
            MovePicker::new(self, all_moves, tt_move, search.tables.killers.get(ply), search.root_prev_move_at(ply));

        if let Some(prev) = search.root_prev_move_at(ply) {
            if let Some(countermove) = search.tables.countermoves.get(prev) {
                legal_moves.boost_countermove(countermove);
            }
        }

        // Singular extension candidate: the TT move looks uniquely good if
        // every alternative fails a narrow verification search below its
        // TT score.
        let se_candidate = tt_entry
            .filter(|entry| {
                depth >= search.params.se_min_depth
                    && !in_root
                    && excluded.is_none()
                    && entry.get_type() != NodeType::Upper
                    && entry.get_depth() + 3 >= depth
                    && !entry.get_score(ply).is_mate()
            })
            .and_then(|entry| entry.get_move());

        let mut move_count = 0;
        let mut quiets_tried = Vec::new();
        let mut best_move = tt_move;
        let mut best_score = Score::MINUS_INF;
        let mut node_type = NodeType::Upper;
        let mut local_pv = PVTable::new();

        while let Some(mv) = legal_moves.next(&search.tables.history, &search.tables.counter_history) {
            if Some(mv) == excluded {
                continue;
            }

            local_pv.clear();

            if !search.tc.should_continue(search.nodes) {
                search.mark_aborted();
                return Score::MINUS_INF;
            }

            // Futility pruning: near the leaves, skip quiets that can't
            // plausibly close the gap to alpha.
            let futility = params.fp_base + params.fp_margin * depth as Score + 100 * improving as Score;
            if move_count > 0
                && !PV
                && !in_check
                && depth <= params.fp_max_depth
                && static_eval + futility < alpha
            {
                legal_moves.only_good_tacticals = true;
                continue;
            }

            // SEE pruning: skip moves that lose material by more than a
            // depth-scaled margin.
            if move_count > 0 && !in_root && !best_score.is_mate() && depth <= params.see_max_depth {
                let margin = if mv.is_quiet() {
                    params.see_quiet_margin * depth as Score
                } else {
                    params.see_capture_margin * depth as Score
                };

                if !self.board.see(mv, margin) {
                    continue;
                }
            }

            // Late move pruning: skip quiets once we've tried enough moves
            // at shallow depth without a cutoff.
            let lmp_moves = params.lmp_base + depth * depth;
            if depth <= params.lmp_max_depth && !PV && !in_check && move_count >= lmp_moves {
                legal_moves.only_good_tacticals = true;
            }

            let mut extension: i32 = 0;

            if se_candidate == Some(mv) {
                let mut se_pv = PVTable::new();
                let tt_score = tt_entry.unwrap().get_score(ply);
                let se_depth = (depth - 1) / 2;
                let se_beta = Score::max(tt_score - params.se_margin * depth as Score, -Score::MATE);

                search.stack[ply].excluded = se_candidate;
                let value = self.zero_window(
                    ply,
                    se_depth,
                    se_beta,
                    &mut se_pv,
                    eval_state,
                    try_null,
                    cutnode,
                    search,
                );
                search.stack[ply].excluded = None;

                if value < se_beta {
                    extension += 1;
                } else if se_beta >= beta {
                    return se_beta;
                } else if tt_score >= beta {
                    extension -= 1;
                }
            }

            let nodes_before = search.nodes;
            search.tt.prefetch(self.approx_hash_after(mv));

            let next_position = self.play_move(mv);
            let next_eval = eval_state.play_move(&next_position.board);
            search.stack[ply + 1].last_move = Some(mv);

            let mut score;

            if move_count == 0 {
                score = -next_position.negamax::<PV>(
                    ply + 1,
                    (depth as i32 + extension - 1).max(0) as usize,
                    -beta,
                    -alpha,
                    &mut local_pv,
                    next_eval,
                    false,
                    !(PV || cutnode),
                    search,
                );
            } else {
                let mut reduction: i32 = 0;

                if depth >= params.lmr_min_depth && move_count >= params.lmr_min_move_index {
                    reduction = lmr_reduction(depth, move_count);
                    reduction += (legal_moves.only_good_tacticals) as i32;
                    reduction += tt_move.is_some_and(is_tactical) as i32;
                    reduction += cutnode as i32;
                    reduction -= PV as i32;
                    reduction -= in_check as i32;
                    reduction -= next_position.board.in_check() as i32;

                    if mv.is_quiet() {
                        let hist = search.tables.history[HistoryIndex::new(&self.board, mv)];
                        reduction -= hist / 4000;
                    }

                    reduction = reduction.clamp(0, depth as i32 - 1);
                }

                score = -next_position.zero_window(
                    ply + 1,
                    (depth as i32 - 1 + extension - reduction).max(0) as usize,
                    -alpha,
                    &mut local_pv,
                    next_eval,
                    true,
                    true,
                    search,
                );

                if score > alpha && reduction > 0 {
                    score = -next_position.zero_window(
                        ply + 1,
                        (depth as i32 + extension - 1).max(0) as usize,
                        -alpha,
                        &mut local_pv,
                        next_eval,
                        true,
                        !cutnode,
                        search,
                    );
                }

                if score > alpha && score < beta {
                    score = -next_position.negamax::<PV>(
                        ply + 1,
                        (depth as i32 + extension - 1).max(0) as usize,
                        -beta,
                        -alpha,
                        &mut local_pv,
                        next_eval,
                        false,
                        !(PV || cutnode),
                        search,
                    );
                }
            }

            move_count += 1;

            if in_root {
                let _ = search.nodes - nodes_before; // per-move node accounting not tracked currently
            }

            if score > best_score {
                best_score = score;
            }

            if score >= beta {
                node_type = NodeType::Lower;
                best_move = Some(mv);
                if mv.is_quiet() {
                    quiets_tried.push(mv);
                }
                break;
            }

            if score > alpha {
                alpha = score;
                node_type = NodeType::Exact;
                best_move = Some(mv);
                pv.add_to_front(mv, &local_pv);
            }

            if mv.is_quiet() {
                quiets_tried.push(mv);
            }

            if search.is_aborted() {
                return Score::MINUS_INF;
            }
        }

        if move_count == 0 && excluded.is_some() {
            return alpha;
        }

        if move_count == 0 && in_check {
            return -Score::MATE + ply as Score;
        }

        if move_count == 0 {
            return eval_state.draw_score(search.nodes);
        }

        if node_type == NodeType::Lower {
            let best_move = best_move.expect("a lower-bound node always has a best move");
            let prev_move = search.root_prev_move_at(ply);

            search.tables.record_cutoff(
                &self.board,
                ply,
                depth,
                prev_move,
                best_move,
                &quiets_tried,
            );
        }

        if excluded.is_none() {
            search.tt.insert(self.hash, TTEntry::new(
                self.hash,
                best_move.unwrap_or(Move::NULL),
                best_score,
                raw_eval,
                depth,
                node_type,
                search.tt.get_age(),
                ply,
            ));
        }

        best_score
    }
}

/// A formula-based late-move-reduction table, computed on first use rather
/// than baked in as a precomputed constant: `ln(depth) * ln(move_count) / 2`,
/// the same shape most engines derive empirically but without needing a
/// checked-in binary blob.
fn lmr_reduction(depth: usize, move_count: usize) -> i32 {
    use std::sync::OnceLock;

    const TABLE_SIZE: usize = 64;
    static TABLE: OnceLock<[[i32; TABLE_SIZE]; TABLE_SIZE]> = OnceLock::new();

    let table = TABLE.get_or_init(|| {
        let mut table = [[0i32; TABLE_SIZE]; TABLE_SIZE];
        for (d, row) in table.iter_mut().enumerate() {
            for (m, cell) in row.iter_mut().enumerate() {
                if d == 0 || m == 0 {
                    *cell = 0;
                } else {
                    *cell = ((d as f64).ln() * (m as f64).ln() / 2.0) as i32;
                }
            }
        }
        table
    });

    table[depth.min(TABLE_SIZE - 1)][move_count.min(TABLE_SIZE - 1)]
}
