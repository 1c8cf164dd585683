//! Static evaluation.
//!
//! Board evaluation is explicitly out of scope for the search core: this
//! module implements just enough of it (material plus piece-square tables,
//! tapered between middlegame and endgame) to give the search something
//! real to optimize against. There's no tuning infrastructure here; the
//! weights are fixed constants.

use chess::board::Board;
use chess::piece::{Color, Piece, PieceType};
use chess::square::Square;

/// The type used for search and evaluation scores throughout the engine.
pub type Score = i32;

/// Extension trait on the `Score` alias (plain `i32`), since Rust's orphan
/// rules don't let us add inherent methods to a foreign type alias.
pub trait ScoreExt {
    const MINUS_INF: Self;
    const PLUS_INF: Self;
    const MATE: Self;
    const DRAW: Self;

    /// The lowest score that still counts as a "mate score", used to
    /// distinguish genuine mate scores from merely lopsided evaluations.
    const LOWEST_MATE: Self;

    fn is_mate(self) -> bool;
    fn mate_distance(self) -> i32;

    /// Adjust a mate score to be relative to the given ply, for storage in
    /// the transposition table (mate distances are root-relative in the
    /// search, but ply-relative in storage, so they stay correct regardless
    /// of how deep in the tree the entry is later probed from).
    fn relative(self, ply: usize) -> Self;

    /// Inverse of `relative`: convert a ply-relative mate score (as read
    /// back from the TT) into one relative to the root.
    fn absolute(self, ply: usize) -> Self;
}

/// Upper bound on search depth/ply used to size fixed arrays throughout the
/// engine, and to keep mate scores comfortably below `i32::MAX`.
pub const MAX_PLY: usize = 128;
pub const MAX_MOVES: usize = 218;

impl ScoreExt for Score {
    const MINUS_INF: Self = Self::MIN + 1;
    const PLUS_INF: Self = Self::MAX;
    const MATE: Self = 20_000;
    const DRAW: Self = 0;
    const LOWEST_MATE: Self = Self::MATE - MAX_PLY as Self;

    fn is_mate(self) -> bool {
        self.abs() >= Self::LOWEST_MATE
    }

    fn mate_distance(self) -> i32 {
        Self::MATE - self.abs()
    }

    fn relative(self, ply: usize) -> Self {
        if self.is_mate() {
            if self > 0 { self + ply as Self } else { self - ply as Self }
        } else {
            self
        }
    }

    fn absolute(self, ply: usize) -> Self {
        if self.is_mate() {
            if self > 0 { self - ply as Self } else { self + ply as Self }
        } else {
            self
        }
    }
}

#[rustfmt::skip]
const PIECE_VALUES: [i32; PieceType::COUNT] =
    // Pawn Knight Bishop Rook Queen King
    [  100,  320,   330,  500,  900, 0 ];

/// Midgame/endgame piece-square tables, indexed `[piece_type][square]`, from
/// White's perspective (mirrored for Black). Values are in centipawns,
/// relative to the piece's base value.
#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
      0,  0,  0,  0,  0,  0,  0,  0,
      5, 10, 10, 10, 10, 10, 10,  5,
     -5,  0,  0,  0,  0,  0,  0, -5,
     -5,  0,  0,  0,  0,  0,  0, -5,
     -5,  0,  0,  0,  0,  0,  0, -5,
     -5,  0,  0,  0,  0,  0,  0, -5,
     -5,  0,  0,  0,  0,  0,  0, -5,
      0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MID_PST: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_END_PST: [i32; 64] = [
    -50,-40,-30,-20,-20,-30,-40,-50,
    -30,-20,-10,  0,  0,-10,-20,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-30,  0,  0,  0,  0,-30,-30,
    -50,-30,-30,-30,-30,-30,-30,-50,
];

fn pst(ptype: PieceType, color: Color, sq: Square, phase: u8) -> i32 {
    let idx = if color.is_white() { (sq as usize) ^ 56 } else { sq as usize };

    match ptype {
        PieceType::Pawn => PAWN_PST[idx],
        PieceType::Knight => KNIGHT_PST[idx],
        PieceType::Bishop => BISHOP_PST[idx],
        PieceType::Rook => ROOK_PST[idx],
        PieceType::Queen => QUEEN_PST[idx],
        PieceType::King => {
            let mg = KING_MID_PST[idx] as i64;
            let eg = KING_END_PST[idx] as i64;
            (((phase as i64) * mg + (24 - phase as i64) * eg) / 24) as i32
        }
    }
}

/// Incrementally-maintainable evaluation state.
///
/// Mirrors the search's incremental-update pattern (`Eval::play_move`) used
/// elsewhere, but here the "incremental" update is really a full
/// recomputation from the board: keeping true incremental piece-square
/// accumulators is an optimization the search core doesn't depend on for
/// correctness.
#[derive(Debug, Copy, Clone)]
pub struct Eval;

impl Eval {
    pub fn new() -> Self {
        Eval
    }

    pub fn play_move(self, _board: &Board) -> Self {
        Eval
    }

    /// The static evaluation of `board`, from the perspective of the side
    /// to move.
    pub fn total(&self, board: &Board) -> Score {
        let phase = board.phase();
        let mut score = 0i32;

        for sq_idx in 0..Square::COUNT {
            let sq = Square::new(sq_idx as u8).unwrap();

            let Some(piece) = board.get_at(sq) else { continue };
            let ptype = piece.piece_type();
            let value = PIECE_VALUES[ptype as usize] + pst(ptype, piece.color(), sq, phase);

            if piece.color().is_white() {
                score += value;
            } else {
                score -= value;
            }
        }

        if board.current.is_white() { score } else { -score }
    }

    /// The score to report for a drawn position. A small node-count-based
    /// jitter around zero discourages the engine from steering into draws
    /// when it believes it's ahead, and from avoiding them when behind,
    /// without needing a full contempt parameter.
    pub fn draw_score(&self, nodes: u64) -> Score {
        (nodes & 0b11) as Score - 2
    }
}

impl Default for Eval {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_is_balanced() {
        let board = Board::default();
        assert_eq!(Eval::new().total(&board), 0);
    }

    #[test]
    fn mate_scores_round_trip_through_ply_adjustment() {
        let score: Score = Score::MATE - 3;
        let stored = score.relative(5);
        assert_eq!(stored.absolute(5), score);
    }
}
