//! Most of the core logic concerning `Position`s lives in this module.
//!
//! A `Position` is a wrapper around a `Board` that keeps track of some
//! additional game data the chess backend doesn't have any knowledge of:
//! the Zobrist hash, and a history of hashes for repetition detection.

use arrayvec::ArrayVec;
use chess::board::Board;
use chess::movegen::castling::CastleType;
use chess::movegen::moves::{BareMove, Move};
use chess::square::Square;

use crate::zobrist::ZHash;

/// We don't ever expect to exceed 100 entries, because that would be a draw
/// under the fifty-move rule.
const HIST_SIZE: usize = 100;

/// Wrapper around a `Board` that stores additional metadata that is not tied
/// to the board itself, but rather to the search algorithm.
#[derive(Debug, Clone)]
pub struct Position {
    /// The board associated with the position.
    pub board: Board,

    /// The Zobrist hash of the current board.
    pub hash: ZHash,

    /// A history of Zobrist hashes going back to the last capture or pawn
    /// move (i.e. since the half-move clock was last reset).
    pub history: ArrayVec<ZHash, HIST_SIZE>,
}

impl Position {
    /// Create a new `Position` from a `Board`.
    pub fn new(board: Board) -> Self {
        Position { hash: ZHash::from(&board), board, history: ArrayVec::new() }
    }

    /// Check whether the current position is a repetition, by scanning back
    /// through the reversible-move history.
    pub fn is_repetition(&self) -> bool {
        self.history
            .iter()
            // Look through the history backwards
            .rev()
            // Skip the position the opponent just played
            .skip(1)
            // Only every other position can repeat the side to move
            .step_by(2)
            .any(|&historic| historic == self.hash)
    }

    /// Play a move and return the resulting position, updating the hash and
    /// history accordingly.
    pub fn play_move(&self, mv: Move) -> Self {
        assert!(mv != Move::NULL, "tried to play a null move");

        let new_board = self.board.play_move(mv);
        let new_hash = ZHash::from(&new_board);

        let mut new_history;

        let is_reversible = !mv.is_capture()
            && self.board.get_at(mv.src()).map(|p| !p.is_pawn()).unwrap_or(true);

        if is_reversible {
            new_history = self.history.clone();
            new_history.push(self.hash);
        } else {
            new_history = ArrayVec::new();
        }

        Self { board: new_board, hash: new_hash, history: new_history }
    }

    /// Play a null move (pass the turn without moving), used by null-move
    /// pruning.
    pub fn play_null_move(&self) -> Self {
        let mut new_board = self.board.clone();
        let mut new_hash = self.hash;

        new_board.current = new_board.current.opp();
        new_hash.toggle_side();

        if let Some(ep_sq) = self.board.en_passant {
            new_board.en_passant = None;
            new_hash.toggle_ep(ep_sq);
        }

        new_board.checkers = new_board.compute_checkers(new_board.current);

        Self { board: new_board, hash: new_hash, history: ArrayVec::new() }
    }

    /// Play a bare move (as received over UCI). Panics if it doesn't
    /// correspond to a legal move.
    pub fn play_bare_move(&self, bare: BareMove) -> Self {
        let mv = self
            .board
            .legal_moves::<true>()
            .into_iter()
            .find(|mv| *mv == bare)
            .expect("not a legal move");

        self.play_move(mv)
    }

    /// A fast, approximate hash of the position after playing `mv`, used
    /// only to prefetch the transposition table slot ahead of actually
    /// making the move. Doesn't bother with castling rights.
    pub fn approx_hash_after(&self, mv: Move) -> ZHash {
        let mut new_hash = self.hash;
        new_hash.toggle_side();

        let old_piece = self
            .board
            .get_at(mv.src())
            .expect("the source square of a move has a piece");

        new_hash.toggle_piece(old_piece, mv.src());

        if let Some(promo_type) = mv.get_promo_type() {
            let new_piece = chess::piece::Piece::new(promo_type, self.board.current);
            new_hash.toggle_piece(new_piece, mv.tgt());
        } else {
            new_hash.toggle_piece(old_piece, mv.tgt());
        }

        if mv.is_capture() {
            let capture_sq = capture_square(&self.board, mv);
            if let Some(captured) = self.board.get_at(capture_sq) {
                new_hash.toggle_piece(captured, capture_sq);
            }
        }

        new_hash
    }
}

/// The square a capturing move removes a piece from. Differs from the
/// target square only for en-passant captures.
pub fn capture_square(board: &Board, mv: Move) -> Square {
    if mv.is_en_passant() {
        let ep_sq = board.en_passant.expect("en passant move implies an ep square");
        ep_sq.backward(board.current).expect("ep square has a square behind it")
    } else {
        mv.tgt()
    }
}

/// Whether a castle move's rook-move counterpart, used by the search when
/// it needs to know both halves of a castle.
pub fn rook_move_for(mv: Move) -> Option<Move> {
    CastleType::from_move(mv).map(|ctype| ctype.rook_move())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::square::Square::*;

    #[test]
    fn repetition_is_detected() {
        let board: Board = "3k4/8/8/8/8/8/8/3K3P w - - 0 1".parse().unwrap();
        let mut position = Position::new(board);

        position = position.play_move(chess::movegen::moves::Move::new(
            D1, E1, chess::movegen::moves::MoveType::Quiet,
        ));
        position = position.play_move(chess::movegen::moves::Move::new(
            D8, E8, chess::movegen::moves::MoveType::Quiet,
        ));
        position = position.play_move(chess::movegen::moves::Move::new(
            E1, D1, chess::movegen::moves::MoveType::Quiet,
        ));
        position = position.play_move(chess::movegen::moves::Move::new(
            E8, D8, chess::movegen::moves::MoveType::Quiet,
        ));

        assert!(position.is_repetition());
    }

    #[test]
    fn capture_resets_history() {
        let board: Board = Board::default();
        let mut position = Position::new(board);
        position.history.push(ZHash::NULL);
        position = position.play_move(chess::movegen::moves::Move::new(
            chess::square::Square::E2,
            chess::square::Square::E4,
            chess::movegen::moves::MoveType::DoublePush,
        ));
        assert!(position.history.is_empty());
    }
}
