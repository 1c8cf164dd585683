//! Countermove table: the quiet move that most recently refuted a given
//! opponent move, indexed by the target square of that opponent move.
//!
//! Simpler than indexing by the full (piece, from, to) of the previous
//! move: the target square alone is usually enough signal, and keeps the
//! table tiny.

use chess::movegen::moves::Move;
use chess::square::Square;

#[derive(Debug, Clone)]
pub struct CountermoveTable {
    moves: Box<[Move; Square::COUNT]>,
}

impl CountermoveTable {
    pub fn new() -> Self {
        Self { moves: Box::new([Move::NULL; Square::COUNT]) }
    }

    pub fn update(&mut self, prev_move: Move, mv: Move) {
        self.moves[prev_move.tgt() as usize] = mv;
    }

    pub fn get(&self, prev_move: Move) -> Option<Move> {
        let mv = self.moves[prev_move.tgt() as usize];
        if mv == Move::NULL { None } else { Some(mv) }
    }

    pub fn clear(&mut self) {
        *self.moves = [Move::NULL; Square::COUNT];
    }
}

impl Default for CountermoveTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::movegen::moves::MoveType;
    use chess::square::Square::*;

    #[test]
    fn stores_and_retrieves_a_countermove() {
        let mut table = CountermoveTable::new();
        let prev = Move::new(D2, D4, MoveType::DoublePush);
        let reply = Move::new(G8, F6, MoveType::Quiet);

        table.update(prev, reply);

        assert_eq!(table.get(prev), Some(reply));
    }

    #[test]
    fn empty_slot_returns_none() {
        let table = CountermoveTable::new();
        let prev = Move::new(D2, D4, MoveType::DoublePush);
        assert_eq!(table.get(prev), None);
    }
}
