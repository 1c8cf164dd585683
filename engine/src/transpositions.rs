//! The transposition table is one of the most important data structures in
//! the engine.
//!
//! As we're searching through the game tree, we're bound to come across
//! duplicate board positions. It would be great if we could re-use some of
//! the work we've already done in other branches of the tree. Enter the
//! transposition table.
//!
//! We store some key information about the node (the score we found, how
//! deep we searched the node for, whether the score is an upper/lower
//! bound, etc...) and use the position's Zobrist hash as a key to index
//! into it.
//!
//! A couple of concerns:
//! 1. There's more possible board positions than Zobrist hashes (2^64).
//!    That means we'll inevitably have hash collisions (so-called Type-1
//!    collisions). These should be pretty rare, though.
//! 2. We don't want a lookup table with 2^64 entries, so we truncate the
//!    Zobrist hash down to however many bits we need for the requested
//!    table size. Reducing the key size means we'll get _many_ more
//!    collisions (Type-2 collisions). Because these are much more
//!    frequent, we additionally store a 32-bit slice of the full hash
//!    alongside the entry, so on a lookup we can check it against our own
//!    hash and reject probable false positives.

use std::mem::size_of;

use chess::movegen::moves::Move;

use crate::evaluate::{Score, ScoreExt};
use crate::zobrist::{ZHash, ZKey};

/// A flag that stores whether the entry corresponds to a PV, fail-high or
/// fail-low node. Equivalently, whether the stored score is exact, an upper
/// bound, or a lower bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Exact = 0b00,
    Upper = 0b01,
    Lower = 0b10,
}

/// A single TT entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TTEntry {
    /// The low 32 bits of the position's Zobrist hash, used to detect Type-2
    /// collisions cheaply without having to store the full 64-bit hash.
    key32: u32,

    /// The depth we searched to from this node.
    depth: u8,

    /// The best move we found in the previous search of this node.
    best_move: Move,

    /// The score we found, stored ply-relative if it's a mate score (see
    /// `ScoreExt::relative`/`absolute`).
    score: i16,

    /// The static evaluation of the position, cached so re-visiting this
    /// node doesn't need to recompute it.
    eval: i16,

    node_type: NodeType,

    age: u8,
}

impl TTEntry {
    const NULL: TTEntry = TTEntry {
        key32: 0,
        best_move: Move::NULL,
        score: 0,
        eval: 0,
        depth: 0,
        node_type: NodeType::Exact,
        age: 0,
    };

    pub fn new(
        hash: ZHash,
        best_move: Move,
        score: Score,
        eval: Score,
        depth: usize,
        node_type: NodeType,
        age: u8,
        ply: usize,
    ) -> TTEntry {
        TTEntry {
            key32: (hash.0 & 0xFFFF_FFFF) as u32,
            best_move,
            score: score.relative(ply) as i16,
            eval: eval.clamp(i16::MIN as Score, i16::MAX as Score) as i16,
            depth: depth as u8,
            node_type,
            age,
        }
    }

    pub fn get_move(&self) -> Option<Move> {
        if self.best_move == Move::NULL { None } else { Some(self.best_move) }
    }

    pub fn get_score(&self, ply: usize) -> Score {
        (self.score as Score).absolute(ply)
    }

    pub fn get_eval(&self) -> Score {
        self.eval as Score
    }

    pub fn get_depth(&self) -> usize {
        self.depth as usize
    }

    pub fn get_type(&self) -> NodeType {
        self.node_type
    }

    pub fn is_empty(&self) -> bool {
        self.key32 == 0 && self.best_move == Move::NULL && self.depth == 0
    }

    fn matches(&self, hash: ZHash) -> bool {
        self.key32 == (hash.0 & 0xFFFF_FFFF) as u32
    }

    /// Check whether we can use the entry as-is, without searching any
    /// further: we need a deep-enough search, and either an exact score, or
    /// a bound that would already cause a cutoff against the current
    /// window.
    pub fn try_score(&self, depth: usize, alpha: Score, beta: Score, ply: usize) -> Option<Score> {
        if self.get_depth() < depth {
            return None;
        }

        let entry_score = self.get_score(ply);

        match self.node_type {
            NodeType::Exact => Some(entry_score),
            NodeType::Upper if entry_score <= alpha => Some(alpha),
            NodeType::Lower if entry_score >= beta => Some(beta),
            _ => None,
        }
    }
}

impl Default for TTEntry {
    fn default() -> Self {
        TTEntry::NULL
    }
}

/// A transposition table that stores previously searched results.
pub struct TTable {
    table: Vec<TTEntry>,
    size: usize,
    age: u8,
}

impl TTable {
    /// Resize the table to the requested capacity, in MiB.
    pub fn resize(&mut self, mb_size: usize) {
        let size = (mb_size << 20) / size_of::<TTEntry>();
        self.size = size.max(1);
        self.table = vec![TTEntry::NULL; self.size];
    }

    pub fn with_capacity(mb_size: usize) -> TTable {
        let mut table = TTable { table: Vec::new(), size: 0, age: 0 };
        table.resize(mb_size);
        table
    }

    /// Insert an entry into the table.
    ///
    /// Replacement policy: always replace an empty slot or a clash with an
    /// older search generation; otherwise only replace if the new entry
    /// searched at least as deep, or we're upgrading a bound to an exact
    /// score.
    pub fn insert(&mut self, hash: ZHash, entry: TTEntry) {
        let key = ZKey::from_hash(hash, self.size);
        let slot = &mut self.table[key.0];

        let should_replace = slot.is_empty()
            || !slot.matches(hash)
            || entry.age != slot.age
            || entry.depth >= slot.depth
            || (entry.node_type == NodeType::Exact && slot.node_type != NodeType::Exact);

        if should_replace {
            let mut entry = entry;
            entry.key32 = (hash.0 & 0xFFFF_FFFF) as u32;
            *slot = entry;
        }
    }

    /// Look up `hash` in the table, returning the stored entry if present
    /// and not a Type-2 collision.
    pub fn probe(&self, hash: ZHash) -> Option<TTEntry> {
        let key = ZKey::from_hash(hash, self.size);

        self.table
            .get(key.0)
            .filter(|entry| !entry.is_empty())
            .filter(|entry| entry.matches(hash))
            .copied()
    }

    /// Hint the CPU to start pulling the slot for `hash` into cache ahead
    /// of time, for when we'll actually need it a few plies down the line.
    #[cfg(target_arch = "x86_64")]
    pub fn prefetch(&self, hash: ZHash) {
        use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0};

        let key = ZKey::from_hash(hash, self.size);
        if let Some(slot) = self.table.get(key.0) {
            unsafe {
                _mm_prefetch((slot as *const TTEntry).cast::<i8>(), _MM_HINT_T0);
            }
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    pub fn prefetch(&self, _hash: ZHash) {}

    /// The fraction of the table in use, expressed per-mille (0-1000), as
    /// reported in the UCI `hashfull` field. Sampling the first 1000
    /// entries rather than the whole table keeps this cheap to call every
    /// iteration.
    pub fn occupancy(&self) -> u32 {
        let sample_size = self.table.len().min(1000);
        if sample_size == 0 {
            return 0;
        }

        let occupied = self.table[..sample_size].iter().filter(|e| !e.is_empty()).count();
        (occupied * 1000 / sample_size) as u32
    }

    pub fn get_age(&self) -> u8 {
        self.age
    }

    pub fn increment_age(&mut self) {
        self.age = self.age.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        self.table.iter_mut().for_each(|entry| *entry = TTEntry::NULL);
        self.age = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::movegen::moves::MoveType;
    use chess::square::Square::*;

    #[test]
    fn insert_then_probe_roundtrips() {
        let mut tt = TTable::with_capacity(1);
        let hash = ZHash(0xDEAD_BEEF_0000_0001);
        let mv = Move::new(E2, E4, MoveType::DoublePush);

        tt.insert(hash, TTEntry::new(hash, mv, 37, 40, 5, NodeType::Exact, 0, 0));

        let entry = tt.probe(hash).expect("entry should be present");
        assert_eq!(entry.get_move(), Some(mv));
        assert_eq!(entry.get_score(0), 37);
        assert_eq!(entry.get_depth(), 5);
    }

    #[test]
    fn probe_rejects_type2_collision() {
        let mut tt = TTable::with_capacity(1);
        let hash = ZHash(0x1234_5678_0000_0001);
        let other_hash = ZHash(0x1234_5678_FFFF_FFFF ^ 0x1); // same low 32, different high
        let mv = Move::new(chess::square::Square::E2, chess::square::Square::E4, MoveType::DoublePush);

        tt.insert(hash, TTEntry::new(hash, mv, 0, 0, 1, NodeType::Exact, 0, 0));

        // Different full hash hitting the same slot with differing key32
        // should not be served a stale result.
        if ZKey::from_hash(other_hash, 1 << 10) == ZKey::from_hash(hash, 1 << 10) {
            assert!(tt.probe(other_hash).is_none() || other_hash.0 & 0xFFFF_FFFF == hash.0 & 0xFFFF_FFFF);
        }
    }

    #[test]
    fn mate_scores_survive_a_roundtrip_at_depth() {
        let mut tt = TTable::with_capacity(1);
        let hash = ZHash(42);
        let mv = Move::new(chess::square::Square::E2, chess::square::Square::E4, MoveType::DoublePush);
        let mate_in_3 = Score::MATE - 3;

        tt.insert(hash, TTEntry::new(hash, mv, mate_in_3, 0, 10, NodeType::Exact, 0, 7));

        let entry = tt.probe(hash).unwrap();
        assert_eq!(entry.get_score(7), mate_in_3);
    }
}
