pub mod bitboard;
pub mod board;
pub mod constants;
pub mod fen;
pub mod movegen;
pub mod perft;
pub mod piece;
pub mod san;
pub mod see;
pub mod square;
