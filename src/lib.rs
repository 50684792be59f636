pub mod board;
pub mod config;
pub mod error;
pub mod movegen;
pub mod perft;
pub mod search;
pub mod uci;
