pub mod types;
pub mod context;
pub mod rules;
pub mod board;
