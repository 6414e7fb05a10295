#[cfg(not(target_endian = "little"))]
compile_error!("boost-core requires a little-endian platform");

pub mod automaton;
pub mod boost;
pub mod config;
pub mod corpus;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod unicode;
