//! Pipeline stages. Planner and writer run under the retry loop; editor and
//! promotion are deterministic.

pub mod editor;
pub mod planner;
pub mod social;
pub mod writer;
