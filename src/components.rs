//! Stateful editor pieces: crop selection, history and tool dispatch.

pub mod crop;
pub mod history;
pub mod tools;
