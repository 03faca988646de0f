//! TCP listener that hands each connection to its own task.

pub mod listener;
