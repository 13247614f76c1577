//! Runbook engine
//!
//! Turns the fixed runbook and an operator's topology into a numbered
//! directory of command files.

pub mod pipeline;
