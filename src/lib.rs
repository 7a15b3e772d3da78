//! This crate simulates a single-tape deterministic Turing machine. It parses a
//! textual machine description into a transition table, validates and finalizes
//! it into an immutable machine definition, and executes that definition against
//! a growable tape while notifying observers of every step.
//!
//! The usual flow is: build a [`DescriptionParser`], feed it a description with
//! [`DescriptionParser::parse_string`], finalize with
//! [`DescriptionParser::create`], and wrap the resulting [`MachineDefinition`]
//! in a [`TuringMachine`] to drive execution.

pub mod builder;
pub mod machine;
pub mod parser;
pub mod types;

/// Re-exports the `MachineBuilder` struct from the builder module.
pub use builder::MachineBuilder;
/// Re-exports the execution engine and its result types from the machine module.
pub use machine::{Acceptance, MachineObserver, ObserverHandle, RunResult, TuringMachine};
/// Re-exports the `DescriptionParser` struct and parse error types from the parser module.
pub use parser::{DescriptionParser, LineError, ParseError};
/// Re-exports the core data and error types from the types module.
pub use types::{
    Action, BuildError, Directive, ExecutionError, MachineDefinition, Movement, TransitionTable,
};
