//! This module defines the core data structures shared by the builder, parser, and
//! execution engine: head movements, transition actions, the immutable machine
//! definition, and the build/execution error types.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// A transition table: source state -> (symbol under the head -> action).
///
/// The nested-map shape keeps (state, symbol) keys unique by construction; the
/// last insertion for a key wins.
pub type TransitionTable = HashMap<String, HashMap<char, Action>>;

/// Represents the possible head movements of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Movement {
    /// Move the head one cell to the left.
    Left,
    /// Move the head one cell to the right.
    Right,
    /// Keep the head on the current cell.
    None,
}

/// The right-hand side of a transition: the state to enter, the symbol to write
/// at the head, and the movement to apply afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The state the machine transitions to.
    pub state: String,
    /// The symbol written at the current head position.
    pub symbol: char,
    /// The head movement applied after writing.
    pub movement: Movement,
}

/// The singleton directives of the description grammar, each permitted at most
/// once per description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Initial,
    Blank,
    Halt,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Directive::Initial => "initial state",
            Directive::Blank => "blank symbol",
            Directive::Halt => "halt state",
        };
        f.write_str(name)
    }
}

/// Errors raised while accumulating description elements or finalizing them
/// into a [`MachineDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A symbol token spanned more than one character.
    #[error("symbol {0:?} is longer than one character")]
    SymbolTooLong(String),
    /// A symbol token was empty or otherwise not a single character.
    #[error("invalid symbol {0:?}: expected exactly one character")]
    InvalidSymbol(String),
    /// A singleton element was set a second time.
    #[error("{0} is already set")]
    AlreadySet(Directive),
    #[error("an initial state must be specified")]
    MissingInitialState,
    #[error("a blank symbol must be specified")]
    MissingBlankSymbol,
    #[error("a halt state must be specified")]
    MissingHaltState,
    /// Definition invariant: input alphabet is a subset of the tape alphabet.
    #[error("input alphabet is not a subset of the tape alphabet")]
    InputAlphabetNotSubset,
    /// Definition invariant: the blank symbol belongs to the tape alphabet.
    #[error("blank symbol {0:?} is not in the tape alphabet")]
    BlankNotInTapeAlphabet(char),
    /// Definition invariant: a referenced state belongs to the state set.
    #[error("state {0:?} is not a member of the state set")]
    UnknownState(String),
    /// Definition invariant: a transition symbol belongs to the tape alphabet.
    #[error("symbol {0:?} is not in the tape alphabet")]
    UnknownSymbol(char),
    /// Definition invariant: final states form a subset of the state set.
    #[error("final states are not a subset of the state set")]
    FinalStatesNotSubset,
}

/// Errors raised by the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A step was attempted while the current state is the halt state.
    #[error("current state is the halt state")]
    HaltState,
    /// A step or tape read was attempted before any tape was set.
    #[error("the tape must be set first")]
    TapeNotSet,
    /// The transition table has no entry for the current (state, symbol) pair.
    #[error("no transition for state {state:?} and symbol {symbol:?}")]
    UnknownTransition { state: String, symbol: char },
    /// The given tape content contains a symbol outside the tape alphabet.
    #[error("symbol {0:?} is not in the tape alphabet")]
    InvalidSymbol(char),
}

/// An immutable, fully validated machine definition.
///
/// Instances are created once, either directly through [`MachineDefinition::new`]
/// or by [`MachineBuilder::create`](crate::builder::MachineBuilder::create), and
/// are never mutated afterwards. The execution engine only reads from it.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineDefinition {
    states: HashSet<String>,
    input_alphabet: HashSet<char>,
    tape_alphabet: HashSet<char>,
    transitions: TransitionTable,
    initial_state: String,
    final_states: HashSet<String>,
    halt_state: String,
    blank_symbol: char,
}

impl MachineDefinition {
    /// Builds a definition from its parts, running the full invariant check:
    ///
    /// 1. input alphabet is a subset of the tape alphabet
    /// 2. blank symbol belongs to the tape alphabet
    /// 3. initial state belongs to the state set
    /// 4. final states form a subset of the state set
    /// 5. every transition state belongs to the state set
    /// 6. every transition symbol belongs to the tape alphabet
    ///
    /// Movement validity is guaranteed by the [`Movement`] type.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        states: HashSet<String>,
        input_alphabet: HashSet<char>,
        tape_alphabet: HashSet<char>,
        transitions: TransitionTable,
        initial_state: String,
        final_states: HashSet<String>,
        halt_state: String,
        blank_symbol: char,
    ) -> Result<Self, BuildError> {
        if !input_alphabet.is_subset(&tape_alphabet) {
            return Err(BuildError::InputAlphabetNotSubset);
        }
        if !tape_alphabet.contains(&blank_symbol) {
            return Err(BuildError::BlankNotInTapeAlphabet(blank_symbol));
        }
        if !states.contains(&initial_state) {
            return Err(BuildError::UnknownState(initial_state));
        }
        if !final_states.is_subset(&states) {
            return Err(BuildError::FinalStatesNotSubset);
        }

        for (state, actions) in &transitions {
            if !states.contains(state) {
                return Err(BuildError::UnknownState(state.clone()));
            }
            for (symbol, action) in actions {
                if !tape_alphabet.contains(symbol) {
                    return Err(BuildError::UnknownSymbol(*symbol));
                }
                if !states.contains(&action.state) {
                    return Err(BuildError::UnknownState(action.state.clone()));
                }
                if !tape_alphabet.contains(&action.symbol) {
                    return Err(BuildError::UnknownSymbol(action.symbol));
                }
            }
        }

        Ok(Self {
            states,
            input_alphabet,
            tape_alphabet,
            transitions,
            initial_state,
            final_states,
            halt_state,
            blank_symbol,
        })
    }

    /// Returns the action for the given (state, symbol) pair, if any.
    pub fn transition(&self, state: &str, symbol: char) -> Option<&Action> {
        self.transitions.get(state)?.get(&symbol)
    }

    pub fn states(&self) -> &HashSet<String> {
        &self.states
    }

    pub fn input_alphabet(&self) -> &HashSet<char> {
        &self.input_alphabet
    }

    pub fn tape_alphabet(&self) -> &HashSet<char> {
        &self.tape_alphabet
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    pub fn final_states(&self) -> &HashSet<String> {
        &self.final_states
    }

    pub fn halt_state(&self) -> &str {
        &self.halt_state
    }

    pub fn blank_symbol(&self) -> char {
        self.blank_symbol
    }

    pub fn is_final_state(&self, state: &str) -> bool {
        self.final_states.contains(state)
    }
}

impl fmt::Display for MachineDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn sorted<T: Ord + Clone>(set: &HashSet<T>) -> Vec<T> {
            let mut items: Vec<T> = set.iter().cloned().collect();
            items.sort();
            items
        }

        writeln!(f, "States: {:?}", sorted(&self.states))?;
        writeln!(f, "Input alphabet: {:?}", sorted(&self.input_alphabet))?;
        writeln!(f, "Tape alphabet: {:?}", sorted(&self.tape_alphabet))?;
        writeln!(f, "Blank symbol: {:?}", self.blank_symbol)?;
        writeln!(f, "Initial state: {}", self.initial_state)?;
        writeln!(f, "Final states: {:?}", sorted(&self.final_states))?;
        writeln!(f, "Halt state: {}", self.halt_state)?;
        writeln!(f, "Transitions:")?;

        let mut lines = Vec::new();
        for (state, actions) in &self.transitions {
            for (symbol, action) in actions {
                lines.push(format!(
                    "  {}, {} -> {}, {}, {:?}",
                    state, symbol, action.state, action.symbol, action.movement
                ));
            }
        }
        lines.sort();
        for line in lines {
            writeln!(f, "{}", line)?;
        }

        Ok(())
    }
}
