//! This module provides the `MachineBuilder`, which incrementally accumulates
//! states, alphabets, and transitions from description directives and finalizes
//! them into an immutable [`MachineDefinition`].

use std::collections::HashSet;
use std::mem;

use crate::types::{
    Action, BuildError, Directive, MachineDefinition, Movement, TransitionTable,
};

/// Accumulates the elements of a machine description in any order and defers
/// all cross-validation to [`MachineBuilder::create`].
///
/// States and symbols are registered implicitly as transitions mention them;
/// symbols other than the blank are collected into the input alphabet. The
/// initial state and the blank symbol are settable at most once per builder
/// lifetime.
#[derive(Debug, Default)]
pub struct MachineBuilder {
    states: HashSet<String>,
    input_alphabet: HashSet<char>,
    transitions: TransitionTable,
    initial_state: Option<String>,
    final_states: HashSet<String>,
    blank_symbol: Option<char>,
    halt_state: Option<String>,
}

impl MachineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the transition (state, symbol) -> (new_state, new_symbol, movement).
    ///
    /// Both states and both symbols are added to the working sets; a previous
    /// action stored under the same (state, symbol) key is overwritten.
    ///
    /// Fails with [`BuildError::SymbolTooLong`] if either symbol token spans
    /// more than one character.
    pub fn add_transition(
        &mut self,
        state: &str,
        symbol: &str,
        new_state: &str,
        new_symbol: &str,
        movement: Movement,
    ) -> Result<(), BuildError> {
        let symbol = single_symbol(symbol)?;
        let new_symbol = single_symbol(new_symbol)?;

        self.states.insert(state.to_owned());
        self.states.insert(new_state.to_owned());

        if self.blank_symbol != Some(symbol) {
            self.input_alphabet.insert(symbol);
        }
        if self.blank_symbol != Some(new_symbol) {
            self.input_alphabet.insert(new_symbol);
        }

        self.transitions.entry(state.to_owned()).or_default().insert(
            symbol,
            Action {
                state: new_state.to_owned(),
                symbol: new_symbol,
                movement,
            },
        );

        Ok(())
    }

    /// Adds the state to the state set and to the set of final states.
    /// Idempotent.
    pub fn add_final_state(&mut self, state: &str) {
        self.states.insert(state.to_owned());
        self.final_states.insert(state.to_owned());
    }

    /// Sets the initial state, adding it to the state set.
    ///
    /// Fails with [`BuildError::AlreadySet`] on a second call.
    pub fn set_initial_state(&mut self, state: &str) -> Result<(), BuildError> {
        if self.initial_state.is_some() {
            return Err(BuildError::AlreadySet(Directive::Initial));
        }
        self.states.insert(state.to_owned());
        self.initial_state = Some(state.to_owned());
        Ok(())
    }

    /// Sets the blank symbol.
    ///
    /// Fails with [`BuildError::InvalidSymbol`] if the token is empty or spans
    /// more than one character, and with [`BuildError::AlreadySet`] on a
    /// second call.
    pub fn set_blank_symbol(&mut self, symbol: &str) -> Result<(), BuildError> {
        let blank =
            single_symbol(symbol).map_err(|_| BuildError::InvalidSymbol(symbol.to_owned()))?;
        if self.blank_symbol.is_some() {
            return Err(BuildError::AlreadySet(Directive::Blank));
        }
        self.blank_symbol = Some(blank);
        Ok(())
    }

    /// Sets the halt state, adding it to the state set.
    ///
    /// A previously set halt state that is not referenced by any stored
    /// transition is removed from the state set, so a replaced placeholder
    /// does not linger in the definition.
    pub fn set_halt_state(&mut self, state: &str) {
        if let Some(old) = self.halt_state.take() {
            let referenced = self
                .transitions
                .iter()
                .any(|(s, actions)| *s == old || actions.values().any(|a| a.state == old));
            if !referenced {
                self.states.remove(&old);
            }
        }

        self.states.insert(state.to_owned());
        self.halt_state = Some(state.to_owned());
    }

    pub fn has_initial_state(&self) -> bool {
        self.initial_state.is_some()
    }

    pub fn has_halt_state(&self) -> bool {
        self.halt_state.is_some()
    }

    pub fn has_blank_symbol(&self) -> bool {
        self.blank_symbol.is_some()
    }

    /// Resets the builder to its empty initial condition, discarding all
    /// accumulated elements.
    pub fn clean(&mut self) {
        *self = Self::default();
    }

    /// Finalizes the accumulated elements into a [`MachineDefinition`].
    ///
    /// Fails with the corresponding `Missing*` error if the initial state,
    /// blank symbol, or halt state is unset; the builder is left intact so the
    /// missing directive can still be supplied. On success the working sets
    /// are moved into the definition (the builder resets to empty), the tape
    /// alphabet is computed as input alphabet plus the blank, and the full
    /// definition invariant check runs.
    pub fn create(&mut self) -> Result<MachineDefinition, BuildError> {
        let initial_state = self
            .initial_state
            .clone()
            .ok_or(BuildError::MissingInitialState)?;
        let blank_symbol = self.blank_symbol.ok_or(BuildError::MissingBlankSymbol)?;
        let halt_state = self.halt_state.clone().ok_or(BuildError::MissingHaltState)?;

        let states = mem::take(&mut self.states);
        let input_alphabet = mem::take(&mut self.input_alphabet);
        let transitions = mem::take(&mut self.transitions);
        let final_states = mem::take(&mut self.final_states);
        self.clean();

        let mut tape_alphabet = input_alphabet.clone();
        tape_alphabet.insert(blank_symbol);

        let definition = MachineDefinition::new(
            states,
            input_alphabet,
            tape_alphabet,
            transitions,
            initial_state,
            final_states,
            halt_state,
            blank_symbol,
        )?;

        log::debug!(
            "created machine definition: {} states, {} tape symbols",
            definition.states().len(),
            definition.tape_alphabet().len()
        );

        Ok(definition)
    }
}

fn single_symbol(token: &str) -> Result<char, BuildError> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        (Some(_), Some(_)) => Err(BuildError::SymbolTooLong(token.to_owned())),
        (None, _) => Err(BuildError::InvalidSymbol(token.to_owned())),
    }
}
