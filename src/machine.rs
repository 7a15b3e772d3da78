//! This module defines the `TuringMachine` execution engine. It wraps an
//! immutable [`MachineDefinition`] with the mutable run state (tape, head,
//! current state, step counter) and implements single-step and run-to-completion
//! semantics, word-acceptance testing, and observer notification.

use std::cell::RefCell;
use std::rc::Rc;

use crate::types::{ExecutionError, MachineDefinition, Movement};

/// Observer of machine execution, notified synchronously from within the
/// engine's operations.
///
/// Implementations must not panic; the engine performs no recovery around the
/// callbacks.
pub trait MachineObserver {
    /// The engine is about to apply a transition; `state` and `symbol` are the
    /// configuration before any mutation.
    fn on_step_start(&mut self, state: &str, symbol: char);
    /// A transition was applied: the machine entered `state` after writing
    /// `symbol` and moving the head in `movement` direction.
    fn on_step_end(&mut self, state: &str, symbol: char, movement: Movement);
    /// The tape was replaced; `head_pos` is the position that was requested,
    /// which may be negative.
    fn on_tape_changed(&mut self, head_pos: isize);
    /// The head index changed during a step.
    fn on_head_moved(&mut self, head_pos: usize, old_head_pos: usize);
}

/// A handle to an attached observer. Identity is pointer identity of the `Rc`.
pub type ObserverHandle = Rc<RefCell<dyn MachineObserver>>;

/// How a [`TuringMachine::run`] call terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResult {
    /// The halt state was reached.
    Halted,
    /// The step limit was exhausted before the halt state.
    StepLimitReached,
    /// No transition exists for the current (state, symbol) pair.
    NoTransition,
}

/// The verdict of a word-acceptance test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Execution terminated in a final state.
    Accepted,
    /// Execution terminated in a non-final state.
    Rejected,
    /// The step limit was exhausted before execution terminated.
    Undetermined,
}

/// A single-tape deterministic Turing machine.
///
/// The definition is read-only for the machine's entire lifetime; all mutation
/// happens on the tape, the head, the current state, and the step counter.
/// `set_tape` may be called repeatedly to restart execution with fresh content.
pub struct TuringMachine {
    definition: MachineDefinition,
    tape: Option<Vec<char>>,
    head: usize,
    current_state: String,
    steps: usize,
    observers: Vec<ObserverHandle>,
}

impl TuringMachine {
    /// Creates a machine at the definition's initial state, with no tape.
    pub fn new(definition: MachineDefinition) -> Self {
        let current_state = definition.initial_state().to_owned();
        Self {
            definition,
            tape: None,
            head: 0,
            current_state,
            steps: 0,
            observers: Vec::new(),
        }
    }

    /// Replaces the tape with the given word and places the head.
    ///
    /// A negative `head_pos` left-pads the word with that many blanks and
    /// leaves the head at index 0; a `head_pos` beyond the word right-pads
    /// with blanks so the head still addresses a valid cell. An empty word
    /// yields a single blank cell.
    ///
    /// The current state is untouched; callers wanting a fresh run must also
    /// call [`set_at_initial_state`](Self::set_at_initial_state).
    ///
    /// Fails with [`ExecutionError::InvalidSymbol`] if the word contains a
    /// symbol outside the tape alphabet.
    pub fn set_tape(&mut self, word: &str, head_pos: isize) -> Result<(), ExecutionError> {
        for symbol in word.chars() {
            if !self.definition.tape_alphabet().contains(&symbol) {
                return Err(ExecutionError::InvalidSymbol(symbol));
            }
        }

        let blank = self.definition.blank_symbol();
        let mut tape: Vec<char>;
        if head_pos < 0 {
            tape = vec![blank; head_pos.unsigned_abs()];
            tape.extend(word.chars());
            self.head = 0;
        } else {
            tape = word.chars().collect();
            if tape.is_empty() {
                tape.push(blank);
            }
            let head = head_pos as usize;
            while tape.len() <= head {
                tape.push(blank);
            }
            self.head = head;
        }
        self.tape = Some(tape);

        for observer in &self.observers {
            observer.borrow_mut().on_tape_changed(head_pos);
        }

        Ok(())
    }

    /// Forces the current state back to the initial state, independent of the
    /// tape.
    pub fn set_at_initial_state(&mut self) {
        self.current_state = self.definition.initial_state().to_owned();
    }

    /// Performs one execution step.
    ///
    /// Fails with [`ExecutionError::HaltState`] when already at the halt
    /// state, [`ExecutionError::TapeNotSet`] when no tape is set, and
    /// [`ExecutionError::UnknownTransition`] when the table has no entry for
    /// the current configuration. The step counter only advances on success.
    pub fn run_step(&mut self) -> Result<(), ExecutionError> {
        if self.is_at_halt_state() {
            return Err(ExecutionError::HaltState);
        }
        let symbol = match &self.tape {
            Some(tape) => tape[self.head],
            None => return Err(ExecutionError::TapeNotSet),
        };
        let action = match self.definition.transition(&self.current_state, symbol) {
            Some(action) => action.clone(),
            None => {
                return Err(ExecutionError::UnknownTransition {
                    state: self.current_state.clone(),
                    symbol,
                })
            }
        };

        for observer in &self.observers {
            observer.borrow_mut().on_step_start(&self.current_state, symbol);
        }

        let blank = self.definition.blank_symbol();
        let old_head = self.head;
        if let Some(tape) = self.tape.as_mut() {
            tape[self.head] = action.symbol;
            match action.movement {
                Movement::Left => {
                    if self.head == 0 {
                        // The tape grows leftward; the head stays on index 0,
                        // which now holds the fresh blank.
                        tape.insert(0, blank);
                    } else {
                        self.head -= 1;
                    }
                }
                Movement::Right => {
                    self.head += 1;
                    if self.head == tape.len() {
                        tape.push(blank);
                    }
                }
                Movement::None => {}
            }
        }
        self.current_state = action.state;

        for observer in &self.observers {
            observer
                .borrow_mut()
                .on_step_end(&self.current_state, action.symbol, action.movement);
        }
        if self.head != old_head {
            for observer in &self.observers {
                observer.borrow_mut().on_head_moved(self.head, old_head);
            }
        }

        self.steps += 1;
        Ok(())
    }

    /// Performs steps until the halt state, a missing transition, or the
    /// optional step limit.
    ///
    /// A missing transition is reported as [`RunResult::NoTransition`] rather
    /// than an error, so batch execution terminates without exceptional
    /// control flow. All other step failures propagate.
    pub fn run(&mut self, max_steps: Option<usize>) -> Result<RunResult, ExecutionError> {
        let outcome = match max_steps {
            Some(limit) => {
                let mut outcome = None;
                for _ in 0..limit {
                    match self.run_step() {
                        Ok(()) => {}
                        Err(ExecutionError::HaltState) => {
                            outcome = Some(RunResult::Halted);
                            break;
                        }
                        Err(ExecutionError::UnknownTransition { .. }) => {
                            outcome = Some(RunResult::NoTransition);
                            break;
                        }
                        Err(e) => return Err(e),
                    }
                }
                // A bounded run that lands exactly on the halt state counts
                // as halted, not as hitting the limit.
                outcome.unwrap_or(if self.is_at_halt_state() {
                    RunResult::Halted
                } else {
                    RunResult::StepLimitReached
                })
            }
            None => loop {
                if self.is_at_halt_state() {
                    break RunResult::Halted;
                }
                match self.run_step() {
                    Ok(()) => {}
                    Err(ExecutionError::UnknownTransition { .. }) => {
                        break RunResult::NoTransition;
                    }
                    Err(e) => return Err(e),
                }
            },
        };

        log::debug!(
            "run finished: {:?} after {} total steps, state {:?}",
            outcome,
            self.steps,
            self.current_state
        );
        Ok(outcome)
    }

    /// Tests whether the machine accepts the given word.
    ///
    /// The current tape, head, and state are snapshotted, the word is run from
    /// the current state, and the snapshot is restored afterwards. A run cut
    /// short by the step limit yields [`Acceptance::Undetermined`].
    pub fn is_word_accepted(
        &mut self,
        word: &str,
        max_steps: Option<usize>,
    ) -> Result<Acceptance, ExecutionError> {
        let saved_tape = self.tape.take();
        let saved_head = self.head;
        let saved_state = self.current_state.clone();

        let verdict = self.acceptance_run(word, max_steps);

        self.tape = saved_tape;
        self.head = saved_head;
        self.current_state = saved_state;

        verdict
    }

    fn acceptance_run(
        &mut self,
        word: &str,
        max_steps: Option<usize>,
    ) -> Result<Acceptance, ExecutionError> {
        self.set_tape(word, 0)?;
        let outcome = self.run(max_steps)?;

        Ok(match outcome {
            RunResult::StepLimitReached => Acceptance::Undetermined,
            RunResult::Halted | RunResult::NoTransition => {
                if self.is_at_final_state() {
                    Acceptance::Accepted
                } else {
                    Acceptance::Rejected
                }
            }
        })
    }

    /// Attaches an observer. Attaching the same observer twice is a no-op.
    pub fn attach_observer(&mut self, observer: ObserverHandle) {
        if self.observers.iter().any(|o| Rc::ptr_eq(o, &observer)) {
            return;
        }
        self.observers.push(observer);
    }

    /// Detaches an observer. Detaching an absent observer is a no-op.
    pub fn detach_observer(&mut self, observer: &ObserverHandle) {
        self.observers.retain(|o| !Rc::ptr_eq(o, observer));
    }

    pub fn definition(&self) -> &MachineDefinition {
        &self.definition
    }

    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    pub fn blank_symbol(&self) -> char {
        self.definition.blank_symbol()
    }

    pub fn halt_state(&self) -> &str {
        self.definition.halt_state()
    }

    pub fn initial_state(&self) -> &str {
        self.definition.initial_state()
    }

    /// Returns the symbol at the given tape index, or the blank symbol for any
    /// out-of-range index. Never mutates the tape.
    pub fn symbol_at(&self, pos: isize) -> char {
        match &self.tape {
            Some(tape) if pos >= 0 && (pos as usize) < tape.len() => tape[pos as usize],
            _ => self.definition.blank_symbol(),
        }
    }

    /// Returns the length of the internal tape representation (0 when unset).
    pub fn tape_len(&self) -> usize {
        self.tape.as_ref().map_or(0, Vec::len)
    }

    pub fn head_position(&self) -> usize {
        self.head
    }

    /// Returns a forward iterator over the tape contents.
    ///
    /// Fails with [`ExecutionError::TapeNotSet`] when no tape is set.
    pub fn tape_iter(&self) -> Result<impl Iterator<Item = char> + '_, ExecutionError> {
        self.tape
            .as_deref()
            .map(|tape| tape.iter().copied())
            .ok_or(ExecutionError::TapeNotSet)
    }

    /// Returns the number of successfully executed steps since creation or the
    /// last [`reset_steps`](Self::reset_steps).
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn reset_steps(&mut self) {
        self.steps = 0;
    }

    pub fn is_at_halt_state(&self) -> bool {
        self.current_state == self.definition.halt_state()
    }

    pub fn is_at_final_state(&self) -> bool {
        self.definition.is_final_state(&self.current_state)
    }

    pub fn is_tape_set(&self) -> bool {
        self.tape.is_some()
    }
}
