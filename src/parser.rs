//! This module provides the line-oriented parser for machine descriptions. Each
//! line holds one directive; the parser recognizes it and feeds the accumulated
//! elements into a [`MachineBuilder`].
//!
//! The accepted directives are:
//!
//! ```text
//! % a comment line
//! INITIAL <state>
//! BLANK <symbol>
//! FINAL <state>
//! HALT <state>
//! <state>, <symbol> -> <state>, <symbol>, <movement>
//! ```
//!
//! Movements are `>` (right), `<` (left), and `_` (none). Whitespace around
//! tokens is insignificant; blank lines are skipped; comments must stand on
//! their own line.

use regex::Regex;
use thiserror::Error;

use crate::builder::MachineBuilder;
use crate::types::{BuildError, Directive, MachineDefinition, Movement};

/// Errors raised while parsing a whole description, carrying the 1-based line
/// number and the raw offending line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line matched no directive pattern.
    #[error("line {line}: unrecognized directive: {text}")]
    UnrecognizedLine { line: usize, text: String },
    /// A singleton directive (INITIAL, BLANK, HALT) appeared a second time.
    #[error("line {line}: {directive} can only be defined once")]
    DuplicateDirective {
        line: usize,
        text: String,
        directive: Directive,
    },
    /// The directive was recognized but the builder rejected its content.
    #[error("line {line}: {source}")]
    Build {
        line: usize,
        #[source]
        source: BuildError,
    },
}

/// Errors raised by [`DescriptionParser::parse_line`], before any line number
/// is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("unrecognized directive")]
    Unrecognized,
    #[error("{0} can only be defined once")]
    Duplicate(Directive),
    #[error(transparent)]
    Build(#[from] BuildError),
}

impl LineError {
    fn at(self, line: usize, text: &str) -> ParseError {
        match self {
            LineError::Unrecognized => ParseError::UnrecognizedLine {
                line,
                text: text.to_owned(),
            },
            LineError::Duplicate(directive) => ParseError::DuplicateDirective {
                line,
                text: text.to_owned(),
                directive,
            },
            LineError::Build(source) => ParseError::Build { line, source },
        }
    }
}

/// Recognizes machine descriptions line by line and forwards the directives to
/// an internal [`MachineBuilder`].
///
/// Each parser owns its compiled patterns, so multiple parser instances stay
/// fully independent.
pub struct DescriptionParser {
    builder: MachineBuilder,
    transition_re: Regex,
    comment_re: Regex,
    final_re: Regex,
    initial_re: Regex,
    blank_re: Regex,
    halt_re: Regex,
}

impl DescriptionParser {
    pub fn new() -> Self {
        // Hard-coded patterns; compilation cannot fail.
        let compile = |pattern: &str| Regex::new(pattern).expect("invalid directive pattern");

        Self {
            builder: MachineBuilder::new(),
            transition_re: compile(
                r"^\s*(?P<state>\w+)\s*,\s*(?P<symbol>.)\s*->\s*(?P<new_state>\w+)\s*,\s*(?P<new_symbol>.)\s*,\s*(?P<movement>[<>_])\s*$",
            ),
            comment_re: compile(r"^\s*%"),
            final_re: compile(r"^\s*FINAL\s+(?P<state>\w+)\s*$"),
            initial_re: compile(r"^\s*INITIAL\s+(?P<state>\w+)\s*$"),
            blank_re: compile(r"^\s*BLANK\s+(?P<symbol>.)\s*$"),
            halt_re: compile(r"^\s*HALT\s+(?P<state>\w+)\s*$"),
        }
    }

    /// Parses a whole description, skipping blank lines and aborting at the
    /// first failing line.
    pub fn parse_string(&mut self, text: &str) -> Result<(), ParseError> {
        let mut parsed = 0usize;
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            self.parse_line(line).map_err(|e| e.at(index + 1, line))?;
            parsed += 1;
        }

        log::debug!("parsed machine description: {} directive lines", parsed);
        Ok(())
    }

    /// Parses a single directive line.
    ///
    /// The patterns are tried in a fixed precedence order: transition first
    /// (the most common line by far), then comment, final, initial, blank, and
    /// halt. The first match wins; transitions are unambiguous thanks to the
    /// `->` token, so the ordering only buys cheap dispatch.
    pub fn parse_line(&mut self, line: &str) -> Result<(), LineError> {
        if let Some(caps) = self.transition_re.captures(line) {
            let movement = match &caps["movement"] {
                "<" => Movement::Left,
                ">" => Movement::Right,
                _ => Movement::None,
            };
            self.builder.add_transition(
                &caps["state"],
                &caps["symbol"],
                &caps["new_state"],
                &caps["new_symbol"],
                movement,
            )?;
            return Ok(());
        }

        if self.comment_re.is_match(line) {
            return Ok(());
        }

        if let Some(caps) = self.final_re.captures(line) {
            self.builder.add_final_state(&caps["state"]);
            return Ok(());
        }

        if let Some(caps) = self.initial_re.captures(line) {
            if self.builder.has_initial_state() {
                return Err(LineError::Duplicate(Directive::Initial));
            }
            self.builder.set_initial_state(&caps["state"])?;
            return Ok(());
        }

        if let Some(caps) = self.blank_re.captures(line) {
            if self.builder.has_blank_symbol() {
                return Err(LineError::Duplicate(Directive::Blank));
            }
            self.builder.set_blank_symbol(&caps["symbol"])?;
            return Ok(());
        }

        if let Some(caps) = self.halt_re.captures(line) {
            if self.builder.has_halt_state() {
                return Err(LineError::Duplicate(Directive::Halt));
            }
            self.builder.set_halt_state(&caps["state"]);
            return Ok(());
        }

        Err(LineError::Unrecognized)
    }

    /// Discards everything parsed so far, as when parsing is restarted.
    pub fn clean(&mut self) {
        self.builder.clean();
    }

    /// Finalizes the parsed description into a [`MachineDefinition`].
    pub fn create(&mut self) -> Result<MachineDefinition, BuildError> {
        self.builder.create()
    }
}

impl Default for DescriptionParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVEN_ZEROS: &str = "\
% Accepts words with an even number of 0s
  % Another comment line
HALT HALT
BLANK #
INITIAL 1
FINAL 2
1, 0 -> 2, 1, >
1, 1 -> 2, 0, >
2, 0 -> 1, 0, _
 2,1->3,1,>
3, 0 -> HALT, 0, _
3, 1 -> HALT, 1, _
3, # -> HALT, #, _
";

    fn parse(text: &str) -> Result<MachineDefinition, ParseError> {
        let mut parser = DescriptionParser::new();
        parser.parse_string(text)?;
        Ok(parser.create().expect("description should finalize"))
    }

    #[test]
    fn test_parse_canonical_description() {
        let definition = parse(EVEN_ZEROS).unwrap();

        assert_eq!(definition.initial_state(), "1");
        assert_eq!(definition.halt_state(), "HALT");
        assert_eq!(definition.blank_symbol(), '#');
        assert!(definition.is_final_state("2"));
        assert_eq!(definition.states().len(), 4);

        // Whitespace around tokens is insignificant.
        let action = definition.transition("2", '1').unwrap();
        assert_eq!(action.state, "3");
        assert_eq!(action.movement, Movement::Right);

        let action = definition.transition("3", '#').unwrap();
        assert_eq!(action.state, "HALT");
        assert_eq!(action.movement, Movement::None);
    }

    #[test]
    fn test_parse_utf8_symbols() {
        let text = "\
HALT H
BLANK 🕴
INITIAL 1
1, 0 -> H, 🕴, >
";
        let definition = parse(text).unwrap();
        assert_eq!(definition.blank_symbol(), '🕴');

        let action = definition.transition("1", '0').unwrap();
        assert_eq!(action.symbol, '🕴');
    }

    #[test]
    fn test_unrecognized_line_is_numbered() {
        let mut parser = DescriptionParser::new();
        let result = parser.parse_string("1,0->2,1,>\nBOGUS\n");

        assert_eq!(
            result.unwrap_err(),
            ParseError::UnrecognizedLine {
                line: 2,
                text: "BOGUS".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_movement_is_unrecognized() {
        let mut parser = DescriptionParser::new();
        let result = parser.parse_string("1, 0 -> 2, 1, ^\n");

        assert!(matches!(
            result.unwrap_err(),
            ParseError::UnrecognizedLine { line: 1, .. }
        ));
    }

    #[test]
    fn test_duplicate_initial_state() {
        let mut parser = DescriptionParser::new();
        let result = parser.parse_string("INITIAL 1\nINITIAL 2\n");

        assert_eq!(
            result.unwrap_err(),
            ParseError::DuplicateDirective {
                line: 2,
                text: "INITIAL 2".to_string(),
                directive: Directive::Initial,
            }
        );
    }

    #[test]
    fn test_duplicate_blank_symbol() {
        let mut parser = DescriptionParser::new();
        let result = parser.parse_string("BLANK #\nBLANK -\n");

        assert!(matches!(
            result.unwrap_err(),
            ParseError::DuplicateDirective {
                line: 2,
                directive: Directive::Blank,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_halt_state() {
        let mut parser = DescriptionParser::new();
        let result = parser.parse_string("HALT H\nHALT H2\n");

        assert!(matches!(
            result.unwrap_err(),
            ParseError::DuplicateDirective {
                line: 2,
                directive: Directive::Halt,
                ..
            }
        ));
    }

    #[test]
    fn test_blank_lines_and_comments_are_skipped() {
        let mut parser = DescriptionParser::new();
        parser
            .parse_string("\n   \n% comment\nINITIAL 1\n\n")
            .unwrap();
    }

    #[test]
    fn test_halt_directive_wins_over_state_named_halt() {
        // "HALT HALT" is the halt directive, not a transition.
        let mut parser = DescriptionParser::new();
        parser.parse_string("HALT HALT\n").unwrap();

        // A transition whose source state is named HALT still parses as a
        // transition thanks to the `->` token.
        parser.parse_line("HALT, 0 -> HALT, 0, _").unwrap();
    }

    #[test]
    fn test_parse_line_reports_errors_without_line_numbers() {
        let mut parser = DescriptionParser::new();
        assert_eq!(
            parser.parse_line("gibberish").unwrap_err(),
            LineError::Unrecognized
        );

        parser.parse_line("INITIAL 1").unwrap();
        assert_eq!(
            parser.parse_line("INITIAL 2").unwrap_err(),
            LineError::Duplicate(Directive::Initial)
        );
    }

    #[test]
    fn test_clean_restarts_parsing() {
        let mut parser = DescriptionParser::new();
        parser.parse_string("INITIAL 1\nBLANK #\n").unwrap();
        parser.clean();

        // The singleton directives are accepted again after a clean.
        parser.parse_string(EVEN_ZEROS).unwrap();
        assert!(parser.create().is_ok());
    }

    #[test]
    fn test_create_without_directives_fails() {
        let mut parser = DescriptionParser::new();
        parser.parse_string("1, 0 -> 2, 1, >\n").unwrap();
        assert_eq!(parser.create().unwrap_err(), BuildError::MissingInitialState);
    }

    #[test]
    fn test_parsers_are_independent() {
        let mut first = DescriptionParser::new();
        let mut second = DescriptionParser::new();

        first.parse_string("INITIAL 1\n").unwrap();
        second.parse_string("INITIAL 9\n").unwrap();
        second.parse_string("BLANK #\nHALT H\n").unwrap();

        let definition = second.create().unwrap();
        assert_eq!(definition.initial_state(), "9");
    }
}
