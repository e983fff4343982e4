// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Types for errors

use std::fmt;

use crate::position::Position;

/// Why a parse failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseErrorKind {
    /// The root rule did not match.
    NoMatch,
    /// The root rule matched but the input was not fully consumed.
    Incomplete,
    /// The call limit was exhausted.
    CallLimit,
    /// Rule executions nested deeper than the depth limit allows.
    DepthLimit,
    /// The start offset is past the end of the input or not on a `char` boundary.
    InvalidOffset,
    /// The requested root rule does not exist.
    UnknownRule(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParseErrorKind::NoMatch => write!(f, "no match for the root rule"),
            ParseErrorKind::Incomplete => write!(f, "input was not fully consumed"),
            ParseErrorKind::CallLimit => write!(f, "call limit reached"),
            ParseErrorKind::DepthLimit => write!(f, "depth limit reached"),
            ParseErrorKind::InvalidOffset => {
                write!(f, "start offset is not a valid position in the input")
            }
            ParseErrorKind::UnknownRule(ref name) => write!(f, "rule {} is undefined", name),
        }
    }
}

/// Parse-related error type.
///
/// `failure_offset` is the furthest byte offset any attempted rule reached, which is usually the
/// most useful place to point at.
///
/// # Examples
///
/// ```
/// # use packrat::{GrammarBuilder, ParseErrorKind};
/// # use packrat::expr::seq;
/// let grammar = GrammarBuilder::new("AB")
///     .rule("ab", seq(["a".into(), "b".into()]))
///     .build()
///     .unwrap();
///
/// let error = grammar.parse("ac").unwrap_err();
///
/// assert_eq!(error.kind, ParseErrorKind::NoMatch);
/// assert_eq!(error.failure_offset, 1);
/// assert_eq!(error.line_number, 1);
/// assert_eq!(error.column_offset, 1);
/// assert_eq!(error.line_text, "ac");
/// assert_eq!(error.pointer(), " ^");
/// ```
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub struct ParseError {
    /// Why the parse failed.
    pub kind: ParseErrorKind,
    /// Byte offset of the failure.
    pub failure_offset: usize,
    /// Line of the failure, starting at 1.
    pub line_number: usize,
    /// Column of the failure in `char`s, starting at 0.
    pub column_offset: usize,
    /// The line of the failure, without its line terminator.
    pub line_text: String,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, input: &str, failure_offset: usize) -> ParseError {
        let (line_number, column_offset, line_text) = match Position::new(input, failure_offset) {
            Some(position) => {
                let (line, col) = position.line_col();
                (line, col - 1, position.line_of().to_owned())
            }
            None => (1, 0, String::new()),
        };

        ParseError {
            kind,
            failure_offset,
            line_number,
            column_offset,
            line_text,
        }
    }

    /// Returns a line with a caret under the failing column of `line_text`.
    pub fn pointer(&self) -> String {
        let mut pointer: String = self
            .line_text
            .chars()
            .take(self.column_offset)
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        pointer.push('^');

        pointer
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.line_number.to_string();
        let spacing = " ".repeat(line.len());

        writeln!(f, "{}--> {}:{}", spacing, line, self.column_offset + 1)?;
        writeln!(f, "{} |", spacing)?;
        writeln!(f, "{} | {}", line, self.line_text)?;
        writeln!(f, "{} | {}", spacing, self.pointer())?;
        writeln!(f, "{} |", spacing)?;
        write!(f, "{} = {}", spacing, self.kind)
    }
}

/// Errors reported while building a [`Grammar`](crate::Grammar).
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// An alias names a rule that neither the grammar nor its inclusions define.
    #[error("rule {rule} of grammar {grammar} refers to undefined rule {name}")]
    UndefinedRule {
        /// The grammar being built.
        grammar: String,
        /// The rule containing the alias.
        rule: String,
        /// The missing name.
        name: String,
    },
    /// A super reference names a rule none of the inclusions define.
    #[error("rule {rule} of grammar {grammar} refers to {name}, which no included grammar defines")]
    UndefinedSuper {
        /// The grammar being built.
        grammar: String,
        /// The rule containing the super reference.
        rule: String,
        /// The missing name.
        name: String,
    },
    /// The root names an undefined rule.
    #[error("root {name} of grammar {grammar} is undefined")]
    UndefinedRoot {
        /// The grammar being built.
        grammar: String,
        /// The missing name.
        name: String,
    },
    /// A rule name is defined twice.
    #[error("rule {name} is defined more than once in grammar {grammar}")]
    DuplicateRule {
        /// The grammar being built.
        grammar: String,
        /// The duplicated name.
        name: String,
    },
    /// A pattern is not a valid regular expression.
    #[error("rule {rule} of grammar {grammar} has an invalid pattern")]
    InvalidPattern {
        /// The grammar being built.
        grammar: String,
        /// The rule containing the pattern.
        rule: String,
        /// Why the pattern was rejected.
        #[source]
        source: regex::Error,
    },
    /// A range ends before it starts.
    #[error("rule {rule} of grammar {grammar} has an empty range {start:?}..{end:?}")]
    InvalidRange {
        /// The grammar being built.
        grammar: String,
        /// The rule containing the range.
        rule: String,
        /// Start of the range.
        start: char,
        /// End of the range.
        end: char,
    },
    /// A repetition allows no matches or has `min > max`.
    #[error("rule {rule} of grammar {grammar} repeats between {min} and {max} times")]
    InvalidRepeat {
        /// The grammar being built.
        grammar: String,
        /// The rule containing the repetition.
        rule: String,
        /// Minimum number of repetitions.
        min: usize,
        /// Maximum number of repetitions.
        max: usize,
    },
    /// The grammar neither defines nor includes any rule.
    #[error("grammar {grammar} has no rules")]
    EmptyGrammar {
        /// The grammar being built.
        grammar: String,
    },
    /// A sequence or choice has no children.
    #[error("rule {rule} of grammar {grammar} contains an empty {kind}")]
    EmptyRule {
        /// The grammar being built.
        grammar: String,
        /// The rule containing the empty expression.
        rule: String,
        /// `"sequence"` or `"choice"`.
        kind: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display() {
        let error = ParseError::new(ParseErrorKind::NoMatch, "ab\ncd\nef", 4);

        assert_eq!(
            format!("{}", error),
            vec![
                " --> 2:2",
                "  |",
                "2 | cd",
                "  |  ^",
                "  |",
                "  = no match for the root rule",
            ]
            .join("\n")
        );
    }

    #[test]
    fn columns_count_chars() {
        let error = ParseError::new(ParseErrorKind::Incomplete, "a嗨b", 4);

        assert_eq!(error.line_number, 1);
        assert_eq!(error.column_offset, 2);
        assert_eq!(error.pointer(), "  ^");
    }

    #[test]
    fn crlf() {
        let error = ParseError::new(ParseErrorKind::NoMatch, "ab\r\ncd", 5);

        assert_eq!(error.line_number, 2);
        assert_eq!(error.column_offset, 1);
        assert_eq!(error.line_text, "cd");
    }

    #[test]
    fn end_of_input() {
        let error = ParseError::new(ParseErrorKind::NoMatch, "ab\n", 3);

        assert_eq!(error.line_number, 2);
        assert_eq!(error.column_offset, 0);
        assert_eq!(error.line_text, "");

        let error = ParseError::new(ParseErrorKind::NoMatch, "", 0);

        assert_eq!(error.line_number, 1);
        assert_eq!(error.line_text, "");
    }

    #[test]
    fn tabs_are_kept_in_pointer() {
        let error = ParseError::new(ParseErrorKind::NoMatch, "\tx", 1);

        assert_eq!(error.pointer(), "\t^");
    }

    #[test]
    fn kind_messages() {
        assert_eq!(
            ParseErrorKind::UnknownRule("sum".to_owned()).to_string(),
            "rule sum is undefined"
        );
        assert_eq!(ParseErrorKind::CallLimit.to_string(), "call limit reached");
        assert_eq!(ParseErrorKind::DepthLimit.to_string(), "depth limit reached");
    }
}
