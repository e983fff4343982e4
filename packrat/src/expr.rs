// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Expressions describing rules before they are lowered into a [`Grammar`](crate::Grammar).
//!
//! Strings convert into case-sensitive literals, so `seq(["(".into(), alias("sum"), ")".into()])`
//! reads close to the usual PEG notation `"(" sum ")"`.

use crate::extension::Extension;
use crate::matches::Match;
use crate::Value;

/// A rule expression.
#[derive(Clone, Debug)]
pub enum Expr {
    /// A fixed string.
    Str {
        /// The string to match.
        literal: String,
        /// Whether ASCII case is ignored.
        case_insensitive: bool,
    },
    /// A regular expression, anchored at the cursor.
    Pattern(String),
    /// A character in the inclusive range.
    Range(char, char),
    /// Any character.
    Any,
    /// The end of the input.
    EndOfInput,
    /// All expressions, in order.
    Seq(Vec<Expr>),
    /// The first expression that matches.
    Choice(Vec<Expr>),
    /// Between `min` and `max` repetitions.
    Repeat {
        /// The repeated expression.
        expr: Box<Expr>,
        /// Minimum number of repetitions.
        min: usize,
        /// Maximum number of repetitions, unbounded when `None`.
        max: Option<usize>,
    },
    /// Positive lookahead.
    And(Box<Expr>),
    /// Negative lookahead.
    Not(Box<Expr>),
    /// Everything up to the expression.
    But(Box<Expr>),
    /// Another rule, by name.
    Alias(String),
    /// The rule of the given name, or of the name of the rule being defined, in the included
    /// grammars.
    Super(Option<String>),
    /// A labeled expression.
    Label(Box<Expr>, String),
    /// An expression with an extension attached.
    Extend(Box<Expr>, Extension),
}

impl Expr {
    /// Labels the expression; the label is added to the names of its match.
    pub fn label(self, label: &str) -> Expr {
        Expr::Label(Box::new(self), label.to_owned())
    }

    /// Attaches `extension` to the rule the expression lowers to.
    pub fn extend(self, extension: Extension) -> Expr {
        match self {
            Expr::Extend(expr, mut current) => {
                current.merge(&extension);
                Expr::Extend(expr, current)
            }
            expr => Expr::Extend(Box::new(expr), extension),
        }
    }

    /// Attaches a `value` member computed by `f`.
    pub fn value<F>(self, f: F) -> Expr
    where
        F: Fn(&Match<'_, '_>) -> Value + Send + Sync + 'static,
    {
        self.extend(Extension::new().value(f))
    }
}

impl From<&str> for Expr {
    fn from(string: &str) -> Expr {
        literal(string)
    }
}

impl From<String> for Expr {
    fn from(literal: String) -> Expr {
        Expr::Str {
            literal,
            case_insensitive: false,
        }
    }
}

/// Matches `string` exactly.
pub fn literal(string: &str) -> Expr {
    Expr::from(string.to_owned())
}

/// Matches `string` ignoring case. Characters are compared one at a time after lowercasing, so
/// `insensitive("straße")` matches `"STRAßE"` but not `"STRASSE"`.
pub fn insensitive(string: &str) -> Expr {
    Expr::Str {
        literal: string.to_owned(),
        case_insensitive: true,
    }
}

/// Matches the regular expression `pattern` at the cursor.
pub fn pattern(pattern: &str) -> Expr {
    Expr::Pattern(pattern.to_owned())
}

/// Matches one character between `start` and `end`, inclusive.
pub fn range(start: char, end: char) -> Expr {
    Expr::Range(start, end)
}

/// Matches any one character.
pub fn any() -> Expr {
    Expr::Any
}

/// Matches the end of the input.
pub fn eoi() -> Expr {
    Expr::EndOfInput
}

/// Matches every expression in order.
pub fn seq<I: IntoIterator<Item = Expr>>(exprs: I) -> Expr {
    Expr::Seq(exprs.into_iter().collect())
}

/// Matches the first of `exprs` that matches.
pub fn choice<I: IntoIterator<Item = Expr>>(exprs: I) -> Expr {
    Expr::Choice(exprs.into_iter().collect())
}

/// Matches `expr` between `min` and `max` times.
pub fn rep(expr: Expr, min: usize, max: Option<usize>) -> Expr {
    Expr::Repeat {
        expr: Box::new(expr),
        min,
        max,
    }
}

/// Matches `expr` zero or more times.
pub fn zero_or_more(expr: Expr) -> Expr {
    rep(expr, 0, None)
}

/// Matches `expr` one or more times.
pub fn one_or_more(expr: Expr) -> Expr {
    rep(expr, 1, None)
}

/// Matches `expr` or nothing.
pub fn opt(expr: Expr) -> Expr {
    rep(expr, 0, Some(1))
}

/// Succeeds, without consuming anything, if `expr` matches.
pub fn and(expr: Expr) -> Expr {
    Expr::And(Box::new(expr))
}

/// Succeeds, without consuming anything, if `expr` does not match.
pub fn not(expr: Expr) -> Expr {
    Expr::Not(Box::new(expr))
}

/// Matches at least one character, up to where `expr` matches or the input ends.
pub fn but(expr: Expr) -> Expr {
    Expr::But(Box::new(expr))
}

/// Refers to the rule `name`.
pub fn alias(name: &str) -> Expr {
    Expr::Alias(name.to_owned())
}

/// Refers to the previous definition of the rule being defined.
pub fn sup() -> Expr {
    Expr::Super(None)
}

/// Refers to the rule `name` of the included grammars.
pub fn sup_named(name: &str) -> Expr {
    Expr::Super(Some(name.to_owned()))
}
