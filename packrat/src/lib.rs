// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! # packrat
//!
//! An embeddable parsing expression grammar (PEG) engine. Grammars are built at runtime out of
//! composable rules, executed against input text by a backtracking [`Input`], and the result is
//! handed back as a lazily reconstructed [`Match`] tree.
//!
//! ```
//! use packrat::expr::{alias, pattern, rep, seq};
//! use packrat::GrammarBuilder;
//!
//! let grammar = GrammarBuilder::new("List")
//!     .rule("list", seq([alias("item"), rep(seq([",".into(), alias("item")]), 0, None)]))
//!     .rule("item", pattern("[a-z]+"))
//!     .build()
//!     .unwrap();
//!
//! let list = grammar.parse("ab,cd").unwrap();
//! let items: Vec<_> = list.find("item", true).iter().map(|m| m.text()).collect();
//!
//! assert_eq!(items, vec!["ab", "cd"]);
//! ```
//!
//! ## Event stream
//!
//! While matching, rules never allocate tree nodes. Every successful rule appends
//! `[Open(rule), children.., Close, Length(n)]` to one flat buffer and a failed attempt truncates
//! the buffer back to where it started. [`Match`] walks that buffer on demand.
//!
//! ## Memoization
//!
//! [`ParseOptions::memoize`] swaps the plain [`StringInput`] for a [`MemoizedInput`] which
//! records the events of every `(rule, position)` pair, failures included, so that no rule is
//! ever evaluated twice at the same position.

#![doc(html_root_url = "https://docs.rs/packrat")]

pub use crate::error::{GrammarError, ParseError, ParseErrorKind};
pub use crate::event::{Event, Events};
pub use crate::expr::Expr;
pub use crate::extension::{Extension, Member};
pub use crate::grammar::{Grammar, GrammarBuilder};
pub use crate::input::{CacheStats, Cursor, Input, MemoizedInput, StringInput};
pub use crate::matches::Match;
pub use crate::options::{ParseOptions, DEFAULT_MAX_DEPTH};
pub use crate::position::Position;
pub use crate::rule::{Matcher, Rule, RuleHandle, RuleId, RuleKind};

/// Values computed by [`Extension`] members.
pub use serde_json::Value;

pub mod error;
mod event;
pub mod expr;
mod extension;
mod grammar;
mod input;
#[doc(hidden)]
pub mod macros;
mod matches;
mod options;
mod position;
mod rule;
