// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::fmt;
use std::sync::Arc;

use crate::matches::Match;
use crate::Value;

/// A computed member of an [`Extension`].
pub type Member = Arc<dyn Fn(&Match<'_, '_>) -> Value + Send + Sync>;

/// Behavior attached to a rule and made available on its matches.
///
/// An extension is a table of named members. When several rules contribute to the same match
/// (an alias and its target, a label and the labeled rule), the member of the outermost rule wins.
///
/// # Examples
///
/// ```
/// # use packrat::{Extension, GrammarBuilder, Value};
/// # use packrat::expr::pattern;
/// let digits = Extension::new().value(|m| Value::from(m.text().len()));
/// let grammar = GrammarBuilder::new("Digits")
///     .rule("digits", pattern("[0-9]+").extend(digits))
///     .build()
///     .unwrap();
///
/// assert_eq!(grammar.parse("1234").unwrap().value(), Value::from(4));
/// ```
#[derive(Clone, Default)]
pub struct Extension {
    members: Vec<(String, Member)>,
}

impl Extension {
    /// Creates an empty `Extension`.
    pub fn new() -> Extension {
        Extension::default()
    }

    /// Adds, or replaces, the member `name`.
    pub fn member<F>(mut self, name: &str, f: F) -> Extension
    where
        F: Fn(&Match<'_, '_>) -> Value + Send + Sync + 'static,
    {
        self.insert(name, Arc::new(f));
        self
    }

    /// Adds, or replaces, the `value` member.
    pub fn value<F>(self, f: F) -> Extension
    where
        F: Fn(&Match<'_, '_>) -> Value + Send + Sync + 'static,
    {
        self.member("value", f)
    }

    /// Returns the member `name`.
    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, f)| f)
    }

    /// Returns the names of the members, in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(name, _)| name.as_str())
    }

    /// Returns `true` if the extension has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    // Members of `outer` replace the ones of the same name.
    pub(crate) fn merge(&mut self, outer: &Extension) {
        for (name, f) in &outer.members {
            self.insert(name, f.clone());
        }
    }

    fn insert(&mut self, name: &str, f: Member) {
        match self.members.iter_mut().find(|(member, _)| member == name) {
            Some(slot) => slot.1 = f,
            None => self.members.push((name.to_owned(), f)),
        }
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
