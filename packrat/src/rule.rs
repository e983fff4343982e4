// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::event::{self, Event, Events};
use crate::extension::Extension;
use crate::grammar::{Grammar, Target};
use crate::input::Input;

/// Index of a [`Rule`] in the arena of the [`Grammar`] that defines it.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RuleId(pub(crate) u32);

impl RuleId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The single-step matchers a [`RuleKind::Terminal`] can be made of.
#[derive(Debug)]
pub enum Matcher {
    /// A regular expression anchored at the cursor. Matches greedily.
    Pattern(Regex),
    /// A single character inside the inclusive range.
    Range(char, char),
    /// Any single character.
    Any,
    /// Matches, without consuming anything, only at the end of the input.
    EndOfInput,
}

impl Matcher {
    /// Returns the number of bytes matched at the start of `rest`.
    pub fn match_at(&self, rest: &str) -> Option<usize> {
        match *self {
            Matcher::Pattern(ref regex) => regex.find(rest).map(|m| m.end()),
            Matcher::Range(start, end) => match rest.chars().next() {
                Some(c) if start <= c && c <= end => Some(c.len_utf8()),
                _ => None,
            },
            Matcher::Any => rest.chars().next().map(char::len_utf8),
            Matcher::EndOfInput => {
                if rest.is_empty() {
                    Some(0)
                } else {
                    None
                }
            }
        }
    }
}

// Compares one character at a time under simple case folding, so the matched part of `rest` can
// differ from `literal` in length. Returns its length in bytes.
fn match_insensitive(rest: &str, literal: &str) -> Option<usize> {
    let mut chars = rest.char_indices();

    for expected in literal.chars() {
        let (_, found) = chars.next()?;
        if !expected.to_lowercase().eq(found.to_lowercase()) {
            return None;
        }
    }

    Some(chars.next().map_or(rest.len(), |(index, _)| index))
}

/// A reference to another rule by name. Both [`RuleKind::Alias`] and [`RuleKind::Super`] are
/// proxies; they only differ in where the name is looked up.
pub struct Proxy {
    name: String,
    target: OnceLock<Target>,
}

impl Proxy {
    pub(crate) fn new(name: String) -> Proxy {
        Proxy {
            name,
            target: OnceLock::new(),
        }
    }

    /// Returns the name of the rule this proxy stands for.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn bind(&self, target: Target) {
        // Rules are lowered and bound once, while their grammar is being built.
        let _ = self.target.set(target);
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.target.get().is_some()
    }

    fn resolve<'g>(&'g self, grammar: &'g Grammar) -> RuleHandle<'g> {
        match self.target.get() {
            Some(target) => grammar.resolve(target),
            None => unreachable!("proxy {} was not bound when its grammar was built", self.name),
        }
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Proxy").field(&self.name).finish()
    }
}

/// The closed set of rule variants.
#[derive(Debug)]
pub enum RuleKind {
    /// Matches one [`Matcher`] at the cursor.
    Terminal(Matcher),
    /// Matches a fixed string, optionally ignoring case.
    StringTerminal {
        /// The string to match.
        literal: String,
        /// Whether case is ignored, one character at a time.
        case_insensitive: bool,
    },
    /// Matches every child in order or nothing at all.
    Sequence(Vec<RuleId>),
    /// Matches the first child that matches.
    Choice(Vec<RuleId>),
    /// Matches its child greedily between `min` and `max` times.
    Repeat {
        /// The repeated rule.
        rule: RuleId,
        /// Minimum number of repetitions.
        min: usize,
        /// Maximum number of repetitions, unbounded when `None`.
        max: Option<usize>,
    },
    /// Succeeds without consuming input if its child matches.
    AndPredicate(RuleId),
    /// Succeeds without consuming input if its child does not match.
    NotPredicate(RuleId),
    /// Consumes characters until its child matches.
    ButPredicate(RuleId),
    /// Stands for a rule of the owning grammar or one of its inclusions.
    Alias(Proxy),
    /// Stands for a rule of the same name in one of the included grammars.
    Super(Proxy),
    /// Adds [`Rule::label`] to whatever its child matches.
    Label(RuleId),
}

/// A matching rule.
///
/// Rules live in the arena of the [`Grammar`] that defined them and never move once the grammar
/// is built; their address is their identity.
#[derive(Debug)]
pub struct Rule {
    kind: RuleKind,
    name: Option<String>,
    label: Option<String>,
    extension: Option<Extension>,
}

impl Rule {
    pub(crate) fn new(kind: RuleKind) -> Rule {
        Rule {
            kind,
            name: None,
            label: None,
            extension: None,
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = Some(label);
    }

    pub(crate) fn extend(&mut self, extension: &Extension) {
        match self.extension {
            Some(ref mut current) => current.merge(extension),
            None => self.extension = Some(extension.clone()),
        }
    }

    /// Returns the variant of the rule.
    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Returns the name the rule was defined under, if it is a top-level rule of its grammar.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the capture label of the rule.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the extension attached to the rule.
    pub fn extension(&self) -> Option<&Extension> {
        self.extension.as_ref()
    }

    /// Elided rules do not get a node of their own in a [`Match`](crate::Match) tree; their names
    /// and extensions are carried over to the node of the child that matched.
    pub fn is_elided(&self) -> bool {
        matches!(
            self.kind,
            RuleKind::Choice(_) | RuleKind::Alias(_) | RuleKind::Super(_) | RuleKind::Label(_)
        )
    }
}

/// A [`Rule`] together with the [`Grammar`] it belongs to, which is what its child ids and proxy
/// targets are relative to.
#[derive(Clone, Copy)]
pub struct RuleHandle<'g> {
    grammar: &'g Grammar,
    rule: &'g Rule,
}

impl<'g> RuleHandle<'g> {
    pub(crate) fn new(grammar: &'g Grammar, rule: &'g Rule) -> RuleHandle<'g> {
        RuleHandle { grammar, rule }
    }

    /// Returns the grammar that defined the rule.
    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Returns the rule.
    pub fn rule(&self) -> &'g Rule {
        self.rule
    }

    #[inline]
    fn child(self, id: RuleId) -> RuleHandle<'g> {
        RuleHandle::new(self.grammar, self.grammar.rule_at(id))
    }

    /// Runs the rule at the current position of `input`, appending its events.
    ///
    /// Returns the number of bytes matched. On failure nothing is appended and the position of
    /// `input` is left where it was. The cursor is not moved past the match; that is up to
    /// [`Input::exec`], which is the only thing that should call this.
    pub fn exec<'i, I>(self, input: &mut I, events: &mut Events<'g>) -> Option<usize>
    where
        I: Input<'g, 'i> + ?Sized,
    {
        let rule = self.rule;

        match rule.kind {
            RuleKind::Terminal(ref matcher) => {
                let length = matcher.match_at(input.cursor().rest())?;
                Some(event::push_leaf(events, rule, length))
            }
            RuleKind::StringTerminal {
                ref literal,
                case_insensitive,
            } => {
                let rest = input.cursor().rest();
                let length = if case_insensitive {
                    match_insensitive(rest, literal)?
                } else if rest.starts_with(literal.as_str()) {
                    literal.len()
                } else {
                    return None;
                };

                Some(event::push_leaf(events, rule, length))
            }
            RuleKind::Sequence(ref children) => {
                let index = events.len();
                events.push(Event::Open(rule));

                let mut length = 0;
                for &child in children {
                    match input.exec(self.child(child), events) {
                        Some(len) => length += len,
                        None => {
                            events.truncate(index);
                            return None;
                        }
                    }
                }

                Some(event::close(events, length))
            }
            RuleKind::Choice(ref children) => {
                let index = events.len();
                events.push(Event::Open(rule));

                for &child in children {
                    if let Some(length) = input.exec(self.child(child), events) {
                        return Some(event::close(events, length));
                    }
                }

                events.truncate(index);
                None
            }
            RuleKind::Repeat {
                rule: child,
                min,
                max,
            } => {
                let index = events.len();
                events.push(Event::Open(rule));

                let mut length = 0;
                let mut count = 0;
                while max.map_or(true, |max| count < max) {
                    match input.exec(self.child(child), events) {
                        Some(0) => {
                            // Every further repetition would match the same empty string.
                            count = count.max(min).max(1);
                            break;
                        }
                        Some(len) => {
                            length += len;
                            count += 1;
                        }
                        None => break,
                    }
                }

                if count >= min {
                    Some(event::close(events, length))
                } else {
                    events.truncate(index);
                    None
                }
            }
            RuleKind::AndPredicate(child) => {
                input.test(self.child(child))?;
                Some(event::push_leaf(events, rule, 0))
            }
            RuleKind::NotPredicate(child) => match input.test(self.child(child)) {
                Some(_) => None,
                None => Some(event::push_leaf(events, rule, 0)),
            },
            RuleKind::ButPredicate(child) => {
                let child = self.child(child);
                let start = input.cursor().pos();

                let mut length = 0;
                while input.test(child).is_none() {
                    match input.cursor().rest().chars().next() {
                        Some(c) => {
                            length += c.len_utf8();
                            input.cursor_mut().set_pos(start + length);
                        }
                        None => break,
                    }
                }
                input.cursor_mut().set_pos(start);

                if length > 0 {
                    Some(event::push_leaf(events, rule, length))
                } else {
                    None
                }
            }
            RuleKind::Alias(ref proxy) | RuleKind::Super(ref proxy) => {
                self.wrap(proxy.resolve(self.grammar), input, events)
            }
            RuleKind::Label(child) => self.wrap(self.child(child), input, events),
        }
    }

    // Elided rules keep their own `Open` in the stream so that the match of `inner` can be
    // attributed their names and extensions.
    #[inline]
    fn wrap<'i, I>(self, inner: RuleHandle<'g>, input: &mut I, events: &mut Events<'g>) -> Option<usize>
    where
        I: Input<'g, 'i> + ?Sized,
    {
        let index = events.len();
        events.push(Event::Open(self.rule));

        match input.exec(inner, events) {
            Some(length) => Some(event::close(events, length)),
            None => {
                events.truncate(index);
                None
            }
        }
    }
}

impl<'g> fmt::Debug for RuleHandle<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleHandle")
            .field("grammar", &self.grammar.name())
            .field("rule", &self.rule)
            .finish()
    }
}
