// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::fmt;

use crate::rule::Rule;

// A successful rule is encoded as `Open(rule)`, the events of its children, `Close` and finally
// `Length(n)`. This keeps the hot path of the parser down to pushes and truncations on a single
// `Vec`; no tree is built until a `Match` is actually walked.
//
// `Open` holds a reference into the rule arena of a grammar, which doubles as the identity of the
// rule for the memoization cache.

/// One entry of the flat event stream produced while matching.
#[derive(Clone, Copy)]
pub enum Event<'g> {
    /// A rule started matching; everything up to its `Close` belongs to it.
    Open(&'g Rule),
    /// The most recently opened rule finished matching.
    Close,
    /// The number of bytes consumed by the rule that was just closed.
    Length(usize),
}

impl<'g> Event<'g> {
    pub(crate) fn rule(&self) -> Option<&'g Rule> {
        match *self {
            Event::Open(rule) => Some(rule),
            _ => None,
        }
    }

    pub(crate) fn length(&self) -> usize {
        match *self {
            Event::Length(length) => length,
            _ => unreachable!("a Close event is always followed by its Length"),
        }
    }
}

impl<'g> PartialEq for Event<'g> {
    fn eq(&self, other: &Event<'g>) -> bool {
        match (*self, *other) {
            (Event::Open(a), Event::Open(b)) => std::ptr::eq(a, b),
            (Event::Close, Event::Close) => true,
            (Event::Length(a), Event::Length(b)) => a == b,
            _ => false,
        }
    }
}

impl<'g> Eq for Event<'g> {}

impl<'g> fmt::Debug for Event<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Event::Open(rule) => write!(f, "Open({})", rule.name().unwrap_or("<anonymous>")),
            Event::Close => write!(f, "Close"),
            Event::Length(length) => write!(f, "Length({})", length),
        }
    }
}

/// The append-only buffer rules write their events to.
pub type Events<'g> = Vec<Event<'g>>;

/// Appends the events of a rule without children.
#[inline]
pub(crate) fn push_leaf<'g>(events: &mut Events<'g>, rule: &'g Rule, length: usize) -> usize {
    events.push(Event::Open(rule));
    events.push(Event::Close);
    events.push(Event::Length(length));
    length
}

/// Closes the rule opened at the start of the current attempt.
#[inline]
pub(crate) fn close(events: &mut Events<'_>, length: usize) -> usize {
    events.push(Event::Close);
    events.push(Event::Length(length));
    length
}
