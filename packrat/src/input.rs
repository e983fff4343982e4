// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use log::trace;

use crate::event::{Event, Events};
use crate::options::DEFAULT_MAX_DEPTH;
use crate::rule::{Rule, RuleHandle};

#[derive(Clone, Debug, Default)]
struct CallLimitTracker {
    current_call_limit: Option<(usize, usize)>,
    // Set once a call was refused, as opposed to the budget merely being used up.
    exceeded: bool,
}

impl CallLimitTracker {
    fn new(limit: Option<NonZeroUsize>) -> Self {
        CallLimitTracker {
            current_call_limit: limit.map(|limit| (0, limit.get())),
            exceeded: false,
        }
    }

    fn limit_reached(&self) -> bool {
        self.current_call_limit
            .map_or(false, |(current, limit)| current >= limit)
    }

    fn increment_depth(&mut self) {
        if let Some((current, _)) = &mut self.current_call_limit {
            *current += 1;
        }
    }

    fn reset(&mut self) {
        if let Some((current, _)) = &mut self.current_call_limit {
            *current = 0;
        }
        self.exceeded = false;
    }
}

// Bounds how deeply rule executions nest, which is how deep the native stack grows.
#[derive(Clone, Debug)]
struct DepthTracker {
    depth: usize,
    max_depth: usize,
    exceeded: bool,
}

impl DepthTracker {
    fn new(max_depth: usize) -> Self {
        DepthTracker {
            depth: 0,
            max_depth,
            exceeded: false,
        }
    }

    fn enter(&mut self) -> bool {
        if self.exceeded || self.depth >= self.max_depth {
            self.exceeded = true;
            return false;
        }
        self.depth += 1;
        true
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn reset(&mut self) {
        *self = DepthTracker::new(self.max_depth);
    }
}

/// The source text of one parse together with the position of the parser in it.
#[derive(Clone, Debug)]
pub struct Cursor<'i> {
    input: &'i str,
    start: usize,
    pos: usize,
    max_offset: usize,
    call_tracker: CallLimitTracker,
    depth_tracker: DepthTracker,
}

impl<'i> Cursor<'i> {
    /// Creates a `Cursor` at the start of `input`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use packrat::Cursor;
    /// let cursor = Cursor::new("ab");
    ///
    /// assert_eq!(cursor.pos(), 0);
    /// assert_eq!(cursor.rest(), "ab");
    /// ```
    pub fn new(input: &'i str) -> Cursor<'i> {
        Cursor {
            input,
            start: 0,
            pos: 0,
            max_offset: 0,
            call_tracker: CallLimitTracker::default(),
            depth_tracker: DepthTracker::new(DEFAULT_MAX_DEPTH),
        }
    }

    /// Creates a `Cursor` at byte offset `pos` of `input`. Returns `None` if `pos` is out of
    /// bounds or not on a `char` boundary.
    ///
    /// # Examples
    ///
    /// ```
    /// # use packrat::Cursor;
    /// assert_eq!(Cursor::at("ab", 1).unwrap().rest(), "b");
    /// assert!(Cursor::at("ab", 3).is_none());
    /// assert!(Cursor::at("é", 1).is_none());
    /// ```
    pub fn at(input: &'i str, pos: usize) -> Option<Cursor<'i>> {
        if input.is_char_boundary(pos) {
            Some(Cursor {
                input,
                start: pos,
                pos,
                max_offset: pos,
                call_tracker: CallLimitTracker::default(),
                depth_tracker: DepthTracker::new(DEFAULT_MAX_DEPTH),
            })
        } else {
            None
        }
    }

    /// Limits the number of rule executions the cursor will allow before every further
    /// execution fails.
    pub fn with_call_limit(mut self, limit: Option<NonZeroUsize>) -> Cursor<'i> {
        self.call_tracker = CallLimitTracker::new(limit);
        self
    }

    /// Limits how many rule executions may be nested inside each other. Once a rule would nest
    /// deeper, it and every further execution fail. The default is
    /// [`DEFAULT_MAX_DEPTH`](crate::DEFAULT_MAX_DEPTH).
    ///
    /// # Examples
    ///
    /// ```
    /// # use packrat::Cursor;
    /// let cursor = Cursor::new("ab").with_depth_limit(64);
    ///
    /// assert!(!cursor.reached_depth_limit());
    /// ```
    pub fn with_depth_limit(mut self, max_depth: usize) -> Cursor<'i> {
        self.depth_tracker = DepthTracker::new(max_depth);
        self
    }

    /// Returns the whole input.
    #[inline]
    pub fn input(&self) -> &'i str {
        self.input
    }

    /// Returns the current byte position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Moves the cursor. `pos` must be a `char` boundary of the input.
    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(self.input.is_char_boundary(pos));
        self.pos = pos;
    }

    /// Returns the input after the cursor.
    #[inline]
    pub fn rest(&self) -> &'i str {
        &self.input[self.pos..]
    }

    /// Returns the furthest position any successful rule has reached.
    #[inline]
    pub fn max_offset(&self) -> usize {
        self.max_offset
    }

    /// Returns `true` once a rule execution was refused for exceeding the call limit.
    #[inline]
    pub fn reached_call_limit(&self) -> bool {
        self.call_tracker.exceeded
    }

    /// Returns `true` once a rule execution was refused for nesting too deeply.
    #[inline]
    pub fn reached_depth_limit(&self) -> bool {
        self.depth_tracker.exceeded
    }

    // Failures after either limit was reached say nothing about the rules involved.
    #[inline]
    fn reached_limit(&self) -> bool {
        self.reached_call_limit() || self.reached_depth_limit()
    }

    // Back to the state the cursor was created in, limits included.
    fn reset(&mut self) {
        self.pos = self.start;
        self.max_offset = self.start;
        self.call_tracker.reset();
        self.depth_tracker.reset();
    }

    fn advance_to(&mut self, pos: usize) {
        self.pos = pos;
        if pos > self.max_offset {
            self.max_offset = pos;
        }
    }

    #[inline]
    fn inc_call_check_limit(&mut self) -> bool {
        if self.call_tracker.limit_reached() {
            self.call_tracker.exceeded = true;
            return false;
        }
        self.call_tracker.increment_depth();
        true
    }
}

/// Drives the execution of rules over a [`Cursor`].
///
/// A failed match is never an error: it simply appends nothing. Backtracking is therefore a
/// matter of truncating the event buffer and resetting the position.
pub trait Input<'g, 'i> {
    /// Returns the cursor.
    fn cursor(&self) -> &Cursor<'i>;

    /// Returns the cursor mutably.
    fn cursor_mut(&mut self) -> &mut Cursor<'i>;

    /// Runs `rule` at the current position. On success, appends the events of the match, moves
    /// the cursor to its end and returns its length. On failure, leaves both `events` and the
    /// cursor untouched.
    fn exec(&mut self, rule: RuleHandle<'g>, events: &mut Events<'g>) -> Option<usize>;

    /// Runs `rule` at the current position without committing to it: no events are kept and the
    /// cursor is restored in every case.
    fn test(&mut self, rule: RuleHandle<'g>) -> Option<usize> {
        let pos = self.cursor().pos();
        let mut scratch = Vec::new();
        let result = self.exec(rule, &mut scratch);
        self.cursor_mut().set_pos(pos);

        result
    }
}

// The part of `Input::exec` every input shares. Sub-rules are executed through `input` again so
// that decorators see every call.
fn apply<'g, 'i, I>(input: &mut I, rule: RuleHandle<'g>, events: &mut Events<'g>) -> Option<usize>
where
    I: Input<'g, 'i> + ?Sized,
{
    if !input.cursor_mut().inc_call_check_limit() {
        return None;
    }
    if !input.cursor_mut().depth_tracker.enter() {
        return None;
    }

    let start = input.cursor().pos();
    let index = events.len();

    let result = rule.exec(input, events);
    input.cursor_mut().depth_tracker.leave();

    match result {
        Some(length) => {
            input.cursor_mut().advance_to(start + length);
            Some(length)
        }
        None => {
            events.truncate(index);
            input.cursor_mut().set_pos(start);
            None
        }
    }
}

/// The plain, non-memoizing [`Input`].
#[derive(Debug)]
pub struct StringInput<'i> {
    cursor: Cursor<'i>,
}

impl<'i> StringInput<'i> {
    /// Creates a `StringInput` from a `Cursor`.
    pub fn new(cursor: Cursor<'i>) -> StringInput<'i> {
        StringInput { cursor }
    }

    /// Consumes the input, returning its cursor.
    pub fn into_cursor(self) -> Cursor<'i> {
        self.cursor
    }
}

impl<'g, 'i> Input<'g, 'i> for StringInput<'i> {
    #[inline]
    fn cursor(&self) -> &Cursor<'i> {
        &self.cursor
    }

    #[inline]
    fn cursor_mut(&mut self) -> &mut Cursor<'i> {
        &mut self.cursor
    }

    #[inline]
    fn exec(&mut self, rule: RuleHandle<'g>, events: &mut Events<'g>) -> Option<usize> {
        apply(self, rule, events)
    }
}

/// Hit and miss counts of a [`MemoizedInput`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    /// Recorded matches that were replayed.
    pub hits: usize,
    /// Recorded failures that were replayed.
    pub failure_hits: usize,
    /// Executions that had to be recorded.
    pub misses: usize,
}

// The address of a rule is its identity.
type CacheKey = (usize, usize);

#[inline]
fn cache_key(rule: &Rule, pos: usize) -> CacheKey {
    (rule as *const Rule as usize, pos)
}

/// An [`Input`] that records the outcome of every `(rule, position)` pair it executes and
/// replays it instead of executing the rule again. This bounds parsing time to
/// `O(rules × positions)` at the cost of as much memory.
pub struct MemoizedInput<'g, 'i> {
    inner: StringInput<'i>,
    cache: HashMap<CacheKey, Option<Box<[Event<'g>]>>>,
    stats: CacheStats,
}

impl<'g, 'i> MemoizedInput<'g, 'i> {
    /// Creates a `MemoizedInput` from a `Cursor`.
    pub fn new(cursor: Cursor<'i>) -> MemoizedInput<'g, 'i> {
        MemoizedInput {
            inner: StringInput::new(cursor),
            cache: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Returns the hit and miss counts so far.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Returns the number of recorded `(rule, position)` pairs.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Forgets every recorded result, moves the cursor back to where it started and restores its
    /// call and depth limits.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.stats = CacheStats::default();
        self.inner.cursor.reset();
    }

    /// Consumes the input, returning its cursor.
    pub fn into_cursor(self) -> Cursor<'i> {
        self.inner.into_cursor()
    }
}

impl<'g, 'i> Input<'g, 'i> for MemoizedInput<'g, 'i> {
    #[inline]
    fn cursor(&self) -> &Cursor<'i> {
        self.inner.cursor()
    }

    #[inline]
    fn cursor_mut(&mut self) -> &mut Cursor<'i> {
        self.inner.cursor_mut()
    }

    fn exec(&mut self, rule: RuleHandle<'g>, events: &mut Events<'g>) -> Option<usize> {
        let start = self.cursor().pos();
        let key = cache_key(rule.rule(), start);

        if let Some(recorded) = self.cache.get(&key) {
            return match recorded {
                Some(recorded) => {
                    self.stats.hits += 1;
                    trace!("replaying {:?} at {}", rule.rule().name(), start);

                    events.extend_from_slice(recorded);
                    let length = events[events.len() - 1].length();
                    self.inner.cursor.advance_to(start + length);

                    Some(length)
                }
                None => {
                    self.stats.failure_hits += 1;
                    None
                }
            };
        }

        self.stats.misses += 1;

        let index = events.len();
        let result = apply(self, rule, events);

        if self.cursor().reached_limit() {
            return result;
        }

        let recorded = result.map(|_| Box::from(&events[index..]));
        self.cache.insert(key, recorded);

        result
    }
}

impl<'g, 'i> std::fmt::Debug for MemoizedInput<'g, 'i> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoizedInput")
            .field("cursor", self.cursor())
            .field("cache_len", &self.cache.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::expr::{alias, choice, rep, seq};
    use crate::grammar::{Grammar, GrammarBuilder};

    fn letters() -> Arc<Grammar> {
        GrammarBuilder::new("LetterA")
            .rule(
                "top",
                choice([alias("three_as"), alias("two_as"), alias("one_a")]),
            )
            .rule("three_as", rep(alias("one_a"), 3, Some(3)))
            .rule("two_as", rep(alias("one_a"), 2, Some(2)))
            .rule("one_a", "a")
            .build()
            .unwrap()
    }

    #[test]
    fn exec_moves_cursor_and_max_offset() {
        let g = letters();
        let mut input = StringInput::new(Cursor::new("aa"));
        let mut events = vec![];

        assert_eq!(input.exec(g.root(), &mut events), Some(2));
        assert_eq!(input.cursor().pos(), 2);
        assert_eq!(input.cursor().max_offset(), 2);
    }

    #[test]
    fn max_offset_survives_backtracking() {
        let g = GrammarBuilder::new("Max")
            .rule("top", choice([seq(["a".into(), "b".into(), "c".into()]), "a".into()]))
            .build()
            .unwrap();
        let mut input = StringInput::new(Cursor::new("abd"));
        let mut events = vec![];

        assert_eq!(input.exec(g.root(), &mut events), Some(1));
        assert_eq!(input.cursor().pos(), 1);
        assert_eq!(input.cursor().max_offset(), 2);
    }

    #[test]
    fn test_restores_cursor() {
        let g = letters();
        let mut input = StringInput::new(Cursor::new("aa"));

        assert_eq!(input.test(g.root()), Some(2));
        assert_eq!(input.cursor().pos(), 0);
    }

    #[test]
    fn cache_hits_single_letter() {
        let g = letters();
        let mut input = MemoizedInput::new(Cursor::new("a"));
        let mut events = vec![];

        assert_eq!(input.exec(g.root(), &mut events), Some(1));
        assert_eq!(input.stats().hits, 2);
        assert_eq!(input.stats().failure_hits, 1);
    }

    #[test]
    fn cache_hits_two_letters() {
        let g = letters();
        let mut input = MemoizedInput::new(Cursor::new("aa"));
        let mut events = vec![];

        assert_eq!(input.exec(g.root(), &mut events), Some(2));
        assert_eq!(input.stats().hits, 2);
        assert_eq!(input.stats().failure_hits, 0);
    }

    #[test]
    fn replay_matches_execution() {
        let g = letters();

        let mut plain = StringInput::new(Cursor::new("aa"));
        let mut expected = vec![];
        plain.exec(g.root(), &mut expected);

        let mut memoized = MemoizedInput::new(Cursor::new("aa"));
        let mut events = vec![];
        memoized.exec(g.root(), &mut events);

        assert_eq!(events, expected);

        // A second run is replayed entirely from the cache.
        memoized.cursor_mut().set_pos(0);
        let mut replayed = vec![];
        assert_eq!(memoized.exec(g.root(), &mut replayed), Some(2));
        assert_eq!(replayed, expected);
        assert_eq!(memoized.cursor().pos(), 2);
    }

    #[test]
    fn reset_clears_cache() {
        let g = letters();
        let mut input = MemoizedInput::new(Cursor::new("aa"));
        let mut events = vec![];
        input.exec(g.root(), &mut events);

        assert!(input.cache_len() > 0);

        input.reset();

        assert_eq!(input.cache_len(), 0);
        assert_eq!(input.stats(), CacheStats::default());
        assert_eq!(input.cursor().pos(), 0);
        assert_eq!(input.cursor().max_offset(), 0);
    }

    #[test]
    fn call_limit() {
        let g = letters();
        let cursor = Cursor::new("aa").with_call_limit(NonZeroUsize::new(3));
        let mut input = StringInput::new(cursor);
        let mut events = vec![];

        assert_eq!(input.exec(g.root(), &mut events), None);
        assert!(input.cursor().reached_call_limit());
        assert!(events.is_empty());
    }

    #[test]
    fn reset_restores_limits_and_start() {
        let g = letters();
        let cursor = Cursor::at("baa", 1)
            .unwrap()
            .with_call_limit(NonZeroUsize::new(3));
        let mut input = MemoizedInput::new(cursor);

        assert_eq!(input.exec(g.root(), &mut vec![]), None);
        assert!(input.cursor().reached_call_limit());

        input.reset();

        assert!(!input.cursor().reached_call_limit());
        assert_eq!(input.cursor().pos(), 1);
        assert_eq!(input.cursor().max_offset(), 1);

        // The limit is in force again rather than lifted.
        assert_eq!(input.exec(g.root(), &mut vec![]), None);
        assert!(input.cursor().reached_call_limit());
    }

    #[test]
    fn depth_limit() {
        let g = letters();

        // The choice, the alias of three_as, its repetition, the alias of one_a and the literal.
        let mut input = StringInput::new(Cursor::new("aa").with_depth_limit(4));
        let mut events = vec![];

        assert_eq!(input.exec(g.root(), &mut events), None);
        assert!(input.cursor().reached_depth_limit());
        assert!(!input.cursor().reached_call_limit());
        assert!(events.is_empty());

        let mut input = StringInput::new(Cursor::new("aa").with_depth_limit(5));

        assert_eq!(input.exec(g.root(), &mut vec![]), Some(2));
        assert!(!input.cursor().reached_depth_limit());
    }

    #[test]
    fn depth_limit_failures_are_not_recorded() {
        let g = letters();
        let mut input = MemoizedInput::new(Cursor::new("aa").with_depth_limit(4));

        assert_eq!(input.exec(g.root(), &mut vec![]), None);
        assert_eq!(input.cache_len(), 0);
    }
}
