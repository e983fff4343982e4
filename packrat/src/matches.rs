// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::cell::OnceCell;
use std::collections::VecDeque;
use std::fmt::{self, Write};
use std::rc::Rc;

use crate::event::{Event, Events};
use crate::position::Position;
use crate::rule::Rule;
use crate::Value;

/// A node of the tree reconstructed from the event stream of a successful parse.
///
/// A `Match` is cheap to clone: every node of a parse shares the same event buffer. Children are
/// only materialized, once, when they are first asked for.
///
/// Rules that pass their child's match through unchanged (choices, aliases, super references
/// and labels) do not get a node of their own. The node of the rule they wrapped carries their
/// names, labels and extension members instead.
#[derive(Clone)]
pub struct Match<'g, 'i> {
    events: Rc<Events<'g>>,
    input: &'i str,
    // Index of the outermost `Open` of the node.
    start: usize,
    // Index of the first `Open` that is not elided.
    primary: usize,
    // Index of the `Length` of the outermost rule.
    end: usize,
    offset: usize,
    children: OnceCell<Vec<Match<'g, 'i>>>,
}

impl<'g, 'i> Match<'g, 'i> {
    pub(crate) fn new(events: Rc<Events<'g>>, input: &'i str, offset: usize) -> Match<'g, 'i> {
        let end = events.len() - 1;
        Match::at(events, input, 0, end, offset)
    }

    fn at(
        events: Rc<Events<'g>>,
        input: &'i str,
        start: usize,
        end: usize,
        offset: usize,
    ) -> Match<'g, 'i> {
        let mut primary = start;
        while events[primary].rule().map_or(false, Rule::is_elided) {
            primary += 1;
        }

        Match {
            events,
            input,
            start,
            primary,
            end,
            offset,
            children: OnceCell::new(),
        }
    }

    // Outermost first, ending with the primary rule.
    fn chain(&self) -> impl Iterator<Item = &'g Rule> + '_ {
        self.events[self.start..=self.primary]
            .iter()
            .filter_map(Event::rule)
    }

    /// Returns the matched text.
    ///
    /// # Examples
    ///
    /// ```
    /// # use packrat::GrammarBuilder;
    /// # use packrat::expr::pattern;
    /// let grammar = GrammarBuilder::new("Word")
    ///     .rule("word", pattern("[a-z]+"))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(grammar.parse("abc").unwrap().text(), "abc");
    /// ```
    #[inline]
    pub fn text(&self) -> &'i str {
        &self.input[self.offset..self.offset + self.length()]
    }

    /// Returns the byte offset of the match in the input.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the length of the match in bytes.
    #[inline]
    pub fn length(&self) -> usize {
        self.events[self.end].length()
    }

    /// Returns the line and column of the start of the match, both starting at 1.
    pub fn line_col(&self) -> (usize, usize) {
        Position::new(self.input, self.offset).map_or((1, 1), |position| position.line_col())
    }

    /// Returns the rule that produced the match, past any elided wrapper.
    pub fn rule(&self) -> &'g Rule {
        match self.events[self.primary] {
            Event::Open(rule) => rule,
            _ => unreachable!("every match starts with an Open event"),
        }
    }

    /// Returns the events the match was reconstructed from, its elided wrappers included.
    pub fn events(&self) -> &[Event<'g>] {
        &self.events[self.start..=self.end]
    }

    /// Returns the rule names and labels of the match, outermost first and without duplicates.
    ///
    /// # Examples
    ///
    /// ```
    /// # use packrat::GrammarBuilder;
    /// # use packrat::expr::{alias, pattern};
    /// let grammar = GrammarBuilder::new("Names")
    ///     .rule("top", alias("number").label("n"))
    ///     .rule("number", pattern("[0-9]+"))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(grammar.parse("12").unwrap().names(), vec!["top", "n", "number"]);
    /// ```
    pub fn names(&self) -> Vec<&'g str> {
        let mut names: Vec<&'g str> = vec![];

        for rule in self.chain() {
            for name in rule.name().into_iter().chain(rule.label()) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        names
    }

    /// Returns `true` if `name` is one of [`names`](Match::names).
    pub fn has_name(&self, name: &str) -> bool {
        self.chain()
            .any(|rule| rule.name() == Some(name) || rule.label() == Some(name))
    }

    /// Returns the direct children of the match.
    pub fn matches(&self) -> &[Match<'g, 'i>] {
        self.children.get_or_init(|| self.materialize())
    }

    fn materialize(&self) -> Vec<Match<'g, 'i>> {
        // Every elided wrapper adds an `Open` before the primary rule and a `Close` and `Length`
        // after it.
        let close = self.end - 2 * (self.primary - self.start) - 1;

        let mut children = vec![];
        let mut stack: Vec<(usize, usize)> = vec![];
        let mut offset = self.offset;

        let mut i = self.primary + 1;
        while i < close {
            match self.events[i] {
                Event::Open(_) => stack.push((i, offset)),
                Event::Close => {
                    let (start, child_offset) = match stack.pop() {
                        Some(open) => open,
                        None => unreachable!("Close without a matching Open"),
                    };

                    // Skip the `Length` that always follows.
                    i += 1;
                    offset = child_offset + self.events[i].length();

                    if stack.is_empty() {
                        children.push(Match::at(
                            Rc::clone(&self.events),
                            self.input,
                            start,
                            i,
                            child_offset,
                        ));
                    }
                }
                Event::Length(_) => unreachable!("Length without a preceding Close"),
            }

            i += 1;
        }

        children
    }

    /// Returns the closest descendants that have at least one name, looking through unnamed
    /// matches.
    pub fn named_matches(&self) -> Vec<Match<'g, 'i>> {
        let mut named = vec![];

        for child in self.matches() {
            if child.chain().any(|rule| rule.name().is_some() || rule.label().is_some()) {
                named.push(child.clone());
            } else {
                named.extend(child.named_matches());
            }
        }

        named
    }

    /// Returns the children named `name`, followed, if `deep` is `true`, by the matching
    /// descendants of every child.
    ///
    /// # Examples
    ///
    /// ```
    /// # use packrat::GrammarBuilder;
    /// # use packrat::expr::{alias, one_or_more, pattern, seq};
    /// let grammar = GrammarBuilder::new("Pairs")
    ///     .rule("pairs", one_or_more(alias("pair")))
    ///     .rule("pair", seq([alias("digit"), alias("digit")]))
    ///     .rule("digit", pattern("[0-9]"))
    ///     .build()
    ///     .unwrap();
    ///
    /// let pairs = grammar.parse("1234").unwrap();
    ///
    /// assert_eq!(pairs.find("pair", false).len(), 2);
    /// assert_eq!(pairs.find("digit", false).len(), 0);
    /// assert_eq!(pairs.find("digit", true).len(), 4);
    /// ```
    pub fn find(&self, name: &str, deep: bool) -> Vec<Match<'g, 'i>> {
        let mut found: Vec<_> = self
            .matches()
            .iter()
            .filter(|child| child.has_name(name))
            .cloned()
            .collect();

        if deep {
            for child in self.matches() {
                found.extend(child.find(name, true));
            }
        }

        found
    }

    /// Returns the shallowest descendant named `name`; among descendants at the same depth, the
    /// leftmost.
    pub fn first(&self, name: &str) -> Option<Match<'g, 'i>> {
        let mut queue: VecDeque<&Match<'g, 'i>> = self.matches().iter().collect();

        while let Some(next) = queue.pop_front() {
            if next.has_name(name) {
                return Some(next.clone());
            }
            queue.extend(next.matches());
        }

        None
    }

    /// Returns the named capture `name`. Same as [`first`](Match::first).
    ///
    /// # Examples
    ///
    /// ```
    /// # use packrat::GrammarBuilder;
    /// # use packrat::expr::{pattern, seq};
    /// let grammar = GrammarBuilder::new("Assignment")
    ///     .rule(
    ///         "assignment",
    ///         seq([
    ///             pattern("[a-z]+").label("lhs"),
    ///             "=".into(),
    ///             pattern("[0-9]+").label("rhs"),
    ///         ]),
    ///     )
    ///     .build()
    ///     .unwrap();
    ///
    /// let assignment = grammar.parse("x=1").unwrap();
    ///
    /// assert_eq!(assignment.capture("lhs").unwrap().text(), "x");
    /// assert_eq!(assignment.capture("rhs").unwrap().text(), "1");
    /// assert!(assignment.capture("type").is_none());
    /// ```
    pub fn capture(&self, name: &str) -> Option<Match<'g, 'i>> {
        self.first(name)
    }

    /// Calls the extension member `member` of the outermost rule of the match that has one.
    pub fn call(&self, member: &str) -> Option<Value> {
        self.chain()
            .find_map(|rule| rule.extension().and_then(|extension| extension.get(member)))
            .map(|f| f(self))
    }

    /// Returns the `value` member of the match, or its text when no rule defines one.
    pub fn value(&self) -> Value {
        self.call("value")
            .unwrap_or_else(|| Value::String(self.text().to_owned()))
    }

    /// Prints the tree, one match per line.
    ///
    /// # Examples
    ///
    /// ```
    /// # use packrat::GrammarBuilder;
    /// # use packrat::expr::{alias, pattern, seq};
    /// let grammar = GrammarBuilder::new("Sum")
    ///     .rule("sum", seq([alias("number"), "+".into(), alias("number")]))
    ///     .rule("number", pattern("[0-9]+"))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(
    ///     grammar.parse("1+23").unwrap().dump(),
    ///     "sum 0..4 \"1+23\"\n  number 0..1 \"1\"\n  <anonymous> 1..2 \"+\"\n  number 2..4 \"23\"\n"
    /// );
    /// ```
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        let names = self.names();
        let names = if names.is_empty() {
            "<anonymous>".to_owned()
        } else {
            names.join(",")
        };

        // Writing to a `String` cannot fail.
        let _ = writeln!(
            out,
            "{}{} {}..{} {:?}",
            "  ".repeat(depth),
            names,
            self.offset,
            self.offset + self.length(),
            self.text()
        );

        for child in self.matches() {
            child.dump_into(out, depth + 1);
        }
    }

    /// Returns the tree as pretty-printed JSON.
    #[cfg(feature = "pretty-print")]
    pub fn to_json(&self) -> String {
        ::serde_json::to_string_pretty(self).expect("Failed to pretty-print Match to json.")
    }
}

impl<'g, 'i> PartialEq for Match<'g, 'i> {
    fn eq(&self, other: &Match<'g, 'i>) -> bool {
        std::ptr::eq(self.input, other.input)
            && self.offset == other.offset
            && self.events() == other.events()
    }
}

impl<'g, 'i> Eq for Match<'g, 'i> {}

impl<'g, 'i> fmt::Display for Match<'g, 'i> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl<'g, 'i> fmt::Debug for Match<'g, 'i> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("names", &self.names())
            .field("offset", &self.offset)
            .field("text", &self.text())
            .field("matches", &self.matches())
            .finish()
    }
}

#[cfg(feature = "pretty-print")]
impl<'g, 'i> ::serde::Serialize for Match<'g, 'i> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ::serde::Serializer,
    {
        use ::serde::ser::SerializeStruct;

        let mut ser = serializer.serialize_struct("Match", 3)?;
        ser.serialize_field("pos", &(self.offset, self.offset + self.length()))?;
        ser.serialize_field("names", &self.names())?;
        if self.matches().is_empty() {
            ser.serialize_field("inner", self.text())?;
        } else {
            ser.serialize_field("inner", self.matches())?;
        }
        ser.end()
    }
}
