// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use log::{debug, warn};
use regex::Regex;

use crate::error::{GrammarError, ParseError, ParseErrorKind};
use crate::expr::Expr;
use crate::input::{Cursor, Input, MemoizedInput, StringInput};
use crate::matches::Match;
use crate::options::ParseOptions;
use crate::rule::{Matcher, Proxy, Rule, RuleHandle, RuleId, RuleKind};

// Where a proxy or the root points to: a rule id in the grammar reached by following `path`
// through the `includes` of the grammar the lookup started from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Target {
    path: Vec<usize>,
    id: RuleId,
}

impl Target {
    fn local(id: RuleId) -> Target {
        Target { path: vec![], id }
    }

    fn through(mut self, include: usize) -> Target {
        self.path.insert(0, include);
        self
    }
}

/// A named table of rules.
///
/// Grammars are built once with a [`GrammarBuilder`] and are immutable afterwards; they can be
/// shared between threads and parsed with concurrently, each parse owning its own [`Input`].
pub struct Grammar {
    name: String,
    rules: Vec<Rule>,
    table: HashMap<String, RuleId>,
    order: Vec<String>,
    includes: Vec<Arc<Grammar>>,
    root: Target,
}

impl Grammar {
    /// Returns the name of the grammar.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the root rule.
    pub fn root(&self) -> RuleHandle<'_> {
        self.resolve(&self.root)
    }

    /// Returns the names of the rules defined by this grammar, in definition order.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Returns `true` if this grammar, not counting its inclusions, defines `name`.
    pub fn has_rule(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Returns the rule `name` from this grammar or, failing that, from the included grammars.
    pub fn rule(&self, name: &str) -> Option<RuleHandle<'_>> {
        self.lookup(name).map(|target| self.resolve(&target))
    }

    /// Returns the included grammars, in inclusion order.
    pub fn includes(&self) -> &[Arc<Grammar>] {
        &self.includes
    }

    #[inline]
    pub(crate) fn rule_at(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub(crate) fn resolve(&self, target: &Target) -> RuleHandle<'_> {
        let mut grammar = self;
        for &include in &target.path {
            grammar = &grammar.includes[include];
        }

        RuleHandle::new(grammar, grammar.rule_at(target.id))
    }

    fn lookup(&self, name: &str) -> Option<Target> {
        match self.table.get(name) {
            Some(&id) => Some(Target::local(id)),
            None => self.lookup_included(name),
        }
    }

    // Later inclusions shadow earlier ones.
    fn lookup_included(&self, name: &str) -> Option<Target> {
        self.includes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, grammar)| grammar.lookup(name).map(|target| target.through(i)))
    }

    /// Parses the whole of `input` with the root rule.
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
    /// assert!(grammar.parse("abc1").is_err());
    /// ```
    pub fn parse<'g, 'i>(&'g self, input: &'i str) -> Result<Match<'g, 'i>, ParseError> {
        self.parse_with(input, &ParseOptions::default())
    }

    /// Parses `input` according to `options`.
    pub fn parse_with<'g, 'i>(
        &'g self,
        input: &'i str,
        options: &ParseOptions,
    ) -> Result<Match<'g, 'i>, ParseError> {
        let root = match options.root {
            Some(ref name) => match self.rule(name) {
                Some(root) => root,
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnknownRule(name.clone()),
                        input,
                        0,
                    ))
                }
            },
            None => self.root(),
        };

        let start = options.start_offset;
        let cursor = match Cursor::at(input, start) {
            Some(cursor) => cursor
                .with_call_limit(options.call_limit)
                .with_depth_limit(options.max_depth),
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidOffset,
                    input,
                    start.min(input.len()),
                ))
            }
        };

        debug!(
            "parsing {} bytes with {}::{} (memoize: {})",
            input.len() - start,
            self.name,
            root.rule().name().unwrap_or("<anonymous>"),
            options.memoize
        );

        let mut events = Vec::new();
        let (result, cursor) = if options.memoize {
            let mut state = MemoizedInput::new(cursor);
            let result = state.exec(root, &mut events);
            debug!("memoization: {:?}", state.stats());
            (result, state.into_cursor())
        } else {
            let mut state = StringInput::new(cursor);
            let result = state.exec(root, &mut events);
            (result, state.into_cursor())
        };

        // A rule refused by a limit may have failed inside an optional part, leaving a root that
        // matched less than it should have.
        if cursor.reached_call_limit() {
            warn!("call limit reached while parsing with {}", self.name);
            return Err(ParseError::new(
                ParseErrorKind::CallLimit,
                input,
                cursor.max_offset(),
            ));
        }
        if cursor.reached_depth_limit() {
            warn!("depth limit reached while parsing with {}", self.name);
            return Err(ParseError::new(
                ParseErrorKind::DepthLimit,
                input,
                cursor.max_offset(),
            ));
        }

        match result {
            Some(length) if !options.require_full_consumption || start + length == input.len() => {
                debug!("matched {} bytes", length);
                Ok(Match::new(Rc::new(events), input, start))
            }
            Some(length) => Err(ParseError::new(
                ParseErrorKind::Incomplete,
                input,
                cursor.max_offset().max(start + length),
            )),
            None => Err(ParseError::new(
                ParseErrorKind::NoMatch,
                input,
                cursor.max_offset(),
            )),
        }
    }

    /// Returns the length of the match of the root rule at the start of `input`, without
    /// requiring the whole input to match.
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
    /// assert_eq!(grammar.test("abc1"), Some(3));
    /// assert_eq!(grammar.test("1abc"), None);
    /// ```
    pub fn test(&self, input: &str) -> Option<usize> {
        StringInput::new(Cursor::new(input)).test(self.root())
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("rules", &self.order)
            .field(
                "includes",
                &self.includes.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builds a [`Grammar`].
///
/// Rules may refer to each other in any order; names are only resolved by [`build`], which is
/// also where every definition error is reported.
///
/// [`build`]: GrammarBuilder::build
///
/// # Examples
///
/// ```
/// # use packrat::GrammarBuilder;
/// # use packrat::expr::{alias, choice, sup};
/// let base = GrammarBuilder::new("Base")
///     .rule("greeting", "hello")
///     .build()
///     .unwrap();
///
/// let extended = GrammarBuilder::new("Extended")
///     .include(&base)
///     .rule("greeting", choice([sup(), "hi".into()]))
///     .build()
///     .unwrap();
///
/// assert!(extended.parse("hello").is_ok());
/// assert!(extended.parse("hi").is_ok());
/// assert!(base.parse("hi").is_err());
/// ```
#[derive(Debug)]
pub struct GrammarBuilder {
    name: String,
    definitions: Vec<(String, Expr)>,
    root: Option<String>,
    includes: Vec<Arc<Grammar>>,
}

impl GrammarBuilder {
    /// Starts a grammar called `name`.
    pub fn new(name: &str) -> GrammarBuilder {
        GrammarBuilder {
            name: name.to_owned(),
            definitions: vec![],
            root: None,
            includes: vec![],
        }
    }

    /// Defines the rule `name`. The first rule defined is the root unless [`root`] says
    /// otherwise.
    ///
    /// [`root`]: GrammarBuilder::root
    pub fn rule<E: Into<Expr>>(mut self, name: &str, expr: E) -> GrammarBuilder {
        self.definitions.push((name.to_owned(), expr.into()));
        self
    }

    /// Makes `name`, which may come from an included grammar, the root rule.
    pub fn root(mut self, name: &str) -> GrammarBuilder {
        self.root = Some(name.to_owned());
        self
    }

    /// Makes the rules of `grammar` available to this one. Later inclusions take precedence over
    /// earlier ones.
    pub fn include(mut self, grammar: &Arc<Grammar>) -> GrammarBuilder {
        self.includes.push(Arc::clone(grammar));
        self
    }

    /// Lowers every definition, resolves every name and returns the finished grammar.
    pub fn build(self) -> Result<Arc<Grammar>, GrammarError> {
        let GrammarBuilder {
            name,
            definitions,
            root,
            includes,
        } = self;

        let mut lowering = Lowering {
            grammar: &name,
            rules: vec![],
            proxies: vec![],
        };
        let mut table = HashMap::new();
        let mut order = vec![];

        for (rule_name, expr) in definitions {
            if table.contains_key(&rule_name) {
                return Err(GrammarError::DuplicateRule {
                    grammar: name.clone(),
                    name: rule_name,
                });
            }

            let id = lowering.lower(expr, &rule_name)?;
            lowering.rules[id.index()].set_name(rule_name.clone());

            table.insert(rule_name.clone(), id);
            order.push(rule_name);
        }

        let Lowering { rules, proxies, .. } = lowering;

        let mut grammar = Grammar {
            name,
            rules,
            table,
            order,
            includes,
            root: Target::local(RuleId(0)),
        };

        for pending in proxies {
            let target = match pending.kind {
                ProxyKind::Alias => grammar.lookup(&pending.name),
                ProxyKind::Super => grammar.lookup_included(&pending.name),
            };

            let target = match (target, pending.kind) {
                (Some(target), _) => target,
                (None, ProxyKind::Alias) => {
                    return Err(GrammarError::UndefinedRule {
                        grammar: grammar.name,
                        rule: pending.rule,
                        name: pending.name,
                    })
                }
                (None, ProxyKind::Super) => {
                    return Err(GrammarError::UndefinedSuper {
                        grammar: grammar.name,
                        rule: pending.rule,
                        name: pending.name,
                    })
                }
            };

            match grammar.rules[pending.id.index()].kind() {
                RuleKind::Alias(proxy) | RuleKind::Super(proxy) => proxy.bind(target),
                _ => unreachable!("pending proxies always point to proxy rules"),
            }
        }

        grammar.root = match root {
            Some(root) => match grammar.lookup(&root) {
                Some(target) => target,
                None => {
                    return Err(GrammarError::UndefinedRoot {
                        grammar: grammar.name,
                        name: root,
                    })
                }
            },
            None => match grammar.order.first() {
                Some(first) => Target::local(grammar.table[first]),
                None => match grammar.includes.len() {
                    0 => {
                        return Err(GrammarError::EmptyGrammar {
                            grammar: grammar.name,
                        })
                    }
                    n => grammar.includes[n - 1].root.clone().through(n - 1),
                },
            },
        };

        debug_assert!(grammar.rules.iter().all(|rule| match rule.kind() {
            RuleKind::Alias(proxy) | RuleKind::Super(proxy) => proxy.is_bound(),
            _ => true,
        }));

        debug!(
            "built grammar {} with {} rules ({} lowered)",
            grammar.name,
            grammar.order.len(),
            grammar.rules.len()
        );

        Ok(Arc::new(grammar))
    }
}

#[derive(Clone, Copy)]
enum ProxyKind {
    Alias,
    Super,
}

struct PendingProxy {
    id: RuleId,
    kind: ProxyKind,
    name: String,
    rule: String,
}

struct Lowering<'a> {
    grammar: &'a str,
    rules: Vec<Rule>,
    proxies: Vec<PendingProxy>,
}

impl<'a> Lowering<'a> {
    fn push(&mut self, rule: Rule) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(rule);
        id
    }

    fn lower_all(
        &mut self,
        exprs: Vec<Expr>,
        rule: &str,
        kind: &'static str,
    ) -> Result<Vec<RuleId>, GrammarError> {
        if exprs.is_empty() {
            return Err(GrammarError::EmptyRule {
                grammar: self.grammar.to_owned(),
                rule: rule.to_owned(),
                kind,
            });
        }

        exprs.into_iter().map(|expr| self.lower(expr, rule)).collect()
    }

    fn proxy(&mut self, kind: ProxyKind, name: String, rule: &str) -> RuleId {
        let proxy = Proxy::new(name.clone());
        let id = self.push(Rule::new(match kind {
            ProxyKind::Alias => RuleKind::Alias(proxy),
            ProxyKind::Super => RuleKind::Super(proxy),
        }));

        self.proxies.push(PendingProxy {
            id,
            kind,
            name,
            rule: rule.to_owned(),
        });

        id
    }

    fn lower(&mut self, expr: Expr, rule: &str) -> Result<RuleId, GrammarError> {
        let kind = match expr {
            Expr::Str {
                literal,
                case_insensitive,
            } => RuleKind::StringTerminal {
                literal,
                case_insensitive,
            },
            Expr::Pattern(pattern) => {
                let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|source| {
                    GrammarError::InvalidPattern {
                        grammar: self.grammar.to_owned(),
                        rule: rule.to_owned(),
                        source,
                    }
                })?;

                RuleKind::Terminal(Matcher::Pattern(regex))
            }
            Expr::Range(start, end) => {
                if start > end {
                    return Err(GrammarError::InvalidRange {
                        grammar: self.grammar.to_owned(),
                        rule: rule.to_owned(),
                        start,
                        end,
                    });
                }

                RuleKind::Terminal(Matcher::Range(start, end))
            }
            Expr::Any => RuleKind::Terminal(Matcher::Any),
            Expr::EndOfInput => RuleKind::Terminal(Matcher::EndOfInput),
            Expr::Seq(exprs) => RuleKind::Sequence(self.lower_all(exprs, rule, "sequence")?),
            Expr::Choice(exprs) => RuleKind::Choice(self.lower_all(exprs, rule, "choice")?),
            Expr::Repeat { expr, min, max } => {
                if let Some(max) = max {
                    if max == 0 || min > max {
                        return Err(GrammarError::InvalidRepeat {
                            grammar: self.grammar.to_owned(),
                            rule: rule.to_owned(),
                            min,
                            max,
                        });
                    }
                }

                RuleKind::Repeat {
                    rule: self.lower(*expr, rule)?,
                    min,
                    max,
                }
            }
            Expr::And(expr) => RuleKind::AndPredicate(self.lower(*expr, rule)?),
            Expr::Not(expr) => RuleKind::NotPredicate(self.lower(*expr, rule)?),
            Expr::But(expr) => RuleKind::ButPredicate(self.lower(*expr, rule)?),
            Expr::Alias(name) => return Ok(self.proxy(ProxyKind::Alias, name, rule)),
            Expr::Super(name) => {
                let name = name.unwrap_or_else(|| rule.to_owned());
                return Ok(self.proxy(ProxyKind::Super, name, rule));
            }
            Expr::Label(expr, label) => {
                let child = self.lower(*expr, rule)?;
                let mut labeled = Rule::new(RuleKind::Label(child));
                labeled.set_label(label);

                return Ok(self.push(labeled));
            }
            Expr::Extend(expr, extension) => {
                let id = self.lower(*expr, rule)?;
                self.rules[id.index()].extend(&extension);

                return Ok(id);
            }
        };

        Ok(self.push(Rule::new(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{alias, choice, pattern, rep, seq, sup, sup_named};

    fn base() -> Arc<Grammar> {
        GrammarBuilder::new("Base")
            .rule("greeting", choice(["hello".into(), alias("name")]))
            .rule("name", "world")
            .build()
            .unwrap()
    }

    #[test]
    fn default_root_is_first_rule() {
        let g = base();

        assert_eq!(g.root().rule().name(), Some("greeting"));
        assert_eq!(g.rule_names().collect::<Vec<_>>(), vec!["greeting", "name"]);
    }

    #[test]
    fn explicit_root() {
        let g = GrammarBuilder::new("Root")
            .rule("a", "a")
            .rule("b", "b")
            .root("b")
            .build()
            .unwrap();

        assert_eq!(g.root().rule().name(), Some("b"));
        assert!(g.parse("b").is_ok());
    }

    #[test]
    fn root_inherited_from_inclusion() {
        let g = GrammarBuilder::new("Empty").include(&base()).build().unwrap();

        assert_eq!(g.root().rule().name(), Some("greeting"));
        assert_eq!(g.root().grammar().name(), "Base");
        assert!(g.parse("world").is_ok());
    }

    #[test]
    fn lookup_falls_back_to_inclusions() {
        let g = GrammarBuilder::new("Child")
            .include(&base())
            .rule("top", seq([alias("name"), "!".into()]))
            .build()
            .unwrap();

        assert!(g.has_rule("top"));
        assert!(!g.has_rule("name"));
        assert_eq!(g.rule("name").unwrap().grammar().name(), "Base");
        assert!(g.parse("world!").is_ok());
    }

    #[test]
    fn later_inclusions_shadow_earlier_ones() {
        let first = GrammarBuilder::new("First").rule("x", "1").build().unwrap();
        let second = GrammarBuilder::new("Second").rule("x", "2").build().unwrap();

        let g = GrammarBuilder::new("Both")
            .include(&first)
            .include(&second)
            .rule("top", alias("x"))
            .build()
            .unwrap();

        assert!(g.parse("2").is_ok());
        assert!(g.parse("1").is_err());
    }

    #[test]
    fn super_skips_own_grammar() {
        let g = GrammarBuilder::new("Child")
            .include(&base())
            .rule("name", choice([sup(), "there".into()]))
            .rule("top", seq([alias("name"), "!".into()]))
            .root("top")
            .build()
            .unwrap();

        assert!(g.parse("world!").is_ok());
        assert!(g.parse("there!").is_ok());
    }

    #[test]
    fn aliases_bind_to_defining_grammar() {
        // `greeting` in Base still sees Base's `name`.
        let g = GrammarBuilder::new("Child")
            .include(&base())
            .rule("name", "moon")
            .root("greeting")
            .build()
            .unwrap();

        assert!(g.parse("world").is_ok());
        assert!(g.parse("moon").is_err());
    }

    #[test]
    fn undefined_alias() {
        let error = GrammarBuilder::new("Broken")
            .rule("top", alias("missing"))
            .build()
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "rule top of grammar Broken refers to undefined rule missing"
        );
    }

    #[test]
    fn undefined_super() {
        let error = GrammarBuilder::new("Broken")
            .rule("top", choice(["a".into(), sup()]))
            .build()
            .unwrap_err();

        assert!(matches!(error, GrammarError::UndefinedSuper { ref name, .. } if name == "top"));

        let error = GrammarBuilder::new("Broken")
            .include(&base())
            .rule("top", sup_named("missing"))
            .build()
            .unwrap_err();

        assert!(matches!(error, GrammarError::UndefinedSuper { ref name, .. } if name == "missing"));
    }

    #[test]
    fn undefined_root() {
        let error = GrammarBuilder::new("Broken")
            .rule("a", "a")
            .root("b")
            .build()
            .unwrap_err();

        assert!(matches!(error, GrammarError::UndefinedRoot { .. }));
    }

    #[test]
    fn malformed_rules() {
        let duplicate = GrammarBuilder::new("Broken").rule("a", "a").rule("a", "b").build();
        assert!(matches!(duplicate, Err(GrammarError::DuplicateRule { .. })));

        let pattern = GrammarBuilder::new("Broken").rule("a", pattern("(")).build();
        assert!(matches!(pattern, Err(GrammarError::InvalidPattern { .. })));

        let repeat = GrammarBuilder::new("Broken").rule("a", rep("a".into(), 3, Some(2))).build();
        assert!(matches!(repeat, Err(GrammarError::InvalidRepeat { min: 3, max: 2, .. })));

        let empty = GrammarBuilder::new("Broken").rule("a", seq(Vec::<Expr>::new())).build();
        assert!(matches!(empty, Err(GrammarError::EmptyRule { kind: "sequence", .. })));

        let range = GrammarBuilder::new("Broken").rule("a", crate::expr::range('z', 'a')).build();
        assert!(matches!(range, Err(GrammarError::InvalidRange { .. })));

        let nothing = GrammarBuilder::new("Broken").build();
        assert!(matches!(nothing, Err(GrammarError::EmptyGrammar { .. })));
    }

    #[test]
    fn grammars_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Grammar>();

        let g = base();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let g = Arc::clone(&g);
                std::thread::spawn(move || g.parse("world").map(|m| m.length()).ok())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(5));
        }
    }

    #[test]
    fn test_does_not_require_full_input() {
        let g = GrammarBuilder::new("Digits")
            .rule("digits", pattern("[0-9]+"))
            .build()
            .unwrap();

        assert_eq!(g.test("12ab"), Some(2));
        assert_eq!(g.test("ab"), None);
    }
}
