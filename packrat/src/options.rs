// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::num::NonZeroUsize;

/// Default for [`ParseOptions::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Options of a single [`Grammar::parse_with`](crate::Grammar::parse_with) call.
///
/// # Examples
///
/// ```
/// # use std::num::NonZeroUsize;
/// # use packrat::ParseOptions;
/// let options = ParseOptions::new()
///     .memoize(true)
///     .root("sum")
///     .call_limit(NonZeroUsize::new(10_000));
///
/// assert!(options.memoize);
/// assert!(options.require_full_consumption);
/// assert_eq!(options.root.as_deref(), Some("sum"));
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseOptions {
    /// Byte offset parsing starts at. Defaults to `0`.
    pub start_offset: usize,
    /// Whether to use a [`MemoizedInput`](crate::MemoizedInput). Defaults to `false`.
    pub memoize: bool,
    /// Whether the root rule has to match up to the end of the input. Defaults to `true`.
    pub require_full_consumption: bool,
    /// Rule to start with instead of the root of the grammar.
    pub root: Option<String>,
    /// Maximum number of rule executions before the parse fails with
    /// [`ParseErrorKind::CallLimit`](crate::ParseErrorKind::CallLimit). Unlimited by default.
    pub call_limit: Option<NonZeroUsize>,
    /// Maximum number of rule executions nested inside each other before the parse fails with
    /// [`ParseErrorKind::DepthLimit`](crate::ParseErrorKind::DepthLimit). Defaults to
    /// [`DEFAULT_MAX_DEPTH`].
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> ParseOptions {
        ParseOptions {
            start_offset: 0,
            memoize: false,
            require_full_consumption: true,
            root: None,
            call_limit: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Creates the default options.
    pub fn new() -> ParseOptions {
        ParseOptions::default()
    }

    /// Sets `start_offset`.
    pub fn start_offset(mut self, offset: usize) -> ParseOptions {
        self.start_offset = offset;
        self
    }

    /// Sets `memoize`.
    pub fn memoize(mut self, memoize: bool) -> ParseOptions {
        self.memoize = memoize;
        self
    }

    /// Sets `require_full_consumption`.
    pub fn require_full_consumption(mut self, require: bool) -> ParseOptions {
        self.require_full_consumption = require;
        self
    }

    /// Sets `root`.
    pub fn root(mut self, name: &str) -> ParseOptions {
        self.root = Some(name.to_owned());
        self
    }

    /// Sets `call_limit`.
    pub fn call_limit(mut self, limit: Option<NonZeroUsize>) -> ParseOptions {
        self.call_limit = limit;
        self
    }

    /// Sets `max_depth`.
    pub fn max_depth(mut self, depth: usize) -> ParseOptions {
        self.max_depth = depth;
        self
    }
}
