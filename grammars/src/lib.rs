// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! # packrat grammars
//!
//! Contains a series of default grammars. Every grammar is built once, on first use, and shared
//! afterwards.

#![doc(html_root_url = "https://docs.rs/packrat_grammars")]

pub use packrat::{Grammar, Match, ParseError, Value};

pub mod arithmetic;
pub mod json;

use packrat::expr::{pattern, Expr};

// Optional whitespace. Inlined rather than named so that it stays out of the named matches.
fn space() -> Expr {
    pattern(r"[ \t\r\n]*")
}
