// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! JSON documents, evaluated to [`Value`]s.

use std::sync::Arc;

use once_cell::sync::Lazy;
use packrat::expr::{alias, choice, opt, pattern, seq, zero_or_more, Expr};
use packrat::{Grammar, GrammarBuilder, Match, ParseError, Value};
use serde_json::Map;

use crate::space;

static GRAMMAR: Lazy<Arc<Grammar>> = Lazy::new(|| {
    GrammarBuilder::new("Json")
        .rule(
            "json",
            seq([space(), alias("value"), space()]).value(|m| {
                m.capture("value").map_or(Value::Null, |value| value.value())
            }),
        )
        .rule(
            "value",
            choice([
                alias("object"),
                alias("array"),
                alias("string"),
                alias("number"),
                alias("bool"),
                alias("null"),
            ]),
        )
        .rule(
            "object",
            seq([
                "{".into(),
                space(),
                opt(seq([
                    alias("pair"),
                    zero_or_more(seq([space(), ",".into(), space(), alias("pair")])),
                ])),
                space(),
                "}".into(),
            ])
            .value(object),
        )
        .rule(
            "pair",
            seq([
                alias("string").label("key"),
                space(),
                ":".into(),
                space(),
                alias("value"),
            ]),
        )
        .rule(
            "array",
            seq([
                "[".into(),
                space(),
                opt(seq([
                    alias("value"),
                    zero_or_more(seq([space(), ",".into(), space(), alias("value")])),
                ])),
                space(),
                "]".into(),
            ])
            .value(array),
        )
        .rule(
            "string",
            pattern(r#""(?:[^"\\\x00-\x1F]|\\(?:["\\/bfnrt]|u[0-9a-fA-F]{4}))*""#).value(literal),
        )
        .rule(
            "number",
            pattern(r"-?(?:0|[1-9][0-9]*)(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?").value(literal),
        )
        .rule(
            "bool",
            choice(["true".into(), "false".into()]).value(|m| Value::Bool(m.text() == "true")),
        )
        .rule("null", Expr::from("null").value(|_| Value::Null))
        .build()
        .expect("the JSON grammar is well-formed")
});

/// Returns the JSON grammar.
pub fn grammar() -> Arc<Grammar> {
    Arc::clone(&GRAMMAR)
}

/// Parses `input` into a [`Value`].
///
/// # Examples
///
/// ```
/// # use packrat_grammars::json;
/// let value = json::parse(r#"{"a": [1, 2.5, "three", null]}"#).unwrap();
///
/// assert_eq!(value["a"][1], 2.5);
/// assert_eq!(value["a"][2], "three");
/// assert!(json::parse("[1, 2,]").is_err());
/// ```
pub fn parse(input: &str) -> Result<Value, ParseError> {
    GRAMMAR.parse(input).map(|json| json.value())
}

// Strings and numbers are valid JSON on their own once matched.
fn literal(m: &Match<'_, '_>) -> Value {
    serde_json::from_str(m.text()).unwrap_or(Value::Null)
}

fn object(m: &Match<'_, '_>) -> Value {
    let mut map = Map::new();

    for pair in m.named_matches() {
        if let (Some(key), Some(value)) = (pair.capture("key"), pair.capture("value")) {
            if let Value::String(key) = key.value() {
                map.insert(key, value.value());
            }
        }
    }

    Value::Object(map)
}

fn array(m: &Match<'_, '_>) -> Value {
    Value::Array(m.named_matches().iter().map(Match::value).collect())
}
