// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

#[macro_use]
extern crate packrat;

use packrat::ParseOptions;
use packrat_grammars::json::{grammar, parse};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn null() {
    parses_to! {
        grammar: grammar(),
        input: "null",
        rule: "null",
        tokens: [
            null(0, 4)
        ]
    };
}

#[test]
fn bool() {
    parses_to! {
        grammar: grammar(),
        input: "false",
        rule: "bool",
        tokens: [
            bool(0, 5)
        ]
    };
}

#[test]
fn number_zero() {
    parses_to! {
        grammar: grammar(),
        input: "0",
        rule: "number",
        tokens: [
            number(0, 1)
        ]
    };
}

#[test]
fn float() {
    parses_to! {
        grammar: grammar(),
        input: "100.001",
        rule: "number",
        tokens: [
            number(0, 7)
        ]
    };
}

#[test]
fn float_with_exp() {
    parses_to! {
        grammar: grammar(),
        input: "100.001E+100",
        rule: "number",
        tokens: [
            number(0, 12)
        ]
    };
}

#[test]
fn number_minus_zero() {
    parses_to! {
        grammar: grammar(),
        input: "-0",
        rule: "number",
        tokens: [
            number(0, 2)
        ]
    };
}

#[test]
fn string_with_escapes() {
    parses_to! {
        grammar: grammar(),
        input: "\"asd\\u0000\\\"\"",
        rule: "string",
        tokens: [
            string(0, 13)
        ]
    };
}

#[test]
fn array_empty() {
    parses_to! {
        grammar: grammar(),
        input: "[ ]",
        rule: "array",
        tokens: [
            array(0, 3)
        ]
    };
}

#[test]
fn array() {
    parses_to! {
        grammar: grammar(),
        input: "[0.0e1, false, null, \"a\", [0]]",
        rule: "array",
        tokens: [
            array(0, 30, [
                value(1, 6),
                value(8, 13),
                value(15, 19),
                value(21, 24),
                value(26, 29, [
                    value(27, 28)
                ])
            ])
        ]
    };
}

#[test]
fn object() {
    parses_to! {
        grammar: grammar(),
        input: "{\"a\" : 3, \"b\" : [{}, 3]}",
        rule: "object",
        tokens: [
            object(0, 24, [
                pair(1, 8, [
                    key(1, 4),
                    value(7, 8)
                ]),
                pair(10, 23, [
                    key(10, 13),
                    value(16, 23, [
                        value(17, 19),
                        value(21, 22)
                    ])
                ])
            ])
        ]
    };
}

#[test]
fn values() {
    let value = parse(
        r#"
        {
            "name": "packrat",
            "tags": ["peg", "parser"],
            "version": 0.1,
            "stable": false,
            "escaped": "a\"bé",
            "nested": {"empty": {}, "list": [[], [null]]},
            "negative": -12
        }
        "#,
    )
    .unwrap();

    assert_eq!(
        value,
        json!({
            "name": "packrat",
            "tags": ["peg", "parser"],
            "version": 0.1,
            "stable": false,
            "escaped": "a\"bé",
            "nested": {"empty": {}, "list": [[], [null]]},
            "negative": -12
        })
    );
}

#[test]
fn invalid_documents() {
    for input in ["", "[1,]", "{\"a\" 1}", "01", "\"\u{1}\"", "[1] [2]", "tru"] {
        assert!(parse(input).is_err(), "{:?} should not parse", input);
    }
}

#[test]
fn memoized_parse() {
    let g = grammar();
    let input = r#"[{"a": [1, {"b": null}]}, [true, "x"]]"#;

    let plain = g.parse(input).unwrap();
    let memoized = g.parse_with(input, &ParseOptions::new().memoize(true)).unwrap();

    assert_eq!(plain.value(), memoized.value());
    assert_eq!(plain.dump(), memoized.dump());
}
