// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Arithmetic expressions with the usual precedence.
//!
//! ```text
//! expression   = space additive space
//! additive     = multitive (space additive_op space multitive)*
//! multitive    = unary (space multitive_op space unary)*
//! unary        = "-" space unary | primary
//! primary      = number | "(" space additive space ")"
//! additive_op  = "+" | "-"
//! multitive_op = "*" | "/" | "%"
//! ```
//!
//! Every rule evaluates to a number. Integer arithmetic is used as long as it is exact; anything
//! else falls back to `f64`. Results that are not finite evaluate to `null`.

use std::sync::Arc;

use once_cell::sync::Lazy;
use packrat::expr::{alias, choice, pattern, seq, zero_or_more};
use packrat::{Grammar, GrammarBuilder, Match, ParseError, Value};

use crate::space;

static GRAMMAR: Lazy<Arc<Grammar>> = Lazy::new(|| {
    GrammarBuilder::new("Arithmetic")
        .rule(
            "expression",
            seq([space(), alias("additive"), space()]).value(|m| inner(m, "additive")),
        )
        .rule(
            "additive",
            seq([
                alias("multitive").label("head"),
                zero_or_more(seq([
                    space(),
                    alias("additive_op").label("op"),
                    space(),
                    alias("multitive").label("operand"),
                ])),
            ])
            .value(fold),
        )
        .rule(
            "multitive",
            seq([
                alias("unary").label("head"),
                zero_or_more(seq([
                    space(),
                    alias("multitive_op").label("op"),
                    space(),
                    alias("unary").label("operand"),
                ])),
            ])
            .value(fold),
        )
        .rule(
            "unary",
            choice([
                seq(["-".into(), space(), alias("unary")]).value(negate),
                alias("primary"),
            ]),
        )
        .rule(
            "primary",
            choice([
                alias("number"),
                seq([
                    "(".into(),
                    space(),
                    alias("additive"),
                    space(),
                    ")".into(),
                ])
                .value(|m| inner(m, "additive")),
            ]),
        )
        .rule(
            "number",
            pattern(r"[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?").value(number),
        )
        .rule("additive_op", choice(["+".into(), "-".into()]))
        .rule(
            "multitive_op",
            choice(["*".into(), "/".into(), "%".into()]),
        )
        .build()
        .expect("the arithmetic grammar is well-formed")
});

/// Returns the arithmetic grammar.
pub fn grammar() -> Arc<Grammar> {
    Arc::clone(&GRAMMAR)
}

/// Parses and evaluates `input`.
///
/// # Examples
///
/// ```
/// # use packrat_grammars::{arithmetic, Value};
/// assert_eq!(arithmetic::evaluate("1 + 2 * 3").unwrap(), Value::from(7));
/// assert_eq!(arithmetic::evaluate("7 / 2").unwrap(), Value::from(3.5));
/// assert!(arithmetic::evaluate("1 +").is_err());
/// ```
pub fn evaluate(input: &str) -> Result<Value, ParseError> {
    GRAMMAR.parse(input).map(|expression| expression.value())
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Number {
        match value.as_i64() {
            Some(int) => Number::Int(int),
            None => Number::Float(value.as_f64().unwrap_or(f64::NAN)),
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Number::Int(int) => int as f64,
            Number::Float(float) => float,
        }
    }

    fn apply(self, op: &str, rhs: Number) -> Number {
        if let (Number::Int(a), Number::Int(b)) = (self, rhs) {
            let exact = match op {
                "+" => a.checked_add(b),
                "-" => a.checked_sub(b),
                "*" => a.checked_mul(b),
                "/" => match a.checked_rem(b) {
                    Some(0) => a.checked_div(b),
                    _ => None,
                },
                "%" => a.checked_rem(b),
                _ => unreachable!("operators are limited by the grammar"),
            };

            if let Some(int) = exact {
                return Number::Int(int);
            }
        }

        let (a, b) = (self.to_f64(), rhs.to_f64());
        Number::Float(match op {
            "+" => a + b,
            "-" => a - b,
            "*" => a * b,
            "/" => a / b,
            "%" => a % b,
            _ => unreachable!("operators are limited by the grammar"),
        })
    }

    fn into_value(self) -> Value {
        match self {
            Number::Int(int) => Value::from(int),
            Number::Float(float) => Value::from(float),
        }
    }
}

fn inner(m: &Match<'_, '_>, name: &str) -> Value {
    m.capture(name).map_or(Value::Null, |inner| inner.value())
}

fn number(m: &Match<'_, '_>) -> Value {
    match m.text().parse::<i64>() {
        Ok(int) => Value::from(int),
        Err(_) => m.text().parse::<f64>().map_or(Value::Null, Value::from),
    }
}

fn negate(m: &Match<'_, '_>) -> Value {
    Number::Int(0)
        .apply("-", Number::of(&inner(m, "unary")))
        .into_value()
}

// `head (op operand)*`, folded left to right.
fn fold(m: &Match<'_, '_>) -> Value {
    let (head, tail) = match m.matches() {
        [head, tail] => (head, tail),
        _ => return Value::Null,
    };

    let mut result = Number::of(&head.value());
    for operation in tail.matches() {
        if let (Some(op), Some(operand)) = (operation.capture("op"), operation.capture("operand")) {
            result = result.apply(op.text(), Number::of(&operand.value()));
        }
    }

    result.into_value()
}
