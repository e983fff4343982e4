// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::sync::Arc;

use packrat::expr::{alias, choice, literal, opt, pattern, seq, zero_or_more};
use packrat::{Grammar, GrammarBuilder, Match, ParseOptions};
use proptest::prelude::*;

fn sentences() -> Arc<Grammar> {
    GrammarBuilder::new("Sentences")
        .rule(
            "text",
            zero_or_more(choice([alias("sentence"), alias("word"), " ".into()])),
        )
        .rule(
            "sentence",
            seq([
                alias("word"),
                zero_or_more(seq([" ".into(), alias("word")])),
                choice([".".into(), "!".into()]),
            ]),
        )
        .rule("word", choice([alias("number"), pattern("[a-c]+")]))
        .rule("number", seq([pattern("[0-9]+"), opt(seq([".".into(), pattern("[0-9]+")]))]))
        .build()
        .unwrap()
}

// Children lie inside their parent, in order and without overlapping.
fn check_tree(node: &Match<'_, '_>, input: &str) -> Result<(), TestCaseError> {
    prop_assert_eq!(node.text(), &input[node.offset()..node.offset() + node.length()]);

    let mut pos = node.offset();
    for child in node.matches() {
        prop_assert!(child.offset() >= pos);
        pos = child.offset() + child.length();
        check_tree(child, input)?;
    }
    prop_assert!(pos <= node.offset() + node.length());

    Ok(())
}

proptest! {
    #[test]
    fn literals_match_prefixes(literal_text in "[ab]{0,3}", input in "[ab]{0,5}") {
        let g = GrammarBuilder::new("Literal")
            .rule("literal", literal(&literal_text))
            .build()
            .unwrap();

        let expected = if input.starts_with(literal_text.as_str()) {
            Some(literal_text.len())
        } else {
            None
        };

        prop_assert_eq!(g.test(&input), expected);
    }

    #[test]
    fn text_round_trips(input in "[a-c0-9 .!]{0,24}") {
        let g = sentences();
        let options = ParseOptions::new().require_full_consumption(false);

        let root = g.parse_with(&input, &options).unwrap();

        check_tree(&root, &input)?;
    }

    #[test]
    fn memoization_is_transparent(input in "[a-c0-9 .!]{0,24}") {
        let g = sentences();

        let plain = g.parse(&input);
        let memoized = g.parse_with(&input, &ParseOptions::new().memoize(true));

        match (plain, memoized) {
            (Ok(plain), Ok(memoized)) => {
                prop_assert_eq!(plain.dump(), memoized.dump());
                prop_assert_eq!(plain.events(), memoized.events());
            }
            (Err(plain), Err(memoized)) => prop_assert_eq!(plain, memoized),
            (plain, memoized) => {
                prop_assert!(false, "{:?} differs from {:?}", plain, memoized);
            }
        }
    }
}
