// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

#[doc(hidden)]
#[macro_export]
macro_rules! consumes_to {
    ( @next $matches:expr, $name:ident, $start:expr, $end:expr ) => {{
        let name = stringify!($name);
        let node = match $matches.next() {
            Some(node) => node,
            None => panic!("expected {} but found nothing", name),
        };

        assert!(
            node.has_name(name),
            "expected {} but found {:?} at {}",
            name,
            node.names(),
            node.offset()
        );
        assert_eq!(
            (node.offset(), node.offset() + node.length()),
            ($start, $end),
            "wrong position for {}",
            name
        );

        node
    }};
    ( $matches:expr, [] ) => {
        if let Some(extra) = $matches.next() {
            panic!(
                "expected nothing but found {:?} at {}..{}",
                extra.names(),
                extra.offset(),
                extra.offset() + extra.length()
            );
        }
    };
    ( $matches:expr, [ $name:ident ( $start:expr, $end:expr )
                       $( , $names:ident $calls:tt )* $(,)* ] ) => {
        let node = $crate::consumes_to!(@next $matches, $name, $start, $end);

        let mut inner = node.named_matches().into_iter();
        $crate::consumes_to!(inner, []);

        $crate::consumes_to!($matches, [ $( $names $calls ),* ]);
    };
    ( $matches:expr, [ $name:ident ( $start:expr, $end:expr,
                                     [ $( $nested_names:ident $nested_calls:tt ),* $(,)* ] )
                       $( , $names:ident $calls:tt )* $(,)* ] ) => {
        let node = $crate::consumes_to!(@next $matches, $name, $start, $end);

        let mut inner = node.named_matches().into_iter();
        $crate::consumes_to!(inner, [ $( $nested_names $nested_calls ),* ]);

        $crate::consumes_to!($matches, [ $( $names $calls ),* ]);
    };
}

/// Testing tool that compares the named matches of a parse to an expected tree.
///
/// Every expected token is written `name(start, end)` or, to also check its named descendants,
/// `name(start, end, [ .. ])`. Matches without any name are looked through, so the expected
/// tree only lists named matches, and every one of them has to be listed.
///
/// # Examples
///
/// ```
/// # #[macro_use]
/// # extern crate packrat;
/// # use packrat::GrammarBuilder;
/// # use packrat::expr::{alias, pattern, seq};
/// # fn main() {
/// let grammar = GrammarBuilder::new("Sum")
///     .rule("sum", seq([alias("number"), "+".into(), alias("number")]))
///     .rule("number", pattern("[0-9]+"))
///     .build()
///     .unwrap();
///
/// parses_to! {
///     grammar: grammar,
///     input: "1+23",
///     rule: "sum",
///     tokens: [
///         sum(0, 4, [
///             number(0, 1),
///             number(2, 4)
///         ])
///     ]
/// };
/// # }
/// ```
#[macro_export]
macro_rules! parses_to {
    ( grammar: $grammar:expr, input: $string:expr, rule: $rule:expr,
      tokens: [ $( $names:ident $calls:tt ),* $(,)* ] ) => {
        {
            let grammar = &$grammar;
            let options = $crate::ParseOptions::new().root($rule);
            let root = match grammar.parse_with($string, &options) {
                Ok(root) => root,
                Err(error) => panic!("{}", error),
            };

            let mut matches = ::std::vec![root].into_iter();
            $crate::consumes_to!(matches, [ $( $names $calls ),* ]);
        }
    };
}
