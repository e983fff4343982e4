// packrat. A PEG execution engine with Packrat memoization
// Copyright (c) 2026 The packrat Developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

use std::fmt;

/// A byte offset into an input, used to compute human-readable locations.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Position<'i> {
    input: &'i str,
    pos: usize,
}

impl<'i> Position<'i> {
    /// Creates a `Position` at byte offset `pos` of `input`. Returns `None` if `pos` is out of
    /// bounds or not on a `char` boundary.
    ///
    /// # Examples
    ///
    /// ```
    /// # use packrat::Position;
    /// assert!(Position::new("ab", 2).is_some());
    /// assert!(Position::new("ab", 3).is_none());
    /// assert!(Position::new("嗨", 1).is_none());
    /// ```
    pub fn new(input: &'i str, pos: usize) -> Option<Position<'i>> {
        if input.is_char_boundary(pos) {
            Some(Position { input, pos })
        } else {
            None
        }
    }

    /// Returns the byte offset.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the line and column of the position, both starting at 1. Columns are counted in
    /// `char`s and `"\r\n"` counts as a single line break.
    ///
    /// # Examples
    ///
    /// ```
    /// # use packrat::Position;
    /// let input = "a\r\nb";
    ///
    /// assert_eq!(Position::new(input, 1).unwrap().line_col(), (1, 2));
    /// assert_eq!(Position::new(input, 3).unwrap().line_col(), (2, 1));
    /// ```
    pub fn line_col(&self) -> (usize, usize) {
        let mut chars = self.input[..self.pos].chars().peekable();
        let mut line_col = (1, 1);

        while let Some(c) = chars.next() {
            match c {
                '\r' if chars.peek() == Some(&'\n') => {
                    chars.next();
                    line_col = (line_col.0 + 1, 1);
                }
                '\n' => line_col = (line_col.0 + 1, 1),
                _ => line_col.1 += 1,
            }
        }

        line_col
    }

    /// Returns the line the position is on, without its line terminator.
    ///
    /// # Examples
    ///
    /// ```
    /// # use packrat::Position;
    /// let input = "a\r\nbc\nd";
    ///
    /// assert_eq!(Position::new(input, 0).unwrap().line_of(), "a");
    /// assert_eq!(Position::new(input, 4).unwrap().line_of(), "bc");
    /// assert_eq!(Position::new(input, 6).unwrap().line_of(), "d");
    /// ```
    pub fn line_of(&self) -> &'i str {
        let start = match self.input[..self.pos].rfind('\n') {
            Some(i) => i + 1,
            None => 0,
        };
        let end = match self.input[self.pos..].find('\n') {
            Some(i) => self.pos + i,
            None => self.input.len(),
        };

        let line = &self.input[start.min(end)..end];
        line.strip_suffix('\r').unwrap_or(line)
    }
}

impl<'i> fmt::Debug for Position<'i> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position").field("pos", &self.pos).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col() {
        let input = "a\rb\nc\r\nd嗨";

        let line_col = |pos| Position::new(input, pos).unwrap().line_col();

        assert_eq!(line_col(0), (1, 1));
        assert_eq!(line_col(1), (1, 2));
        assert_eq!(line_col(2), (1, 3));
        assert_eq!(line_col(3), (1, 4));
        assert_eq!(line_col(4), (2, 1));
        assert_eq!(line_col(5), (2, 2));
        assert_eq!(line_col(7), (3, 1));
        assert_eq!(line_col(8), (3, 2));
        assert_eq!(line_col(11), (3, 3));
    }

    #[test]
    fn line_of() {
        let input = "a\rb\nc\r\nd嗨";

        let line_of = |pos| Position::new(input, pos).unwrap().line_of();

        assert_eq!(line_of(0), "a\rb");
        assert_eq!(line_of(3), "a\rb");
        assert_eq!(line_of(4), "c");
        assert_eq!(line_of(5), "c");
        assert_eq!(line_of(7), "d嗨");
        assert_eq!(line_of(11), "d嗨");
    }

    #[test]
    fn empty_lines() {
        assert_eq!(Position::new("", 0).unwrap().line_of(), "");
        assert_eq!(Position::new("\n", 0).unwrap().line_of(), "");
        assert_eq!(Position::new("\n", 1).unwrap().line_of(), "");
        assert_eq!(Position::new("a\n", 2).unwrap().line_col(), (2, 1));
    }
}
