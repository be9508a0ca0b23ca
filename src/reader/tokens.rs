use std::iter::Peekable;
use std::str::{FromStr, SplitAsciiWhitespace};

/// Whitespace-delimited token reader over a node body.
///
/// Once a token fails to parse the stream is marked as failed and every
/// further read yields `None`, so callers can read a whole group and check
/// for success once.
pub struct TokenStream<'a> {
    tokens: Peekable<SplitAsciiWhitespace<'a>>,
    failed: bool,
}

impl<'a> TokenStream<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            tokens: text.split_ascii_whitespace().peekable(),
            failed: false,
        }
    }

    /// Parses the next token as `T`.
    pub fn next_value<T: FromStr>(&mut self) -> Option<T> {
        if self.failed {
            return None;
        }
        let value = self.tokens.next().and_then(|t| t.parse().ok());
        if value.is_none() {
            self.failed = true;
        }
        value
    }

    pub fn next_i64(&mut self) -> Option<i64> {
        self.next_value()
    }

    pub fn next_f64(&mut self) -> Option<f64> {
        self.next_value()
    }

    /// Reads `N` integers, or `None` if the group is incomplete or malformed.
    pub fn next_group<const N: usize>(&mut self) -> Option<[i64; N]> {
        let mut group = [0; N];
        for slot in &mut group {
            *slot = self.next_i64()?;
        }
        Some(group)
    }

    /// `true` if no tokens are left to read.
    pub fn at_end(&mut self) -> bool {
        self.tokens.peek().is_none()
    }

    /// Number of unread tokens, consuming them.
    pub fn drain_count(&mut self) -> usize {
        self.tokens.by_ref().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_groups_until_end() {
        let mut ts = TokenStream::new(" 0 1\n2\t3 4 ");
        assert_eq!(ts.next_group::<2>(), Some([0, 1]));
        assert_eq!(ts.next_group::<2>(), Some([2, 3]));
        assert_eq!(ts.next_group::<2>(), None);
        assert!(ts.at_end());
    }

    #[test]
    fn malformed_token_stops_the_stream() {
        let mut ts = TokenStream::new("1 x 2");
        assert_eq!(ts.next_i64(), Some(1));
        assert_eq!(ts.next_i64(), None);
        assert_eq!(ts.next_i64(), None);
    }

    #[test]
    fn floats_accept_exponents() {
        let mut ts = TokenStream::new("1e-3 -2.5");
        assert_eq!(ts.next_f64(), Some(1e-3));
        assert_eq!(ts.next_f64(), Some(-2.5));
        assert!(ts.at_end());
    }
}
