use std::iter::FusedIterator;

use tracing::trace;

use crate::{
    matcher::{input::CharSource, Match, MatchFlags, Matcher},
    regex::Regex,
};

#[derive(Debug)]
enum State {
    Unknown,
    Found(Match),
    Exhausted,
}

/// A lazy iterator over successive non-overlapping matches.
///
/// Created by [`Regex::find_iter()`] and [`Regex::find_iter_at()`].
///
/// Each search scans forward from the end of the previous match. An empty match moves the next search one char further, so the iterator always terminates on finite input.
///
/// [`has_next()`](Self::has_next) can be used to peek without consuming:
/// ```
/// use ib_regexp::{matcher::input::StrSource, Regex};
///
/// let re = Regex::new("a").unwrap();
/// let mut matches = re.find_iter(StrSource::new("banana"));
/// assert!(matches.has_next());
/// assert!(matches.has_next());
/// assert_eq!(matches.next_match().map(|m| m.start()), Some(1));
/// assert_eq!(matches.next_match().map(|m| m.start()), Some(3));
/// assert_eq!(matches.next_match().map(|m| m.start()), Some(5));
/// assert!(!matches.has_next());
/// ```
pub struct Matches<'r, S> {
    regex: &'r Regex,
    source: S,
    offset: usize,
    flags: MatchFlags,
    state: State,
}

impl<'r, S: CharSource> Matches<'r, S> {
    pub(crate) fn new(regex: &'r Regex, source: S, offset: usize, flags: MatchFlags) -> Self {
        Self {
            regex,
            source,
            offset,
            flags,
            state: State::Unknown,
        }
    }

    /// Whether another match exists. Searches at most once per match.
    pub fn has_next(&mut self) -> bool {
        if let State::Unknown = self.state {
            let mut matcher = Matcher::new(&self.regex.imp, &mut self.source, self.flags);
            let found = matcher.find_at(self.offset).map(|state| state.into_match());
            trace!(offset = self.offset, found = ?found.as_ref().map(Match::range), "search");
            self.state = match found {
                Some(m) => State::Found(m),
                None => State::Exhausted,
            };
        }
        matches!(self.state, State::Found(_))
    }

    /// The next match, or `None` once exhausted.
    pub fn next_match(&mut self) -> Option<Match> {
        if !self.has_next() {
            return None;
        }
        let State::Found(m) = std::mem::replace(&mut self.state, State::Unknown) else {
            return None;
        };
        self.offset = if m.is_empty() { m.end() + 1 } else { m.end() };
        self.source.advance(self.offset);
        Some(m)
    }

    /// Where the next search starts.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: CharSource> Iterator for Matches<'_, S> {
    type Item = Match;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.next_match()
    }
}

impl<S: CharSource> FusedIterator for Matches<'_, S> {}

#[cfg(test)]
mod tests {
    use crate::{
        matcher::input::{ReaderSource, StrSource},
        Regex, Syntax,
    };

    use super::*;

    fn starts(pattern: &str, hay: &str) -> Vec<(usize, usize)> {
        Regex::new(pattern)
            .unwrap()
            .find_iter(StrSource::new(hay))
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    #[test]
    fn banana() {
        let re = Regex::new("a").unwrap();
        let mut matches = re.find_iter(StrSource::new("banana"));
        let starts: Vec<_> = matches.by_ref().map(|m| m.start()).collect();
        assert_eq!(starts, [1, 3, 5]);
        assert!(!matches.has_next());
        assert!(matches.next().is_none());
    }

    #[test]
    fn empty_matches() {
        assert_eq!(starts("a*", "bb"), [(0, 0), (1, 1), (2, 2)]);
        assert_eq!(starts("a*", ""), [(0, 0)]);
        assert_eq!(starts("a*", "baa"), [(0, 0), (1, 3), (3, 3)]);
        assert_eq!(starts("a*?", "aa"), [(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn non_overlapping() {
        assert_eq!(starts("aa", "aaaaa"), [(0, 2), (2, 4)]);
        assert_eq!(starts("a|ab", "abab"), [(0, 1), (2, 3)]);
    }

    #[test]
    fn anchors_across_matches() {
        // `^` only at the real start
        assert_eq!(starts("^a", "aaa"), [(0, 1)]);

        let re = Regex::builder()
            .config(crate::MatchConfig::builder().multiline(true).build())
            .build("^\\w")
            .unwrap();
        let found: Vec<_> = re
            .find_iter(StrSource::new("ab\ncd\nef"))
            .map(|m| m.start())
            .collect();
        assert_eq!(found, [0, 3, 6]);

        // anchor-relative: `^` matches where each search starts
        let re = Regex::new("^a").unwrap();
        let found: Vec<_> = re
            .find_iter_at(StrSource::new("aab"), 0, MatchFlags::ANCHOR_INDEX)
            .map(|m| m.range())
            .collect();
        assert_eq!(found, [0..1, 1..2]);
    }

    #[test]
    fn start_offset() {
        let re = Regex::new("a").unwrap();
        let found: Vec<_> = re
            .find_iter_at(StrSource::new("banana"), 2, MatchFlags::empty())
            .map(|m| m.start())
            .collect();
        assert_eq!(found, [3, 5]);
        assert_eq!(
            re.find_iter_at(StrSource::new("ba"), 3, MatchFlags::empty())
                .count(),
            0
        );
    }

    #[test]
    fn streaming() {
        let re = Regex::builder()
            .syntax(Syntax::POSIX_EXTENDED)
            .build("[0-9]+")
            .unwrap();
        let text = "x1 22 333 ".repeat(1000);
        let mut source = ReaderSource::new(text.as_bytes());
        let mut matches = re.find_iter(&mut source);
        assert_eq!(matches.by_ref().take(3).map(|m| m.range()).collect::<Vec<_>>(), [1..2, 3..5, 6..9]);
        assert_eq!(matches.count(), 2997);
        // consumed input was released
        assert!(source.buffered() < 16);
    }

    #[test]
    fn peek_is_idempotent() {
        let re = Regex::new("b").unwrap();
        let mut matches = re.find_iter(StrSource::new("abcb"));
        assert!(matches.has_next());
        assert!(matches.has_next());
        assert_eq!(matches.offset(), 0);
        assert_eq!(matches.next().map(|m| m.start()), Some(1));
        assert_eq!(matches.offset(), 2);
        assert_eq!(matches.next().map(|m| m.start()), Some(3));
        assert!(!matches.has_next());
    }
}
