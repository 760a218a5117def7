/*!
The backtracking matcher.

## Design
Tokens expose a set protocol: applying a token (or a whole sub-chain) to a [`MatchState`] yields the ordered set of successor states, most preferred first. Simple tokens (literals, classes, anchors, backreferences) are deterministic and yield at most one successor. Repetitions and groups may yield many.

The driver walks a chain with explicit continuations: entering a group pushes a "close this group, then continue after it" continuation, and reaching the tail pops it. Alternatives and repetition candidates are tried in preference order and the first state that reaches the end of the whole pattern wins.

Repetitions are matched by frontiers. Frontier *k* is the set of states reachable after exactly *k* applications of the repeated sub-chain; it is computed from frontier *k - 1* in one pass. Expansion stops when the count reaches `max`, when a frontier is empty, or when a frontier reaches no offset that an earlier frontier has not already reached. The last rule guarantees termination for sub-chains that can match the empty string. If it fires before `min`, the frontiers from then on only revisit known offsets and repeat with some period, so `min` is reached by skipping whole periods. A greedy repetition tries the rest of the pattern from the highest frontier down to `min`, a stingy one from `min` upward, expanding lazily.

Without backreferences, two states at the same offset always have the same future, so frontiers are deduplicated by offset, keeping the more preferred state.

Matching is not guaranteed to run in polynomial time. Pathological patterns like `(a*)*b` against long runs of `a` can take exponential time.
*/
use std::collections::HashSet;

use bitflags::bitflags;
use ib_unicode::{ascii::is_word_char, case::CharCaseExt};
use itertools::Itertools;

use crate::{
    matcher::input::CharSource,
    regex::token::{AnchorKind, BoundaryKind, Program, TokenId, TokenKind},
};

mod config;
pub mod input;
mod matches;

pub use config::MatchConfig;
pub use matches::Match;
pub(crate) use matches::MatchState;

bitflags! {
    /// Per-search flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MatchFlags: u8 {
        /// The search does not start at the beginning of a line. `^` never matches, not even after a newline in multiline mode.
        const NOT_BOL = 1 << 0;
        /// The input does not end at the end of a line. `$` only matches before a newline in multiline mode. Akin to POSIX `REG_NOTEOL`.
        const NOT_EOL = 1 << 1;
        /// `^` matches at the offset the search started from instead of at offset 0.
        const ANCHOR_INDEX = 1 << 2;
    }
}

/// What to do when a chain reaches its tail.
#[derive(Clone, Copy)]
enum Cont<'c> {
    Done,
    /// Close the group (if capturing), then continue at `next`.
    Close {
        group: Option<usize>,
        next: TokenId,
        outer: &'c Cont<'c>,
    },
}

pub(crate) struct Matcher<'p, S> {
    prog: &'p Program,
    pub source: S,
    flags: MatchFlags,
}

impl<'p, S: CharSource> Matcher<'p, S> {
    pub fn new(prog: &'p Program, source: S, flags: MatchFlags) -> Self {
        Self {
            prog,
            source,
            flags,
        }
    }

    /// Whether `offset` is beyond the end of input, i.e. not even an empty match can start there.
    pub fn past_end(&mut self, offset: usize) -> bool {
        offset > 0 && self.source.char_at(offset - 1).is_none()
    }

    /// Anchored attempt at `offset`. `anchor` is where the search began.
    pub fn match_at(&mut self, offset: usize, anchor: usize) -> Option<MatchState> {
        let state = MatchState::new(self.prog.groups, anchor, offset);
        self.run(self.prog.root, state, &Cont::Done)
    }

    /// A match from offset 0 that ends at the end of input.
    pub fn full_match(&mut self) -> Option<MatchState> {
        let state = MatchState::new(self.prog.groups, 0, 0);
        self.run(self.prog.full, state, &Cont::Done)
    }

    /// Tries [`match_at()`](Self::match_at) at `offset` and every following offset up to the end of input.
    pub fn find_at(&mut self, offset: usize) -> Option<MatchState> {
        if self.past_end(offset) {
            return None;
        }
        let mut start = offset;
        loop {
            if let Some(state) = self.match_at(start, offset) {
                return Some(state);
            }
            self.source.char_at(start)?;
            start += 1;
        }
    }

    /// Runs the chain at `id` and then the continuation `k`. Returns the first state that reaches [`Cont::Done`].
    fn run(&mut self, mut id: TokenId, mut state: MatchState, k: &Cont<'_>) -> Option<MatchState> {
        let prog = self.prog;
        loop {
            let token = prog.token(id);
            match &token.kind {
                TokenKind::Tail => {
                    return match *k {
                        Cont::Done => Some(state),
                        Cont::Close { group, next, outer } => {
                            if let Some(g) = group {
                                state.end[g] = Some(state.offset);
                            }
                            self.run(next, state, outer)
                        }
                    }
                }
                TokenKind::Group {
                    index,
                    alternatives,
                } => {
                    let k = Cont::Close {
                        group: *index,
                        next: token.next,
                        outer: k,
                    };
                    for &alt in alternatives.iter() {
                        let mut s = state.clone();
                        if let Some(g) = *index {
                            s.start[g] = Some(s.offset);
                        }
                        if let Some(found) = self.run(alt, s, &k) {
                            return Some(found);
                        }
                    }
                    return None;
                }
                TokenKind::Repeat { .. } => return self.run_repeat(id, state, k),
                TokenKind::LookAhead { negate, sub } => {
                    state = self.look_ahead(*negate, *sub, state)?;
                }
                kind => state.offset = self.step(kind, &state)?,
            }
            id = token.next;
        }
    }

    /// Like [`run()`](Self::run), but collects every state that reaches [`Cont::Done`], in preference order.
    fn collect(
        &mut self,
        mut id: TokenId,
        mut state: MatchState,
        k: &Cont<'_>,
        out: &mut Vec<MatchState>,
    ) {
        let prog = self.prog;
        loop {
            let token = prog.token(id);
            match &token.kind {
                TokenKind::Tail => match *k {
                    Cont::Done => {
                        self.push_state(out, state);
                        return;
                    }
                    Cont::Close { group, next, outer } => {
                        if let Some(g) = group {
                            state.end[g] = Some(state.offset);
                        }
                        return self.collect(next, state, outer, out);
                    }
                },
                TokenKind::Group {
                    index,
                    alternatives,
                } => {
                    let k = Cont::Close {
                        group: *index,
                        next: token.next,
                        outer: k,
                    };
                    for &alt in alternatives.iter() {
                        let mut s = state.clone();
                        if let Some(g) = *index {
                            s.start[g] = Some(s.offset);
                        }
                        self.collect(alt, s, &k, out);
                    }
                    return;
                }
                TokenKind::Repeat { .. } => {
                    for s in self.repeat_states(id, state) {
                        self.collect(token.next, s, k, out);
                    }
                    return;
                }
                TokenKind::LookAhead { negate, sub } => {
                    match self.look_ahead(*negate, *sub, state) {
                        Some(s) => state = s,
                        None => return,
                    }
                }
                kind => match self.step(kind, &state) {
                    Some(offset) => state.offset = offset,
                    None => return,
                },
            }
            id = token.next;
        }
    }

    /// The successor set of a sub-chain.
    fn ends(&mut self, chain: TokenId, state: MatchState) -> Vec<MatchState> {
        let mut out = Vec::new();
        self.collect(chain, state, &Cont::Done, &mut out);
        out
    }

    fn push_state(&self, out: &mut Vec<MatchState>, state: MatchState) {
        if self.prog.backrefs || !out.iter().any(|s| s.offset == state.offset) {
            out.push(state);
        }
    }

    /// Applies the sub-chain once to every state of `level`.
    fn expand(&mut self, sub: TokenId, level: &[MatchState]) -> Vec<MatchState> {
        let mut next = Vec::new();
        for s in level {
            for e in self.ends(sub, s.clone()) {
                self.push_state(&mut next, e);
            }
        }
        next
    }

    fn run_repeat(&mut self, id: TokenId, state: MatchState, k: &Cont<'_>) -> Option<MatchState> {
        let token = self.prog.token(id);
        let next = token.next;
        let TokenKind::Repeat {
            sub,
            min,
            max,
            greedy,
        } = token.kind
        else {
            unreachable!("run_repeat on {:?}", token.kind)
        };

        let mut frontier = Frontier::new(sub, min, max, state);
        let mut tried = HashSet::new();
        if greedy {
            let mut levels = Vec::new();
            loop {
                levels.push((frontier.count, frontier.level.clone()));
                if !frontier.advance(self) {
                    break;
                }
            }
            for (count, level) in levels.into_iter().rev() {
                if count < min {
                    break;
                }
                for s in level {
                    if !self.prog.backrefs && !tried.insert(s.offset) {
                        continue;
                    }
                    if let Some(found) = self.run(next, s, k) {
                        return Some(found);
                    }
                }
            }
            None
        } else {
            loop {
                if frontier.count >= min {
                    for s in frontier.level.clone() {
                        if !self.prog.backrefs && !tried.insert(s.offset) {
                            continue;
                        }
                        if let Some(found) = self.run(next, s, k) {
                            return Some(found);
                        }
                    }
                }
                if !frontier.advance(self) {
                    return None;
                }
            }
        }
    }

    /// Every state a repetition can end in, in preference order.
    fn repeat_states(&mut self, id: TokenId, state: MatchState) -> Vec<MatchState> {
        let TokenKind::Repeat {
            sub,
            min,
            max,
            greedy,
        } = self.prog.token(id).kind
        else {
            unreachable!()
        };

        let mut frontier = Frontier::new(sub, min, max, state);
        let mut levels = Vec::new();
        loop {
            if frontier.count >= min {
                levels.push(frontier.level.clone());
            }
            if !frontier.advance(self) {
                break;
            }
        }
        if greedy {
            levels.reverse();
        }

        let mut out = Vec::new();
        for s in levels.into_iter().flatten() {
            self.push_state(&mut out, s);
        }
        out
    }

    /// Zero-width test. A positive lookahead keeps the captures of the sub-pattern.
    fn look_ahead(&mut self, negate: bool, sub: TokenId, state: MatchState) -> Option<MatchState> {
        let offset = state.offset;
        match (self.run(sub, state.clone(), &Cont::Done), negate) {
            (Some(found), false) => Some(found.at(offset)),
            (None, true) => Some(state),
            _ => None,
        }
    }

    /// Deterministic tokens: the successor offset, if any.
    fn step(&mut self, kind: &TokenKind, state: &MatchState) -> Option<usize> {
        let offset = state.offset;
        match kind {
            TokenKind::Literal {
                chars,
                case_insensitive,
            } => {
                for (i, &c) in chars.iter().enumerate() {
                    let h = self.source.char_at(offset + i)?;
                    if h != c && !(*case_insensitive && h.eq_ignore_case(c)) {
                        return None;
                    }
                }
                Some(offset + chars.len())
            }
            TokenKind::Any { newline, null } => {
                let c = self.source.char_at(offset)?;
                ((*newline || c != '\n') && (*null || c != '\0')).then_some(offset + 1)
            }
            TokenKind::Posix {
                class,
                negated,
                case_insensitive,
            } => {
                let c = self.source.char_at(offset)?;
                (class.matches(c, *case_insensitive) != *negated).then_some(offset + 1)
            }
            TokenKind::Set(set) => {
                let c = self.source.char_at(offset)?;
                set.matches(c).then_some(offset + 1)
            }
            TokenKind::Anchor { kind, multiline } => {
                self.anchor(*kind, *multiline, state).then_some(offset)
            }
            TokenKind::WordBoundary(kind) => {
                let before = offset > 0 && self.source.char_at(offset - 1).is_some_and(is_word_char);
                let after = self.source.char_at(offset).is_some_and(is_word_char);
                let hit = match kind {
                    BoundaryKind::Boundary => before != after,
                    BoundaryKind::NotBoundary => before == after,
                    BoundaryKind::Start => !before && after,
                    BoundaryKind::End => before && !after,
                };
                hit.then_some(offset)
            }
            TokenKind::Backref {
                group,
                case_insensitive,
            } => {
                // an unset group never matches
                let (start, end) = state.group(*group)?;
                for i in 0..end - start {
                    let a = self.source.char_at(start + i)?;
                    let b = self.source.char_at(offset + i)?;
                    if a != b && !(*case_insensitive && a.eq_ignore_case(b)) {
                        return None;
                    }
                }
                Some(offset + (end - start))
            }
            TokenKind::Tail
            | TokenKind::Repeat { .. }
            | TokenKind::Group { .. }
            | TokenKind::LookAhead { .. } => unreachable!("{kind:?} is not a step"),
        }
    }

    fn anchor(&mut self, kind: AnchorKind, multiline: bool, state: &MatchState) -> bool {
        let offset = state.offset;
        match kind {
            AnchorKind::Start => {
                if self.flags.contains(MatchFlags::NOT_BOL) {
                    return false;
                }
                let bol = if self.flags.contains(MatchFlags::ANCHOR_INDEX) {
                    offset == state.anchor
                } else {
                    offset == 0 && state.anchor == 0
                };
                bol || multiline && offset > 0 && self.source.char_at(offset - 1) == Some('\n')
            }
            AnchorKind::End => {
                let c = self.source.char_at(offset);
                (!self.flags.contains(MatchFlags::NOT_EOL) && c.is_none())
                    || multiline && c == Some('\n')
            }
        }
    }
}

/// Repetition frontiers, expanded one count at a time.
struct Frontier {
    sub: TokenId,
    min: usize,
    max: Option<usize>,
    /// States after exactly `count` applications of `sub`.
    level: Vec<MatchState>,
    count: usize,
    seen: HashSet<usize>,
    done: bool,
}

impl Frontier {
    fn new(sub: TokenId, min: usize, max: Option<usize>, state: MatchState) -> Self {
        Self {
            sub,
            min,
            max,
            seen: HashSet::from([state.offset]),
            level: vec![state],
            count: 0,
            done: false,
        }
    }

    /// Moves to the next frontier. Returns `false` once expansion has stopped, leaving the last frontier in place.
    fn advance<S: CharSource>(&mut self, m: &mut Matcher<'_, S>) -> bool {
        if self.done || self.max.is_some_and(|max| self.count >= max) {
            self.done = true;
            return false;
        }
        let next = m.expand(self.sub, &self.level);
        if next.is_empty() {
            self.done = true;
            return false;
        }

        let mut progress = false;
        for s in &next {
            progress |= self.seen.insert(s.offset);
        }
        self.count += 1;
        self.level = next;
        if !progress {
            // this frontier is still recorded, but nothing new can follow it
            self.done = true;
            if self.count < self.min {
                return self.pad(m);
            }
        }
        true
    }

    /// Carries a stalled frontier on to `min`.
    ///
    /// Without new offsets the frontiers repeat with some period, so only the first cycle is expanded and the rest is skipped.
    fn pad<S: CharSource>(&mut self, m: &mut Matcher<'_, S>) -> bool {
        let offsets = |level: &[MatchState]| {
            level
                .iter()
                .map(|s| s.offset)
                .sorted()
                .dedup()
                .collect_vec()
        };

        let mut history = vec![offsets(&self.level)];
        while self.count < self.min {
            let next = m.expand(self.sub, &self.level);
            if next.is_empty() {
                return false;
            }
            self.count += 1;
            self.level = next;

            let key = offsets(&self.level);
            if let Some(i) = history.iter().position(|k| *k == key) {
                let period = history.len() - i;
                for _ in 0..(self.min - self.count) % period {
                    self.level = m.expand(self.sub, &self.level);
                }
                self.count = self.min;
                break;
            }
            history.push(key);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        matcher::input::StrSource,
        regex::Regex,
        syntax::Syntax,
    };

    use super::*;

    fn find(pattern: &str, hay: &str) -> Option<(usize, usize)> {
        Regex::new(pattern)
            .unwrap()
            .find(hay)
            .map(|m| (m.start(), m.end()))
    }

    #[test]
    fn greedy_backtrack() {
        assert_eq!(find("a*", "aaab"), Some((0, 3)));
        assert_eq!(find("a*ab", "aaab"), Some((0, 4)));
        assert_eq!(find("(a|ab)(c|bcd)", "abcd"), Some((0, 4)));
        assert_eq!(find("a{2,3}", "aaaa"), Some((0, 3)));
        assert_eq!(find("a{2,3}", "a"), None);
        assert_eq!(find("x(ab){2}", "xab xabab"), Some((4, 9)));
    }

    #[test]
    fn stingy() {
        assert_eq!(find("a*?", "aaab"), Some((0, 0)));
        assert_eq!(find("a*?b", "aaab"), Some((0, 4)));
        assert_eq!(find("a+?", "aaab"), Some((0, 1)));
        assert_eq!(find("a{2,}?", "aaaa"), Some((0, 2)));
        assert_eq!(find("<.+?>", "<a><b>"), Some((0, 3)));
        assert_eq!(find("<.+>", "<a><b>"), Some((0, 6)));
    }

    #[test]
    fn empty_iterations() {
        assert_eq!(find("(a*)*b", "aab"), Some((0, 3)));
        assert_eq!(find("(a*)+", "b"), Some((0, 0)));
        assert_eq!(find("(a|){3}", ""), Some((0, 0)));
        assert_eq!(find("(a|){3}b", "ab"), Some((0, 2)));
        assert_eq!(find("(?:a?){5}a{2}", "aa"), Some((0, 2)));
        assert_eq!(find("(a*)*?c", "aac"), Some((0, 3)));
        assert_eq!(find("(\\b)*a", "a"), Some((0, 1)));

        // an offset first reached by a non-empty iteration can still repeat empty
        assert_eq!(find("(?:|a){3}b", "ab"), Some((0, 2)));
        assert_eq!(find("(a?|b){3}c", "bc"), Some((0, 2)));
        assert_eq!(find("(?:b?|a){4}$", "ba"), Some((0, 2)));
        assert_eq!(find("(?:b?|a){4}$", "a"), Some((0, 1)));
        assert_eq!(find("(?:|a){100}?b", "aab"), Some((0, 3)));
    }

    #[test]
    fn captures() {
        let re = Regex::new("(a|b)*").unwrap();
        let m = re.find("abab").unwrap();
        assert_eq!(m.range(), 0..4);
        assert_eq!(m.group(1), Some(3..4));

        let re = Regex::new("(a)|b").unwrap();
        let m = re.find("b").unwrap();
        assert_eq!(m.group(1), None);

        let re = Regex::new("(?=(ab))a").unwrap();
        let m = re.find("xab").unwrap();
        assert_eq!(m.range(), 1..2);
        assert_eq!(m.group(1), Some(1..3));
    }

    #[test]
    fn backrefs() {
        assert_eq!(find(r"(a+)b\1", "aabaa"), Some((0, 5)));
        assert_eq!(find(r"(a+)b\1", "aaba"), Some((1, 4)));
        assert_eq!(find(r"(\w+) \1", "say hello hello"), Some((4, 15)));
        assert_eq!(find(r"(a)|\1b", "b"), None);
        assert_eq!(find(r"(a|b)*\1", "abb"), Some((0, 3)));

        let re = Regex::builder()
            .config(MatchConfig::builder().case_insensitive(true).build())
            .build(r"(ab)\1")
            .unwrap();
        assert!(re.is_match("abAB"));
    }

    #[test]
    fn lookahead() {
        assert_eq!(find("a(?=b)", "acab"), Some((2, 3)));
        assert_eq!(find("a(?!b)", "abac"), Some((2, 3)));
        assert_eq!(find("(?!a)\\w", "aab"), Some((2, 3)));
    }

    #[test]
    fn anchor_flags() {
        let re = Regex::new("^a").unwrap();
        let mut s = StrSource::new("aa");
        assert!(re.match_at(&mut s, 0, MatchFlags::empty()).is_some());
        assert!(re.match_at(&mut s, 0, MatchFlags::NOT_BOL).is_none());
        assert!(re.match_at(&mut s, 1, MatchFlags::empty()).is_none());
        assert!(re.match_at(&mut s, 1, MatchFlags::ANCHOR_INDEX).is_some());
        assert!(re
            .match_at(&mut s, 1, MatchFlags::ANCHOR_INDEX | MatchFlags::NOT_BOL)
            .is_none());
        // the anchor is the search origin, not every scanned offset
        assert_eq!(
            re.find_at(&mut s, 1, MatchFlags::ANCHOR_INDEX).map(|m| m.range()),
            Some(1..2)
        );
        assert!(re.find_at(&mut StrSource::new("ba"), 0, MatchFlags::ANCHOR_INDEX).is_none());

        let re = Regex::new("a$").unwrap();
        assert!(re.find_at(&mut s, 0, MatchFlags::empty()).is_some());
        assert!(re.find_at(&mut s, 0, MatchFlags::NOT_EOL).is_none());

        let re = Regex::builder()
            .config(MatchConfig::builder().multiline(true).build())
            .build("^b$")
            .unwrap();
        let mut s = StrSource::new("a\nb\nc");
        assert_eq!(
            re.find_at(&mut s, 0, MatchFlags::NOT_EOL).map(|m| m.range()),
            Some(2..3)
        );
        // not even after a newline
        assert!(re.find_at(&mut s, 0, MatchFlags::NOT_BOL).is_none());
        assert!(re.match_at(&mut s, 2, MatchFlags::NOT_BOL).is_none());
    }

    #[test]
    fn word_boundaries() {
        assert_eq!(find(r"\bcat\b", "concat cat"), Some((7, 10)));
        assert_eq!(find(r"\Bcat", "cat concat"), Some((7, 10)));
        let re = Regex::builder().syntax(Syntax::EMACS).build(r"\<c[a-z]*\>").unwrap();
        assert_eq!(re.find("a cab").map(|m| m.range()), Some(2..5));
    }

    #[test]
    fn past_end() {
        let re = Regex::new("").unwrap();
        let mut s = StrSource::new("ab");
        assert!(re.find_at(&mut s, 2, MatchFlags::empty()).is_some());
        assert!(re.find_at(&mut s, 3, MatchFlags::empty()).is_none());
        assert!(re.match_at(&mut s, 3, MatchFlags::empty()).is_none());
    }
}
