use std::ops::Range;

use crate::matcher::input::StrSource;

/// A successful match. Offsets are char offsets into the source.
///
/// Group 0 is the whole match.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Match {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) groups: Box<[Option<(usize, usize)>]>,
}

impl Match {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Number of groups, including group 0.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// The range of group `i`, or `None` if the group did not participate in the match.
    ///
    /// ```
    /// use ib_regexp::Regex;
    ///
    /// let re = Regex::new("(a)|(b)").unwrap();
    /// let m = re.find("b").unwrap();
    /// assert_eq!(m.group(0), Some(0..1));
    /// assert_eq!(m.group(1), None);
    /// assert_eq!(m.group(2), Some(0..1));
    /// assert_eq!(m.group(3), None);
    /// ```
    pub fn group(&self, i: usize) -> Option<Range<usize>> {
        self.groups
            .get(i)
            .copied()
            .flatten()
            .map(|(start, end)| start..end)
    }

    pub fn group_start(&self, i: usize) -> Option<usize> {
        self.group(i).map(|r| r.start)
    }

    pub fn group_end(&self, i: usize) -> Option<usize> {
        self.group(i).map(|r| r.end)
    }

    /// The matched text, given the haystack the match was found in.
    ///
    /// ```
    /// use ib_regexp::Regex;
    ///
    /// let hay = "ドラえもん";
    /// let m = Regex::new("え.").unwrap().find(hay).unwrap();
    /// assert_eq!(m.range(), 2..4);
    /// assert_eq!(m.as_str(hay), "えも");
    /// ```
    pub fn as_str<'h>(&self, haystack: &'h str) -> &'h str {
        StrSource::new(haystack).slice(self.range())
    }

    /// The text of group `i`. See [`as_str()`](Self::as_str).
    ///
    /// Both decode `haystack` on every call. For many matches over one non-ASCII haystack, keep a [`StrSource`] and use [`StrSource::slice()`].
    pub fn group_str<'h>(&self, i: usize, haystack: &'h str) -> Option<&'h str> {
        Some(StrSource::new(haystack).slice(self.group(i)?))
    }
}

/// Per-attempt scratch state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MatchState {
    /// Where the search began.
    pub anchor: usize,
    pub offset: usize,
    pub start: Vec<Option<usize>>,
    pub end: Vec<Option<usize>>,
}

impl MatchState {
    pub fn new(groups: usize, anchor: usize, offset: usize) -> Self {
        Self {
            anchor,
            offset,
            start: vec![None; groups],
            end: vec![None; groups],
        }
    }

    #[inline]
    pub fn at(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// The captured range of group `g`, if both ends are set.
    pub fn group(&self, g: usize) -> Option<(usize, usize)> {
        match (self.start[g], self.end[g]) {
            (Some(start), Some(end)) if start <= end => Some((start, end)),
            _ => None,
        }
    }

    pub fn into_match(self) -> Match {
        let groups: Box<[_]> = (0..self.start.len()).map(|g| self.group(g)).collect();
        let (start, end) = groups[0].unwrap_or((self.anchor, self.offset));
        Match { start, end, groups }
    }
}
