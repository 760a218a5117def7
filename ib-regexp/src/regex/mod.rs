/*!
Compiled patterns.

A [`Regex`] is compiled once from a pattern, a [`Syntax`] dialect and a [`MatchConfig`], and is read-only afterwards. It is cheap to clone and can be shared across threads. Each search creates its own scratch state.

All offsets are char offsets. Use [`Match::as_str()`] to get the matched text of a `&str` haystack.

## Example
```
use ib_regexp::{Regex, Syntax};

let re = Regex::new(r"(\w+)@(\w+)\.com").unwrap();
let m = re.find("mail alice@example.com now").unwrap();
assert_eq!(m.range(), 5..22);
assert_eq!(m.group(2), Some(11..18));

let re = Regex::builder().syntax(Syntax::GREP).build(r"colou\?r").unwrap();
assert_eq!(re.find_all("color colour").len(), 2);
```
*/
use std::{borrow::Cow, fmt, sync::Arc};

use bon::bon;
use tracing::{debug, trace};

use crate::{
    error::SyntaxError,
    matcher::{
        input::{CharSource, StrSource},
        Match, MatchConfig, MatchFlags, Matcher,
    },
    syntax::{parse::Parser, Syntax},
};

mod iter;
mod replace;
pub(crate) mod token;

pub use iter::Matches;

use token::{Dump, Program};

/// A compiled regular expression.
///
/// Searches are backtracking: leftmost match first, and among the matches at the leftmost position the one preferred by greedy/stingy repetition and left-to-right alternation.
///
/// ```
/// use ib_regexp::Regex;
///
/// let re = Regex::new("a*?b").unwrap();
/// assert_eq!(re.find("aaab").map(|m| m.range()), Some(0..4));
/// let re = Regex::new("[0-9]{2,4}").unwrap();
/// assert_eq!(re.find("123456").map(|m| m.range()), Some(0..4));
/// ```
#[derive(Clone)]
pub struct Regex {
    imp: Arc<Program>,
    pattern: Box<str>,
    syntax: Syntax,
    config: MatchConfig,
}

#[bon]
impl Regex {
    /// Compiles `pattern` with [`Syntax::PERL5`] and the default [`MatchConfig`].
    pub fn new(pattern: &str) -> Result<Self, SyntaxError> {
        Self::builder().build(pattern)
    }

    /// ```
    /// use ib_regexp::{matcher::MatchConfig, Regex, Syntax};
    ///
    /// let re = Regex::builder()
    ///     .syntax(Syntax::POSIX_EXTENDED)
    ///     .config(MatchConfig::builder().case_insensitive(true).build())
    ///     .build("(ab)+")
    ///     .unwrap();
    /// assert_eq!(re.find("xABab").map(|m| m.range()), Some(1..5));
    /// ```
    #[builder(builder_type = Builder, finish_fn(name = build))]
    pub fn builder(
        #[builder(finish_fn)] pattern: &str,
        /// Default: [`Syntax::PERL5`]
        #[builder(default = Syntax::PERL5)]
        syntax: Syntax,
        #[builder(default)] config: MatchConfig,
    ) -> Result<Self, SyntaxError> {
        let prog = Parser::new(pattern, syntax, config).parse()?;
        debug!(
            pattern,
            syntax = ?syntax,
            groups = prog.groups,
            tokens = prog.tokens.len(),
            "compiled"
        );
        trace!(program = ?Dump(&prog));
        Ok(Self {
            imp: Arc::new(prog),
            pattern: pattern.into(),
            syntax,
            config,
        })
    }

    /// Anchored attempt: a match that starts exactly at `offset`, or `None`.
    ///
    /// Offsets past the end of input never match.
    pub fn match_at<S: CharSource + ?Sized>(
        &self,
        source: &mut S,
        offset: usize,
        flags: MatchFlags,
    ) -> Option<Match> {
        let mut matcher = Matcher::new(&self.imp, source, flags);
        if matcher.past_end(offset) {
            return None;
        }
        matcher.match_at(offset, offset).map(|state| state.into_match())
    }

    /// The leftmost match starting at or after `offset`.
    ///
    /// `^` matches at offset 0 only if `offset` is 0, or at `offset` with [`MatchFlags::ANCHOR_INDEX`].
    pub fn find_at<S: CharSource + ?Sized>(
        &self,
        source: &mut S,
        offset: usize,
        flags: MatchFlags,
    ) -> Option<Match> {
        Matcher::new(&self.imp, source, flags)
            .find_at(offset)
            .map(|state| state.into_match())
    }

    pub fn find(&self, haystack: &str) -> Option<Match> {
        self.find_at(&mut StrSource::new(haystack), 0, MatchFlags::empty())
    }

    /// Whether the pattern matches anywhere in `haystack`.
    pub fn is_match(&self, haystack: &str) -> bool {
        self.find(haystack).is_some()
    }

    /// Whether the pattern matches the whole `haystack`.
    ///
    /// ```
    /// use ib_regexp::Regex;
    ///
    /// let re = Regex::new("a|ab").unwrap();
    /// assert!(re.is_full_match("ab"));
    /// assert_eq!(re.find("ab").map(|m| m.range()), Some(0..1));
    /// ```
    pub fn is_full_match(&self, haystack: &str) -> bool {
        let mut source = StrSource::new(haystack);
        let mut matcher = Matcher::new(&self.imp, &mut source, MatchFlags::empty());
        matcher.full_match().is_some()
    }

    /// All non-overlapping matches in `haystack`.
    pub fn find_all(&self, haystack: &str) -> Vec<Match> {
        self.find_iter(StrSource::new(haystack)).collect()
    }

    /// A lazy iterator over the non-overlapping matches in `source`.
    ///
    /// Pass `&mut source` to keep the source, e.g. to check [`ReaderSource::take_error()`](crate::matcher::input::ReaderSource::take_error) afterwards.
    pub fn find_iter<S: CharSource>(&self, source: S) -> Matches<'_, S> {
        Matches::new(self, source, 0, MatchFlags::empty())
    }

    /// [`find_iter()`](Self::find_iter) starting at `offset`.
    pub fn find_iter_at<S: CharSource>(
        &self,
        source: S,
        offset: usize,
        flags: MatchFlags,
    ) -> Matches<'_, S> {
        Matches::new(self, source, offset, flags)
    }

    /// Replaces the first match. See [`replace_all()`](Self::replace_all) for the template syntax.
    pub fn replace<'h>(&self, haystack: &'h str, template: &str) -> Cow<'h, str> {
        self.replacen(haystack, 1, template)
    }

    /// Replaces every match with `template`, in which `$0`-`$9` are group texts and `$$` is `$`.
    ///
    /// ```
    /// use ib_regexp::Regex;
    ///
    /// let re = Regex::new(r"(\w+)=(\w+)").unwrap();
    /// assert_eq!(re.replace_all("a=1, b=2", "$2=$1"), "1=a, 2=b");
    /// ```
    pub fn replace_all<'h>(&self, haystack: &'h str, template: &str) -> Cow<'h, str> {
        self.replacen(haystack, usize::MAX, template)
    }

    fn replacen<'h>(&self, haystack: &'h str, limit: usize, template: &str) -> Cow<'h, str> {
        let mut source = StrSource::new(haystack);
        let matches: Vec<Match> = self.find_iter(&mut source).take(limit).collect();
        if matches.is_empty() {
            return Cow::Borrowed(haystack);
        }

        let mut out = String::with_capacity(haystack.len());
        let mut last = 0;
        for m in &matches {
            out.push_str(source.slice(last..m.start()));
            replace::expand(template, m, &source, &mut out);
            last = m.end();
        }
        out.push_str(&haystack[source.byte_offset(last)..]);
        Cow::Owned(out)
    }

    /// Number of groups, including group 0 (the whole match).
    pub fn group_count(&self) -> usize {
        self.imp.groups
    }

    /// Minimum number of chars any match consumes.
    pub fn min_len(&self) -> usize {
        self.imp.min_len()
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    pub fn config(&self) -> MatchConfig {
        self.config
    }

    /// The pattern this regex was compiled from.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Regex").field(&self.pattern).finish()
    }
}

/// The compiled program in Perl syntax.
///
/// ```
/// use ib_regexp::{Regex, Syntax};
///
/// let re = Regex::builder().syntax(Syntax::POSIX_BASIC).build(r"\(ab*\)\{2,\}").unwrap();
/// assert_eq!(re.to_string(), "(ab*){2,}");
/// ```
impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.imp, f)
    }
}
