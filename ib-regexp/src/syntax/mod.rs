/*!
Syntax dialects.

A [`Syntax`] is an immutable set of [`SyntaxFlags`] that decides how a pattern string is parsed: which characters are metacharacters (`(` or `\(`, `|` or `\|`, `{` or `\{`), which operators exist at all (`+`, `?`, intervals, stingy operators) and how a few edge cases behave (`.` and newline, reversed ranges, unmatched `)`).

The predefined dialects emulate the tools they are named after:

| Dialect | Groups | Alternation | Intervals | Notes |
|---------|--------|-------------|-----------|-------|
| [`Syntax::EMACS`] | `\(\)` | `\|` | - | no flags at all |
| [`Syntax::POSIX_BASIC`], [`Syntax::ED`], [`Syntax::SED`] | `\(\)` | `\|` | `\{\}` | `\+` and `\?` |
| [`Syntax::POSIX_EXTENDED`] | `()` | `\|` | `{}` | |
| [`Syntax::GREP`] | `\(\)` | `\|`, newline | `\{\}` | |
| [`Syntax::EGREP`], [`Syntax::POSIX_EGREP`] | `()` | `\|`, newline | - / `{}` | |
| [`Syntax::AWK`], [`Syntax::POSIX_AWK`] | `()` | `\|` | - / `{}` | `\` escapes in `[]` |
| [`Syntax::POSIX_MINIMAL_BASIC`] | `\(\)` | - | `\{\}` | no `+`, `?`, `\|` |
| [`Syntax::POSIX_MINIMAL_EXTENDED`] | `()` | `\|` | `{}` | |
| [`Syntax::PERL4`], [`Syntax::PERL4_S`] | `()` | `\|` | `{}` | `\d\w\s` |
| [`Syntax::PERL5`], [`Syntax::PERL5_S`] | `()` | `\|` | `{}` | `(?:)`, `*?`, `\A\Z`, `(?#)`, `(?=)` |

The `_S` variants additionally let `.` match newline.

## Example
```
use ib_regexp::{Regex, Syntax, SyntaxFlags};

// POSIX basic: `\(\)` groups, `\{\}` intervals
let re = Regex::builder().syntax(Syntax::POSIX_BASIC).build(r"\(ab\)\{2\}").unwrap();
assert_eq!(re.find("xabab").map(|m| m.range()), Some(1..5));

// Derive a dialect
let syntax = Syntax::POSIX_EXTENDED.set(SyntaxFlags::STINGY_OPS);
assert!(syntax.get(SyntaxFlags::STINGY_OPS));
assert!(!Syntax::POSIX_EXTENDED.get(SyntaxFlags::STINGY_OPS));
```
*/
use std::{fmt, str::FromStr};

use bitflags::bitflags;

use crate::error::UnknownSyntax;

mod bracket;
pub(crate) mod parse;

bitflags! {
    /// Dialect feature flags. See [`Syntax`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SyntaxFlags: u32 {
        /// `\` quotes the next character inside a bracket expression.
        const BACKSLASH_ESCAPE_IN_LISTS = 1 << 0;
        /// `\+` and `\?` are operators, `+` and `?` are literals.
        const BK_PLUS_QM = 1 << 1;
        /// `[:alpha:]` and the other POSIX classes inside bracket expressions.
        const CHAR_CLASSES = 1 << 2;
        /// `^` and `$` are anchors anywhere, not only at the ends of an alternative.
        const CONTEXT_INDEP_ANCHORS = 1 << 3;
        /// Repetition operators are operators in every context, so a leading one is an error.
        const CONTEXT_INDEP_OPS = 1 << 4;
        /// A repetition operator with nothing to repeat is an error.
        const CONTEXT_INVALID_OPS = 1 << 5;
        /// `.` matches newline.
        const DOT_NEWLINE = 1 << 6;
        /// `.` does not match NUL.
        const DOT_NOT_NULL = 1 << 7;
        /// `{m,n}` intervals.
        const INTERVALS = 1 << 8;
        /// No `+`, `?` and `|` operators.
        const LIMITED_OPS = 1 << 9;
        /// A newline in the pattern separates alternatives.
        const NEWLINE_ALT = 1 << 10;
        /// Intervals are `{m,n}` instead of `\{m,n\}`.
        const NO_BK_BRACES = 1 << 11;
        /// Groups are `(...)` instead of `\(...\)`.
        const NO_BK_PARENS = 1 << 12;
        /// `\1`-`\9` are not backreferences.
        const NO_BK_REFS = 1 << 13;
        /// Alternation is `|` instead of `\|`.
        const NO_BK_VBAR = 1 << 14;
        /// Reversed ranges like `[z-a]` are errors instead of matching nothing.
        const NO_EMPTY_RANGES = 1 << 15;
        /// An unmatched `)` is an ordinary character instead of an error.
        const UNMATCHED_RIGHT_PAREN_ORD = 1 << 16;
        /// `[^...]` never matches newline.
        const HAT_LISTS_NOT_NEWLINE = 1 << 17;
        /// Stingy (lazy) operators `*?`, `+?`, `??` and `{m,n}?`.
        const STINGY_OPS = 1 << 18;
        /// `\d`, `\D`, `\w`, `\W`, `\s`, `\S`, `\b`, `\B` and `\n`, `\t`, `\r`, `\f`.
        const CHAR_CLASS_ESCAPES = 1 << 19;
        /// `(?:...)` non-capturing groups.
        const PURE_GROUPING = 1 << 20;
        /// `(?=...)` and `(?!...)`.
        const LOOKAHEAD = 1 << 21;
        /// `\A` and `\Z`.
        const STRING_ANCHORS = 1 << 22;
        /// `(?#...)` comments.
        const COMMENTS = 1 << 23;
        /// `\d` and friends inside bracket expressions.
        const CHAR_CLASS_ESC_IN_LISTS = 1 << 24;
    }
}

/// A syntax dialect. See [module docs](self).
///
/// `Syntax` is `Copy` and all of its methods are `const`, so dialects are usually declared as constants:
/// ```
/// use ib_regexp::{Syntax, SyntaxFlags};
///
/// const MY_SYNTAX: Syntax = Syntax::PERL5.clear(SyntaxFlags::LOOKAHEAD);
/// assert!(!MY_SYNTAX.get(SyntaxFlags::LOOKAHEAD));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Syntax {
    flags: SyntaxFlags,
}

const POSIX_COMMON: Syntax = Syntax::new()
    .set(SyntaxFlags::CHAR_CLASSES)
    .set(SyntaxFlags::DOT_NEWLINE)
    .set(SyntaxFlags::DOT_NOT_NULL)
    .set(SyntaxFlags::INTERVALS)
    .set(SyntaxFlags::NO_EMPTY_RANGES);

impl Syntax {
    /// Emacs syntax, i.e. no flags.
    pub const EMACS: Syntax = Syntax::new();

    pub const POSIX_BASIC: Syntax = POSIX_COMMON.set(SyntaxFlags::BK_PLUS_QM);

    pub const POSIX_EXTENDED: Syntax = POSIX_COMMON
        .set(SyntaxFlags::CONTEXT_INDEP_ANCHORS)
        .set(SyntaxFlags::CONTEXT_INDEP_OPS)
        .set(SyntaxFlags::NO_BK_BRACES)
        .set(SyntaxFlags::NO_BK_PARENS)
        .set(SyntaxFlags::NO_BK_VBAR)
        .set(SyntaxFlags::UNMATCHED_RIGHT_PAREN_ORD);

    pub const POSIX_AWK: Syntax =
        Self::POSIX_EXTENDED.set(SyntaxFlags::BACKSLASH_ESCAPE_IN_LISTS);

    pub const AWK: Syntax = Syntax::new()
        .set(SyntaxFlags::BACKSLASH_ESCAPE_IN_LISTS)
        .set(SyntaxFlags::DOT_NOT_NULL)
        .set(SyntaxFlags::NO_BK_PARENS)
        .set(SyntaxFlags::NO_BK_REFS)
        .set(SyntaxFlags::NO_BK_VBAR)
        .set(SyntaxFlags::NO_EMPTY_RANGES)
        .set(SyntaxFlags::UNMATCHED_RIGHT_PAREN_ORD);

    pub const GREP: Syntax = Syntax::new()
        .set(SyntaxFlags::BK_PLUS_QM)
        .set(SyntaxFlags::CHAR_CLASSES)
        .set(SyntaxFlags::HAT_LISTS_NOT_NEWLINE)
        .set(SyntaxFlags::INTERVALS)
        .set(SyntaxFlags::NEWLINE_ALT);

    pub const EGREP: Syntax = Syntax::new()
        .set(SyntaxFlags::CHAR_CLASSES)
        .set(SyntaxFlags::CONTEXT_INDEP_ANCHORS)
        .set(SyntaxFlags::CONTEXT_INDEP_OPS)
        .set(SyntaxFlags::HAT_LISTS_NOT_NEWLINE)
        .set(SyntaxFlags::NEWLINE_ALT)
        .set(SyntaxFlags::NO_BK_PARENS)
        .set(SyntaxFlags::NO_BK_VBAR);

    pub const POSIX_EGREP: Syntax = Self::EGREP
        .set(SyntaxFlags::INTERVALS)
        .set(SyntaxFlags::NO_BK_BRACES);

    pub const ED: Syntax = Self::POSIX_BASIC;

    pub const SED: Syntax = Self::POSIX_BASIC;

    pub const POSIX_MINIMAL_BASIC: Syntax = POSIX_COMMON.set(SyntaxFlags::LIMITED_OPS);

    pub const POSIX_MINIMAL_EXTENDED: Syntax = POSIX_COMMON
        .set(SyntaxFlags::CONTEXT_INDEP_ANCHORS)
        .set(SyntaxFlags::CONTEXT_INVALID_OPS)
        .set(SyntaxFlags::NO_BK_BRACES)
        .set(SyntaxFlags::NO_BK_PARENS)
        .set(SyntaxFlags::NO_BK_REFS)
        .set(SyntaxFlags::NO_BK_VBAR)
        .set(SyntaxFlags::UNMATCHED_RIGHT_PAREN_ORD);

    pub const PERL4: Syntax = Syntax::new()
        .set(SyntaxFlags::BACKSLASH_ESCAPE_IN_LISTS)
        .set(SyntaxFlags::CONTEXT_INDEP_ANCHORS)
        .set(SyntaxFlags::CONTEXT_INDEP_OPS)
        .set(SyntaxFlags::INTERVALS)
        .set(SyntaxFlags::NO_BK_BRACES)
        .set(SyntaxFlags::NO_BK_PARENS)
        .set(SyntaxFlags::NO_BK_VBAR)
        .set(SyntaxFlags::NO_EMPTY_RANGES)
        .set(SyntaxFlags::CHAR_CLASS_ESCAPES);

    /// [`Syntax::PERL4`] with `.` matching newline, i.e. Perl's `/s`.
    pub const PERL4_S: Syntax = Self::PERL4.set(SyntaxFlags::DOT_NEWLINE);

    /// The default dialect of [`Regex::new`](crate::Regex::new).
    pub const PERL5: Syntax = Self::PERL4
        .set(SyntaxFlags::PURE_GROUPING)
        .set(SyntaxFlags::STINGY_OPS)
        .set(SyntaxFlags::LOOKAHEAD)
        .set(SyntaxFlags::STRING_ANCHORS)
        .set(SyntaxFlags::CHAR_CLASS_ESC_IN_LISTS)
        .set(SyntaxFlags::COMMENTS);

    /// [`Syntax::PERL5`] with `.` matching newline, i.e. Perl's `/s`.
    pub const PERL5_S: Syntax = Self::PERL5.set(SyntaxFlags::DOT_NEWLINE);

    const NAMED: [(&'static str, Syntax); 16] = [
        ("emacs", Self::EMACS),
        ("posix-basic", Self::POSIX_BASIC),
        ("posix-extended", Self::POSIX_EXTENDED),
        ("posix-awk", Self::POSIX_AWK),
        ("awk", Self::AWK),
        ("grep", Self::GREP),
        ("egrep", Self::EGREP),
        ("posix-egrep", Self::POSIX_EGREP),
        ("ed", Self::ED),
        ("sed", Self::SED),
        ("posix-minimal-basic", Self::POSIX_MINIMAL_BASIC),
        ("posix-minimal-extended", Self::POSIX_MINIMAL_EXTENDED),
        ("perl4", Self::PERL4),
        ("perl4-s", Self::PERL4_S),
        ("perl5", Self::PERL5),
        ("perl5-s", Self::PERL5_S),
    ];

    /// A syntax without any flags, i.e. [`Syntax::EMACS`].
    pub const fn new() -> Self {
        Self {
            flags: SyntaxFlags::empty(),
        }
    }

    pub const fn from_flags(flags: SyntaxFlags) -> Self {
        Self { flags }
    }

    /// Returns a copy with `flag` set.
    #[must_use]
    pub const fn set(self, flag: SyntaxFlags) -> Self {
        Self {
            flags: self.flags.union(flag),
        }
    }

    /// Returns a copy with `flag` cleared.
    #[must_use]
    pub const fn clear(self, flag: SyntaxFlags) -> Self {
        Self {
            flags: self.flags.difference(flag),
        }
    }

    /// Whether all of `flag` is set.
    #[inline]
    pub const fn get(self, flag: SyntaxFlags) -> bool {
        self.flags.contains(flag)
    }

    pub const fn flags(self) -> SyntaxFlags {
        self.flags
    }

    /// The name of the predefined dialect with exactly these flags, if any.
    ///
    /// Aliases (`ed`, `sed` for `posix-basic`) resolve to the first name.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(_, syntax)| *syntax == self)
            .map(|(name, _)| *name)
    }
}

impl fmt::Debug for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Syntax({name})"),
            None => f.debug_tuple("Syntax").field(&self.flags).finish(),
        }
    }
}

impl FromStr for Syntax {
    type Err = UnknownSyntax;

    /// Names are case-insensitive and `_` is accepted for `-`, e.g. `perl5`, `POSIX_EXTENDED`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_ascii_lowercase().replace('_', "-");
        Self::NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, syntax)| *syntax)
            .ok_or_else(|| UnknownSyntax(s.to_string()))
    }
}

impl From<SyntaxFlags> for Syntax {
    fn from(flags: SyntaxFlags) -> Self {
        Self::from_flags(flags)
    }
}
