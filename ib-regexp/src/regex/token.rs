//! The compiled program: an arena of tokens linked by index.
//!
//! Every chain ends in [`TAIL`], the shared terminal token, which matches the empty string.
//! Sub-chains of repetitions, groups and lookaheads are just other chains in the same arena.
use std::fmt::{self, Write};

use ib_unicode::case::CharCaseExt;
use itertools::Itertools;

pub(crate) type TokenId = usize;

pub(crate) const TAIL: TokenId = 0;

#[derive(Clone, Debug)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub next: TokenId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Tail,
    Literal {
        chars: Box<[char]>,
        case_insensitive: bool,
    },
    Any {
        newline: bool,
        null: bool,
    },
    Posix {
        class: PosixClass,
        negated: bool,
        case_insensitive: bool,
    },
    Set(CharSet),
    Anchor {
        kind: AnchorKind,
        multiline: bool,
    },
    WordBoundary(BoundaryKind),
    Repeat {
        sub: TokenId,
        min: usize,
        max: Option<usize>,
        greedy: bool,
    },
    /// `index` is `None` for non-capturing groups.
    Group {
        index: Option<usize>,
        alternatives: Box<[TokenId]>,
    },
    LookAhead {
        negate: bool,
        sub: TokenId,
    },
    Backref {
        group: usize,
        case_insensitive: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AnchorKind {
    Start,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BoundaryKind {
    /// `\b`
    Boundary,
    /// `\B`
    NotBoundary,
    /// `\<`
    Start,
    /// `\>`
    End,
}

/// POSIX character classes, plus the word class behind `\w`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PosixClass {
    Alnum,
    Alpha,
    Blank,
    Cntrl,
    Digit,
    Graph,
    Lower,
    Print,
    Punct,
    Space,
    Upper,
    Xdigit,
    Word,
}

impl PosixClass {
    const NAMES: [(&'static str, PosixClass); 12] = [
        ("alnum", PosixClass::Alnum),
        ("alpha", PosixClass::Alpha),
        ("blank", PosixClass::Blank),
        ("cntrl", PosixClass::Cntrl),
        ("digit", PosixClass::Digit),
        ("graph", PosixClass::Graph),
        ("lower", PosixClass::Lower),
        ("print", PosixClass::Print),
        ("punct", PosixClass::Punct),
        ("space", PosixClass::Space),
        ("upper", PosixClass::Upper),
        ("xdigit", PosixClass::Xdigit),
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, class)| *class)
    }

    /// `\d`, `\w`, `\s` and their negations.
    pub fn from_escape(c: char) -> Option<(Self, bool)> {
        Some(match c {
            'd' => (PosixClass::Digit, false),
            'D' => (PosixClass::Digit, true),
            'w' => (PosixClass::Word, false),
            'W' => (PosixClass::Word, true),
            's' => (PosixClass::Space, false),
            'S' => (PosixClass::Space, true),
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            PosixClass::Word => "word",
            class => Self::NAMES
                .iter()
                .find(|(_, c)| *c == class)
                .map(|(n, _)| *n)
                .unwrap_or_default(),
        }
    }

    fn escape(self) -> Option<char> {
        match self {
            PosixClass::Digit => Some('d'),
            PosixClass::Word => Some('w'),
            PosixClass::Space => Some('s'),
            _ => None,
        }
    }

    /// With `case_insensitive`, `lower` and `upper` accept any letter.
    pub fn matches(self, c: char, case_insensitive: bool) -> bool {
        match self {
            PosixClass::Alnum => c.is_alphanumeric(),
            PosixClass::Alpha => c.is_alphabetic(),
            PosixClass::Blank => c == ' ' || c == '\t',
            PosixClass::Cntrl => c.is_control(),
            PosixClass::Digit => c.is_ascii_digit(),
            PosixClass::Graph => !c.is_whitespace() && !c.is_control(),
            PosixClass::Print => c == ' ' || (!c.is_whitespace() && !c.is_control()),
            PosixClass::Punct => c.is_ascii_punctuation(),
            PosixClass::Space => c.is_whitespace(),
            PosixClass::Lower if case_insensitive => c.is_alphabetic(),
            PosixClass::Lower => c.is_lowercase(),
            PosixClass::Upper if case_insensitive => c.is_alphabetic(),
            PosixClass::Upper => c.is_uppercase(),
            PosixClass::Xdigit => c.is_ascii_hexdigit(),
            PosixClass::Word => ib_unicode::ascii::is_word_char(c),
        }
    }

    fn fmt_item(self, negated: bool, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.escape(), negated) {
            (Some(e), false) => write!(f, "\\{e}"),
            (Some(e), true) => write!(f, "\\{}", e.to_ascii_uppercase()),
            (None, false) => write!(f, "[:{}:]", self.name()),
            (None, true) => write!(f, "[:^{}:]", self.name()),
        }
    }
}

/// A bracket expression.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct CharSet {
    pub negated: bool,
    pub items: Vec<ClassItem>,
    pub case_insensitive: bool,
    /// A negated set never matches newline.
    pub exclude_newline: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ClassItem {
    Char(char),
    /// Inclusive. A reversed range matches nothing.
    Range(char, char),
    Posix(PosixClass, bool),
}

impl ClassItem {
    fn matches(self, c: char, case_insensitive: bool) -> bool {
        match self {
            ClassItem::Char(x) => c == x || case_insensitive && c.eq_ignore_case(x),
            ClassItem::Range(lo, hi) => {
                (lo..=hi).contains(&c)
                    || case_insensitive
                        && ((lo..=hi).contains(&c.to_mono_lowercase())
                            || (lo..=hi).contains(&c.to_mono_uppercase()))
            }
            ClassItem::Posix(class, negated) => class.matches(c, case_insensitive) != negated,
        }
    }
}

impl CharSet {
    pub fn matches(&self, c: char) -> bool {
        let hit = self
            .items
            .iter()
            .any(|item| item.matches(c, self.case_insensitive));
        if self.negated {
            !hit && !(self.exclude_newline && c == '\n')
        } else {
            hit
        }
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn fmt_char(c: char, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match c {
                ']' | '\\' | '^' | '-' | '[' => write!(f, "\\{c}"),
                c => fmt_escaped_control(c, f),
            }
        }

        f.write_char('[')?;
        if self.negated {
            f.write_char('^')?;
        }
        for item in &self.items {
            match *item {
                ClassItem::Char(c) => fmt_char(c, f)?,
                ClassItem::Range(lo, hi) => {
                    fmt_char(lo, f)?;
                    f.write_char('-')?;
                    fmt_char(hi, f)?;
                }
                ClassItem::Posix(class, negated) => class.fmt_item(negated, f)?,
            }
        }
        f.write_char(']')
    }
}

fn fmt_escaped_control(c: char, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match c {
        '\n' => f.write_str("\\n"),
        '\t' => f.write_str("\\t"),
        '\r' => f.write_str("\\r"),
        '\x0c' => f.write_str("\\f"),
        c => f.write_char(c),
    }
}

/// A compiled pattern.
#[derive(Clone, Debug)]
pub(crate) struct Program {
    pub tokens: Vec<Token>,
    pub root: TokenId,
    /// `root` followed by an end-of-input check.
    pub full: TokenId,
    /// Number of groups, including group 0.
    pub groups: usize,
    /// Whether any backreference exists. Without them, states at the same offset are interchangeable.
    pub backrefs: bool,
}

impl Program {
    #[inline]
    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id]
    }

    /// Minimum number of chars any match consumes.
    pub fn min_len(&self) -> usize {
        self.chain_min_len(self.root)
    }

    fn chain_min_len(&self, mut id: TokenId) -> usize {
        let mut len = 0;
        while id != TAIL {
            let token = self.token(id);
            len += match &token.kind {
                TokenKind::Literal { chars, .. } => chars.len(),
                TokenKind::Any { .. } | TokenKind::Posix { .. } | TokenKind::Set(_) => 1,
                TokenKind::Repeat { sub, min, .. } => {
                    min.saturating_mul(self.chain_min_len(*sub))
                }
                TokenKind::Group { alternatives, .. } => alternatives
                    .iter()
                    .map(|&alt| self.chain_min_len(alt))
                    .min()
                    .unwrap_or(0),
                TokenKind::Tail
                | TokenKind::Anchor { .. }
                | TokenKind::WordBoundary(_)
                | TokenKind::LookAhead { .. }
                | TokenKind::Backref { .. } => 0,
            };
            id = token.next;
        }
        len
    }

    /// Writes the chain back in Perl syntax.
    fn fmt_chain(&self, mut id: TokenId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        while id != TAIL {
            let token = self.token(id);
            self.fmt_token(token, f)?;
            id = token.next;
        }
        Ok(())
    }

    fn fmt_alternatives(&self, alternatives: &[TokenId], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &alt) in alternatives.iter().enumerate() {
            if i != 0 {
                f.write_char('|')?;
            }
            self.fmt_chain(alt, f)?;
        }
        Ok(())
    }

    fn fmt_token(&self, token: &Token, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &token.kind {
            TokenKind::Tail => Ok(()),
            TokenKind::Literal { chars, .. } => {
                for &c in chars.iter() {
                    if "\\.^$|?*+()[]{}".contains(c) {
                        f.write_char('\\')?;
                    }
                    fmt_escaped_control(c, f)?;
                }
                Ok(())
            }
            TokenKind::Any { .. } => f.write_char('.'),
            TokenKind::Posix { class, negated, .. } => match class.escape() {
                Some(_) => class.fmt_item(*negated, f),
                None => {
                    f.write_str(if *negated { "[^" } else { "[" })?;
                    class.fmt_item(false, f)?;
                    f.write_char(']')
                }
            },
            TokenKind::Set(set) => write!(f, "{set}"),
            TokenKind::Anchor { kind, .. } => f.write_char(match kind {
                AnchorKind::Start => '^',
                AnchorKind::End => '$',
            }),
            TokenKind::WordBoundary(kind) => f.write_str(match kind {
                BoundaryKind::Boundary => "\\b",
                BoundaryKind::NotBoundary => "\\B",
                BoundaryKind::Start => "\\<",
                BoundaryKind::End => "\\>",
            }),
            TokenKind::Repeat {
                sub,
                min,
                max,
                greedy,
            } => {
                let sub_token = self.token(*sub);
                let single = sub_token.next == TAIL
                    && match &sub_token.kind {
                        TokenKind::Literal { chars, .. } => chars.len() == 1,
                        TokenKind::Any { .. }
                        | TokenKind::Posix { .. }
                        | TokenKind::Set(_)
                        | TokenKind::Group { .. }
                        | TokenKind::Backref { .. } => true,
                        _ => false,
                    };
                if single {
                    self.fmt_token(sub_token, f)?;
                } else {
                    f.write_str("(?:")?;
                    self.fmt_chain(*sub, f)?;
                    f.write_char(')')?;
                }
                match (min, max) {
                    (0, None) => f.write_char('*')?,
                    (1, None) => f.write_char('+')?,
                    (0, Some(1)) => f.write_char('?')?,
                    (min, None) => write!(f, "{{{min},}}")?,
                    (min, Some(max)) if min == max => write!(f, "{{{min}}}")?,
                    (min, Some(max)) => write!(f, "{{{min},{max}}}")?,
                }
                if !greedy {
                    f.write_char('?')?;
                }
                Ok(())
            }
            TokenKind::Group {
                index: Some(0),
                alternatives,
            } => self.fmt_alternatives(alternatives, f),
            TokenKind::Group {
                index,
                alternatives,
            } => {
                f.write_str(if index.is_some() { "(" } else { "(?:" })?;
                self.fmt_alternatives(alternatives, f)?;
                f.write_char(')')
            }
            TokenKind::LookAhead { negate, sub } => {
                f.write_str(if *negate { "(?!" } else { "(?=" })?;
                match &self.token(*sub).kind {
                    TokenKind::Group { alternatives, .. } => {
                        self.fmt_alternatives(alternatives, f)?
                    }
                    _ => self.fmt_chain(*sub, f)?,
                }
                f.write_char(')')
            }
            TokenKind::Backref { group, .. } => write!(f, "\\{group}"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_chain(self.root, f)
    }
}

/// For debugging: one token per line.
pub(crate) struct Dump<'a>(pub &'a Program);

impl fmt::Debug for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "root: {}, groups: {}", self.0.root, self.0.groups)?;
        let lines = self
            .0
            .tokens
            .iter()
            .enumerate()
            .map(|(id, token)| format!("{id:>4} -> {:<4} {:?}", token.next, token.kind))
            .join("\n");
        f.write_str(&lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posix() {
        assert!(PosixClass::Alpha.matches('δ', false));
        assert!(PosixClass::Blank.matches('\t', false));
        assert!(!PosixClass::Blank.matches('\n', false));
        assert!(PosixClass::Digit.matches('7', false));
        assert!(!PosixClass::Digit.matches('٣', false));
        assert!(PosixClass::Graph.matches('!', false));
        assert!(!PosixClass::Graph.matches(' ', false));
        assert!(PosixClass::Print.matches(' ', false));
        assert!(!PosixClass::Print.matches('\x07', false));
        assert!(PosixClass::Punct.matches('#', false));
        assert!(PosixClass::Xdigit.matches('F', false));
        assert!(!PosixClass::Xdigit.matches('g', false));
        assert!(PosixClass::Word.matches('_', false));

        assert!(!PosixClass::Lower.matches('A', false));
        assert!(PosixClass::Lower.matches('A', true));
        assert!(PosixClass::Upper.matches('a', true));
        assert!(!PosixClass::Upper.matches('1', true));

        assert_eq!(PosixClass::from_name("xdigit"), Some(PosixClass::Xdigit));
        assert_eq!(PosixClass::from_name("word"), None);
        assert_eq!(PosixClass::Cntrl.name(), "cntrl");
        assert_eq!(PosixClass::from_escape('W'), Some((PosixClass::Word, true)));
    }

    #[test]
    fn set() {
        let set = CharSet {
            negated: false,
            items: vec![
                ClassItem::Range('a', 'c'),
                ClassItem::Char('x'),
                ClassItem::Posix(PosixClass::Digit, false),
            ],
            ..Default::default()
        };
        assert!(set.matches('b'));
        assert!(set.matches('x'));
        assert!(set.matches('5'));
        assert!(!set.matches('B'));
        assert_eq!(set.to_string(), r"[a-cx\d]");

        let set = CharSet {
            case_insensitive: true,
            ..set
        };
        assert!(set.matches('B'));
        assert!(set.matches('X'));

        let set = CharSet {
            negated: true,
            items: vec![ClassItem::Char('a')],
            case_insensitive: false,
            exclude_newline: true,
        };
        assert!(set.matches('b'));
        assert!(!set.matches('a'));
        assert!(!set.matches('\n'));

        let reversed = CharSet {
            items: vec![ClassItem::Range('z', 'a')],
            ..Default::default()
        };
        assert!(!reversed.matches('m'));
    }
}
