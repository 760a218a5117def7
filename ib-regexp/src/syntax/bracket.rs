//! Bracket expressions: `[abc]`, `[^a-z]`, `[[:alpha:]_]`, `[\d.]`.
use crate::{
    error::{ErrorKind, SyntaxError},
    regex::token::{CharSet, ClassItem, PosixClass},
    syntax::{Syntax, SyntaxFlags},
};

pub(super) struct BracketParser<'a> {
    chars: &'a [char],
    /// Position of the `[`.
    open: usize,
    pos: usize,
    syntax: Syntax,
}

enum Elem {
    Char(char),
    Class(PosixClass, bool),
}

impl<'a> BracketParser<'a> {
    pub fn new(chars: &'a [char], open: usize, syntax: Syntax) -> Self {
        Self {
            chars,
            open,
            pos: open + 1,
            syntax,
        }
    }

    /// Returns the set and the position after the closing `]`.
    pub fn parse(
        mut self,
        case_insensitive: bool,
    ) -> Result<(CharSet, usize), SyntaxError> {
        let negated = self.peek() == Some('^');
        if negated {
            self.pos += 1;
        }

        let mut items = Vec::new();
        let mut first = true;
        loop {
            let c = self.peek().ok_or_else(|| self.unterminated())?;
            if c == ']' && !first {
                self.pos += 1;
                break;
            }
            first = false;

            let lo_pos = self.pos;
            let lo = match self.elem()? {
                Elem::Class(class, negated) => {
                    items.push(ClassItem::Posix(class, negated));
                    continue;
                }
                Elem::Char(c) => c,
            };

            // `a-z`, but a `-` right before `]` is literal
            if self.peek() == Some('-') && !matches!(self.peek_at(1), Some(']') | None) {
                self.pos += 1;
                let hi = match self.elem()? {
                    Elem::Char(c) => c,
                    // `a-[:digit:]`: keep both ends literal
                    Elem::Class(class, negated) => {
                        items.push(ClassItem::Char(lo));
                        items.push(ClassItem::Char('-'));
                        items.push(ClassItem::Posix(class, negated));
                        continue;
                    }
                };
                if lo > hi && self.syntax.get(SyntaxFlags::NO_EMPTY_RANGES) {
                    return Err(SyntaxError::new(ErrorKind::EmptyRange(lo, hi), lo_pos));
                }
                items.push(ClassItem::Range(lo, hi));
            } else {
                items.push(ClassItem::Char(lo));
            }
        }

        let set = CharSet {
            negated,
            items,
            case_insensitive,
            exclude_newline: negated && self.syntax.get(SyntaxFlags::HAT_LISTS_NOT_NEWLINE),
        };
        Ok((set, self.pos))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn unterminated(&self) -> SyntaxError {
        SyntaxError::new(ErrorKind::UnterminatedBracket, self.open)
    }

    /// One char, escape or `[:class:]`.
    fn elem(&mut self) -> Result<Elem, SyntaxError> {
        let c = self.peek().ok_or_else(|| self.unterminated())?;
        match c {
            '[' if self.peek_at(1) == Some(':') && self.syntax.get(SyntaxFlags::CHAR_CLASSES) => {
                if let Some(class) = self.posix_class()? {
                    return Ok(Elem::Class(class, false));
                }
                self.pos += 1;
                Ok(Elem::Char('['))
            }
            '\\' if self.syntax.get(SyntaxFlags::CHAR_CLASS_ESC_IN_LISTS)
                || self.syntax.get(SyntaxFlags::BACKSLASH_ESCAPE_IN_LISTS) =>
            {
                let e = self.peek_at(1).ok_or_else(|| self.unterminated())?;
                if self.syntax.get(SyntaxFlags::CHAR_CLASS_ESC_IN_LISTS) {
                    if let Some((class, negated)) = PosixClass::from_escape(e) {
                        self.pos += 2;
                        return Ok(Elem::Class(class, negated));
                    }
                    if let Some(control) = control_escape(e) {
                        self.pos += 2;
                        return Ok(Elem::Char(control));
                    }
                }
                if self.syntax.get(SyntaxFlags::BACKSLASH_ESCAPE_IN_LISTS) {
                    self.pos += 2;
                    Ok(Elem::Char(e))
                } else {
                    self.pos += 1;
                    Ok(Elem::Char('\\'))
                }
            }
            c => {
                self.pos += 1;
                Ok(Elem::Char(c))
            }
        }
    }

    /// At `[:`. Returns `None` if there is no closing `:]`, in which case `[` is literal.
    fn posix_class(&mut self) -> Result<Option<PosixClass>, SyntaxError> {
        let name_start = self.pos + 2;
        let Some(len) = self.chars[name_start..]
            .windows(2)
            .position(|w| w == [':', ']'])
        else {
            return Ok(None);
        };
        let name: String = self.chars[name_start..name_start + len].iter().collect();
        let class = PosixClass::from_name(&name)
            .ok_or_else(|| SyntaxError::new(ErrorKind::UnknownPosixClass(name), self.pos))?;
        self.pos = name_start + len + 2;
        Ok(Some(class))
    }
}

/// `\n`, `\t`, `\r` and `\f`.
pub(super) fn control_escape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        'f' => Some('\x0c'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pattern: &str, syntax: Syntax) -> Result<(CharSet, usize), SyntaxError> {
        let chars: Vec<char> = pattern.chars().collect();
        BracketParser::new(&chars, 0, syntax).parse(false)
    }

    #[test]
    fn items() {
        let (set, end) = parse("[a-cx]rest", Syntax::POSIX_EXTENDED).unwrap();
        assert_eq!(end, 6);
        assert_eq!(
            set.items,
            [ClassItem::Range('a', 'c'), ClassItem::Char('x')]
        );

        let (set, _) = parse("[]a]", Syntax::POSIX_EXTENDED).unwrap();
        assert_eq!(set.items, [ClassItem::Char(']'), ClassItem::Char('a')]);

        let (set, _) = parse("[^-a-]", Syntax::POSIX_EXTENDED).unwrap();
        assert!(set.negated);
        assert_eq!(
            set.items,
            [ClassItem::Char('-'), ClassItem::Char('a'), ClassItem::Char('-')]
        );

        let (set, _) = parse("[[:digit:]_]", Syntax::POSIX_EXTENDED).unwrap();
        assert_eq!(
            set.items,
            [ClassItem::Posix(PosixClass::Digit, false), ClassItem::Char('_')]
        );
    }

    #[test]
    fn escapes() {
        let (set, _) = parse(r"[\d\]]", Syntax::PERL5).unwrap();
        assert_eq!(
            set.items,
            [ClassItem::Posix(PosixClass::Digit, false), ClassItem::Char(']')]
        );

        // no escapes in POSIX lists: `\` is literal and `]` closes
        let (set, end) = parse(r"[\d]", Syntax::POSIX_EXTENDED).unwrap();
        assert_eq!(end, 4);
        assert_eq!(set.items, [ClassItem::Char('\\'), ClassItem::Char('d')]);

        let (set, _) = parse(r"[\t]", Syntax::PERL5).unwrap();
        assert_eq!(set.items, [ClassItem::Char('\t')]);
    }

    #[test]
    fn errors() {
        assert_eq!(
            parse("[abc", Syntax::PERL5).unwrap_err().kind(),
            &ErrorKind::UnterminatedBracket
        );
        let err = parse("[[:foo:]]", Syntax::POSIX_BASIC).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnknownPosixClass("foo".into()));
        assert_eq!(err.pos(), 1);

        let err = parse("[xz-a]", Syntax::POSIX_BASIC).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::EmptyRange('z', 'a'));
        assert_eq!(err.pos(), 2);
        // Emacs allows reversed ranges
        let (set, _) = parse("[z-a]", Syntax::EMACS).unwrap();
        assert!(!set.matches('m'));
    }

    #[test]
    fn hat_newline() {
        let (set, _) = parse("[^a]", Syntax::GREP).unwrap();
        assert!(!set.matches('\n'));
        let (set, _) = parse("[^a]", Syntax::POSIX_EXTENDED).unwrap();
        assert!(set.matches('\n'));
    }
}
