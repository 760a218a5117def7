//! Pattern compiler: recursive descent over the pattern chars, dispatching on the metacharacter spellings the [`Syntax`] selects.
//!
//! The grammar:
//! ```text
//! alternatives := sequence (ALT sequence)*
//! sequence     := (atom quantifier*)*
//! atom         := char | '.' | '^' | '$' | bracket | escape | GROUP_OPEN alternatives GROUP_CLOSE
//! quantifier   := ('*' | PLUS | QM | INTERVAL) STINGY?
//! ```
use crate::{
    error::{ErrorKind, SyntaxError},
    matcher::MatchConfig,
    regex::token::{
        AnchorKind, BoundaryKind, PosixClass, Program, Token, TokenId, TokenKind, TAIL,
    },
    syntax::{
        bracket::{control_escape, BracketParser},
        Syntax, SyntaxFlags,
    },
};

/// Operators whose spelling depends on the syntax.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Star,
    Plus,
    Question,
    IntervalOpen,
    GroupOpen,
    GroupClose,
    Alt,
}

/// A parsed atom, before it is linked into a chain.
enum Node {
    /// Mergeable into an adjacent literal.
    Char(char),
    Token(TokenKind),
    /// `^`, `$`, `\b`, lookaheads: cannot be repeated.
    Assertion(TokenKind),
}

pub(crate) struct Parser {
    chars: Vec<char>,
    pos: usize,
    syntax: Syntax,
    config: MatchConfig,
    tokens: Vec<Token>,
    /// Groups opened so far, including group 0.
    groups: usize,
    depth: usize,
    backrefs: bool,
}

impl Parser {
    pub fn new(pattern: &str, syntax: Syntax, config: MatchConfig) -> Self {
        Self {
            chars: pattern.chars().collect(),
            pos: 0,
            syntax,
            config,
            tokens: vec![Token {
                kind: TokenKind::Tail,
                next: TAIL,
            }],
            groups: 1,
            depth: 0,
            backrefs: false,
        }
    }

    pub fn parse(mut self) -> Result<Program, SyntaxError> {
        let alternatives = self.alternatives()?;
        debug_assert!(self.pos == self.chars.len());
        let root = self.push(
            TokenKind::Group {
                index: Some(0),
                alternatives: alternatives.clone(),
            },
            TAIL,
        );
        let end = self.push(
            TokenKind::Anchor {
                kind: AnchorKind::End,
                multiline: false,
            },
            TAIL,
        );
        let full = self.push(
            TokenKind::Group {
                index: Some(0),
                alternatives,
            },
            end,
        );
        Ok(Program {
            tokens: self.tokens,
            root,
            full,
            groups: self.groups,
            backrefs: self.backrefs,
        })
    }

    fn has(&self, flag: SyntaxFlags) -> bool {
        self.syntax.get(flag)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn err(&self, kind: ErrorKind, pos: usize) -> SyntaxError {
        SyntaxError::new(kind, pos)
    }

    fn push(&mut self, kind: TokenKind, next: TokenId) -> TokenId {
        self.tokens.push(Token { kind, next });
        self.tokens.len() - 1
    }

    /// Links nodes into a chain ending in [`TAIL`], merging adjacent chars into literals.
    fn chain(&mut self, nodes: Vec<Node>) -> TokenId {
        let case_insensitive = self.config.case_insensitive;
        let mut kinds = Vec::with_capacity(nodes.len());
        let mut run = Vec::new();
        for node in nodes {
            match node {
                Node::Char(c) => run.push(c),
                Node::Token(kind) | Node::Assertion(kind) => {
                    if !run.is_empty() {
                        kinds.push(TokenKind::Literal {
                            chars: std::mem::take(&mut run).into(),
                            case_insensitive,
                        });
                    }
                    kinds.push(kind);
                }
            }
        }
        if !run.is_empty() {
            kinds.push(TokenKind::Literal {
                chars: run.into(),
                case_insensitive,
            });
        }

        let mut next = TAIL;
        for kind in kinds.into_iter().rev() {
            next = self.push(kind, next);
        }
        next
    }

    /// The operator at the current position and its length in chars.
    fn peek_op(&self) -> Option<(Op, usize)> {
        let limited = self.has(SyntaxFlags::LIMITED_OPS);
        let bk_plus_qm = self.has(SyntaxFlags::BK_PLUS_QM);
        let bk_braces = !self.has(SyntaxFlags::NO_BK_BRACES);
        let interval_start = |n: usize| {
            self.has(SyntaxFlags::INTERVALS)
                && matches!(self.peek_at(n), Some(c) if c.is_ascii_digit() || c == ',')
        };
        let op = match self.peek()? {
            '\\' => match self.peek_at(1)? {
                '(' if !self.has(SyntaxFlags::NO_BK_PARENS) => (Op::GroupOpen, 2),
                ')' if !self.has(SyntaxFlags::NO_BK_PARENS) => (Op::GroupClose, 2),
                '|' if !self.has(SyntaxFlags::NO_BK_VBAR) && !limited => (Op::Alt, 2),
                '{' if bk_braces && interval_start(2) => (Op::IntervalOpen, 2),
                '+' if bk_plus_qm && !limited => (Op::Plus, 2),
                '?' if bk_plus_qm && !limited => (Op::Question, 2),
                _ => return None,
            },
            '(' if self.has(SyntaxFlags::NO_BK_PARENS) => (Op::GroupOpen, 1),
            ')' if self.has(SyntaxFlags::NO_BK_PARENS) => (Op::GroupClose, 1),
            '|' if self.has(SyntaxFlags::NO_BK_VBAR) && !limited => (Op::Alt, 1),
            '\n' if self.has(SyntaxFlags::NEWLINE_ALT) => (Op::Alt, 1),
            '{' if !bk_braces && interval_start(1) => (Op::IntervalOpen, 1),
            '*' => (Op::Star, 1),
            '+' if !bk_plus_qm && !limited => (Op::Plus, 1),
            '?' if !bk_plus_qm && !limited => (Op::Question, 1),
            _ => return None,
        };
        Some(op)
    }

    fn alternatives(&mut self) -> Result<Box<[TokenId]>, SyntaxError> {
        let mut alternatives = vec![self.sequence()?];
        while let Some((Op::Alt, len)) = self.peek_op() {
            self.pos += len;
            alternatives.push(self.sequence()?);
        }
        Ok(alternatives.into())
    }

    fn sequence(&mut self) -> Result<TokenId, SyntaxError> {
        let mut nodes = Vec::new();
        let mut at_start = true;
        while self.pos < self.chars.len() {
            let op = self.peek_op();
            let node = match op {
                Some((Op::Alt, _)) => break,
                Some((Op::GroupClose, _)) if self.depth > 0 => break,
                Some((Op::GroupClose, len)) => {
                    if !self.has(SyntaxFlags::UNMATCHED_RIGHT_PAREN_ORD) {
                        return Err(self.err(ErrorKind::UnmatchedRightParen, self.pos));
                    }
                    self.pos += len;
                    Node::Char(')')
                }
                Some((Op::Star | Op::Plus | Op::Question | Op::IntervalOpen, len)) => {
                    self.nothing_to_repeat(len)?
                }
                Some((Op::GroupOpen, len)) => match self.group(len)? {
                    Some(node) => node,
                    // comment
                    None => continue,
                },
                None => self.atom(at_start)?,
            };
            at_start = false;

            let node = match node {
                Node::Assertion(_) => node,
                node => self.quantifiers(node)?,
            };
            nodes.push(node);
        }
        Ok(self.chain(nodes))
    }

    /// A repetition operator where an atom is expected.
    fn nothing_to_repeat(&mut self, len: usize) -> Result<Node, SyntaxError> {
        if self.has(SyntaxFlags::CONTEXT_INDEP_OPS) || self.has(SyntaxFlags::CONTEXT_INVALID_OPS) {
            return Err(self.err(ErrorKind::NothingToRepeat, self.pos));
        }
        // the operator char itself, e.g. `*` or the `+` of `\+`
        let c = self.chars[self.pos + len - 1];
        self.pos += len;
        Ok(Node::Char(c))
    }

    /// At a group open. Returns `None` for comments.
    fn group(&mut self, len: usize) -> Result<Option<Node>, SyntaxError> {
        let open = self.pos;
        self.pos += len;

        let extensions = self.has(SyntaxFlags::PURE_GROUPING)
            || self.has(SyntaxFlags::LOOKAHEAD)
            || self.has(SyntaxFlags::COMMENTS);
        let mut capture = true;
        let mut lookahead = None;
        if extensions && self.peek() == Some('?') {
            let flag = self.peek_at(1);
            match flag {
                Some(':') if self.has(SyntaxFlags::PURE_GROUPING) => capture = false,
                Some(c @ ('=' | '!')) if self.has(SyntaxFlags::LOOKAHEAD) => {
                    capture = false;
                    lookahead = Some(c == '!');
                }
                Some('#') if self.has(SyntaxFlags::COMMENTS) => {
                    let Some(len) = self.chars[self.pos..].iter().position(|&c| c == ')') else {
                        return Err(self.err(ErrorKind::UnterminatedComment, open));
                    };
                    self.pos += len + 1;
                    return Ok(None);
                }
                Some(c) => return Err(self.err(ErrorKind::UnknownGroupFlag(c), self.pos + 1)),
                None => return Err(self.err(ErrorKind::UnmatchedLeftParen, open)),
            }
            self.pos += 2;
        }

        let index = capture.then(|| {
            self.groups += 1;
            self.groups - 1
        });
        self.depth += 1;
        let alternatives = self.alternatives()?;
        self.depth -= 1;
        match self.peek_op() {
            Some((Op::GroupClose, len)) => self.pos += len,
            _ => return Err(self.err(ErrorKind::UnmatchedLeftParen, open)),
        }

        let group = TokenKind::Group {
            index,
            alternatives,
        };
        Ok(Some(match lookahead {
            Some(negate) => {
                let sub = self.push(group, TAIL);
                Node::Assertion(TokenKind::LookAhead { negate, sub })
            }
            None => Node::Token(group),
        }))
    }

    fn atom(&mut self, at_start: bool) -> Result<Node, SyntaxError> {
        let case_insensitive = self.config.case_insensitive;
        let c = self.chars[self.pos];
        self.pos += 1;
        Ok(match c {
            '.' => Node::Token(TokenKind::Any {
                newline: self.has(SyntaxFlags::DOT_NEWLINE) || self.config.dot_newline,
                null: !self.has(SyntaxFlags::DOT_NOT_NULL),
            }),
            '^' if at_start || self.has(SyntaxFlags::CONTEXT_INDEP_ANCHORS) => {
                Node::Assertion(TokenKind::Anchor {
                    kind: AnchorKind::Start,
                    multiline: self.config.multiline,
                })
            }
            '$' if self.has(SyntaxFlags::CONTEXT_INDEP_ANCHORS) || self.at_sequence_end() => {
                Node::Assertion(TokenKind::Anchor {
                    kind: AnchorKind::End,
                    multiline: self.config.multiline,
                })
            }
            '[' => {
                let (set, end) = BracketParser::new(&self.chars, self.pos - 1, self.syntax)
                    .parse(case_insensitive)?;
                self.pos = end;
                Node::Token(TokenKind::Set(set))
            }
            '\\' => self.escape()?,
            c => Node::Char(c),
        })
    }

    fn at_sequence_end(&self) -> bool {
        self.pos == self.chars.len()
            || matches!(self.peek_op(), Some((Op::GroupClose | Op::Alt, _)))
    }

    /// After a `\` that is not an operator spelling.
    fn escape(&mut self) -> Result<Node, SyntaxError> {
        let backslash = self.pos - 1;
        let case_insensitive = self.config.case_insensitive;
        let Some(c) = self.peek() else {
            return Err(self.err(ErrorKind::TrailingEscape, backslash));
        };
        self.pos += 1;

        if let Some(group) = c.to_digit(10).filter(|&d| d != 0) {
            if !self.has(SyntaxFlags::NO_BK_REFS) {
                let group = group as usize;
                if group >= self.groups {
                    return Err(self.err(ErrorKind::UndefinedGroup(group), backslash));
                }
                self.backrefs = true;
                return Ok(Node::Token(TokenKind::Backref {
                    group,
                    case_insensitive,
                }));
            }
        }

        if self.has(SyntaxFlags::STRING_ANCHORS) {
            let kind = match c {
                'A' => Some(AnchorKind::Start),
                'Z' => Some(AnchorKind::End),
                _ => None,
            };
            if let Some(kind) = kind {
                return Ok(Node::Assertion(TokenKind::Anchor {
                    kind,
                    multiline: false,
                }));
            }
        }

        if self.has(SyntaxFlags::CHAR_CLASS_ESCAPES) {
            if let Some((class, negated)) = PosixClass::from_escape(c) {
                return Ok(Node::Token(TokenKind::Posix {
                    class,
                    negated,
                    case_insensitive,
                }));
            }
            match c {
                'b' => return Ok(Node::Assertion(TokenKind::WordBoundary(BoundaryKind::Boundary))),
                'B' => {
                    return Ok(Node::Assertion(TokenKind::WordBoundary(
                        BoundaryKind::NotBoundary,
                    )))
                }
                _ => {}
            }
            if let Some(control) = control_escape(c) {
                return Ok(Node::Char(control));
            }
        } else {
            match c {
                '<' => return Ok(Node::Assertion(TokenKind::WordBoundary(BoundaryKind::Start))),
                '>' => return Ok(Node::Assertion(TokenKind::WordBoundary(BoundaryKind::End))),
                _ => {}
            }
        }

        Ok(Node::Char(c))
    }

    /// Wraps `node` in as many repetitions as follow it.
    fn quantifiers(&mut self, mut node: Node) -> Result<Node, SyntaxError> {
        loop {
            let (min, max) = match self.peek_op() {
                Some((Op::Star, len)) => {
                    self.pos += len;
                    (0, None)
                }
                Some((Op::Plus, len)) => {
                    self.pos += len;
                    (1, None)
                }
                Some((Op::Question, len)) => {
                    self.pos += len;
                    (0, Some(1))
                }
                Some((Op::IntervalOpen, len)) => self.interval(len)?,
                _ => return Ok(node),
            };
            let greedy = !(self.has(SyntaxFlags::STINGY_OPS) && self.peek() == Some('?'));
            if !greedy {
                self.pos += 1;
            }
            let sub = self.chain(vec![node]);
            node = Node::Token(TokenKind::Repeat {
                sub,
                min,
                max,
                greedy,
            });
        }
    }

    /// `{m}`, `{m,}`, `{m,n}` or `{,n}`, with the syntax's brace spelling.
    fn interval(&mut self, len: usize) -> Result<(usize, Option<usize>), SyntaxError> {
        let open = self.pos;
        self.pos += len;
        let malformed = |this: &Self| this.err(ErrorKind::MalformedInterval, open);

        let min = self.number().map_err(|_| malformed(self))?;
        let max = if self.peek() == Some(',') {
            self.pos += 1;
            self.number().map_err(|_| malformed(self))?
        } else {
            Some(min.unwrap_or(0))
        };
        let min = min.unwrap_or(0);

        let close = if self.has(SyntaxFlags::NO_BK_BRACES) {
            self.peek() == Some('}')
        } else {
            self.peek() == Some('\\') && self.peek_at(1) == Some('}')
        };
        if !close {
            return Err(malformed(self));
        }
        self.pos += if self.has(SyntaxFlags::NO_BK_BRACES) { 1 } else { 2 };

        match max {
            Some(max) if min > max => {
                Err(self.err(ErrorKind::InvalidInterval { min, max }, open))
            }
            max => Ok((min, max)),
        }
    }

    /// Decimal digits, if any. `Err` on overflow.
    fn number(&mut self) -> Result<Option<usize>, ()> {
        let mut n: Option<usize> = None;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            n = Some(
                n.unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(d as usize))
                    .ok_or(())?,
            );
            self.pos += 1;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pattern: &str, syntax: Syntax) -> Result<Program, SyntaxError> {
        Parser::new(pattern, syntax, MatchConfig::default()).parse()
    }

    fn dump(pattern: &str, syntax: Syntax) -> String {
        parse(pattern, syntax).unwrap().to_string()
    }

    fn err(pattern: &str, syntax: Syntax) -> (ErrorKind, usize) {
        let e = parse(pattern, syntax).unwrap_err();
        (e.kind().clone(), e.pos())
    }

    #[test]
    fn literal_merge() {
        let prog = parse("abc", Syntax::PERL5).unwrap();
        let literals = prog
            .tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Literal { .. }))
            .count();
        assert_eq!(literals, 1);
        assert_eq!(
            prog.tokens[1].kind,
            TokenKind::Literal {
                chars: ['a', 'b', 'c'].into(),
                case_insensitive: false
            }
        );
        assert_eq!(prog.groups, 1);

        assert_eq!(dump("abc*", Syntax::PERL5), "abc*");
        let prog = parse("abc*", Syntax::PERL5).unwrap();
        assert!(prog.tokens.iter().any(|t| t.kind
            == TokenKind::Literal {
                chars: ['a', 'b'].into(),
                case_insensitive: false
            }));
    }

    #[test]
    fn spellings() {
        assert_eq!(dump(r"\(a\|b\)\{2,3\}", Syntax::POSIX_BASIC), "(a|b){2,3}");
        assert_eq!(dump(r"(a|b){2,3}", Syntax::POSIX_BASIC), r"\(a\|b\)\{2,3\}");
        assert_eq!(dump(r"(a|b){2,3}", Syntax::POSIX_EXTENDED), "(a|b){2,3}");
        assert_eq!(dump(r"a\+b\?", Syntax::GREP), "a+b?");
        assert_eq!(dump(r"a+b?", Syntax::GREP), r"a\+b\?");
        assert_eq!(dump(r"a+b?", Syntax::EMACS), "a+b?");
        assert_eq!(dump(r"a{2}", Syntax::EMACS), r"a\{2\}");
        assert_eq!(dump("a\nb", Syntax::GREP), "a|b");
        assert_eq!(dump("a|b+", Syntax::POSIX_MINIMAL_BASIC), r"a\|b\+");
        assert_eq!(dump(r"a{,3}", Syntax::PERL5), "a{0,3}");
        assert_eq!(dump(r"a{3}b{3,}", Syntax::PERL5), "a{3}b{3,}");
        assert_eq!(dump(r"x{a", Syntax::PERL5), r"x\{a");
    }

    #[test]
    fn groups() {
        let prog = parse("(a)(?:b)((c))", Syntax::PERL5).unwrap();
        assert_eq!(prog.groups, 4);
        assert_eq!(prog.to_string(), "(a)(?:b)((c))");
        assert_eq!(dump("a(?#comment)b", Syntax::PERL5), "ab");
        assert_eq!(dump("a(?=b)(?!c)", Syntax::PERL5), "a(?=b)(?!c)");
        assert_eq!(dump("(a|)", Syntax::PERL5), "(a|)");
    }

    #[test]
    fn context_anchors() {
        // POSIX basic: anchors only at the ends
        let prog = parse("a^b$c", Syntax::POSIX_BASIC).unwrap();
        assert_eq!(prog.min_len(), 5);
        assert_eq!(prog.to_string(), r"a\^b\$c");
        assert_eq!(dump(r"^a\|^b$", Syntax::GREP), "^a|^b$");
        assert_eq!(dump(r"\(^a$\)", Syntax::POSIX_BASIC), "(^a$)");
        // leading `*` is literal
        assert_eq!(dump("*a", Syntax::POSIX_BASIC), r"\*a");
        assert_eq!(dump("^*a", Syntax::POSIX_BASIC), r"^\*a");

        let prog = parse("a^b$c", Syntax::POSIX_EXTENDED).unwrap();
        assert_eq!(prog.min_len(), 3);
        assert_eq!(prog.to_string(), "a^b$c");
    }

    #[test]
    fn escapes() {
        assert_eq!(dump(r"\d\W\s\bx\B", Syntax::PERL5), r"\d\W\s\bx\B");
        assert_eq!(dump(r"\<a\>", Syntax::EMACS), r"\<a\>");
        assert_eq!(dump(r"\d", Syntax::EMACS), "d");
        assert_eq!(dump(r"\Aa\Z", Syntax::PERL5), "^a$");
        assert_eq!(dump(r"a\tb", Syntax::PERL5), r"a\tb");
        assert_eq!(dump(r"\.\*", Syntax::PERL5), r"\.\*");

        let prog = parse(r"(a)\1", Syntax::PERL5).unwrap();
        assert!(prog.backrefs);
        assert_eq!(prog.to_string(), r"(a)\1");
        let prog = parse(r"(a)\1", Syntax::AWK).unwrap();
        assert!(!prog.backrefs);
        assert_eq!(prog.to_string(), "(a)1");
    }

    #[test]
    fn quantifiers() {
        assert_eq!(dump("a*?b+?c??d{1,2}?", Syntax::PERL5), "a*?b+?c??d{1,2}?");
        // no stingy ops: nested
        assert_eq!(dump("a*?", Syntax::POSIX_EXTENDED), "(?:a*)?");
        assert_eq!(dump("a**", Syntax::PERL5), "(?:a*)*");
        assert_eq!(dump("(ab)+", Syntax::PERL5), "(ab)+");
        assert_eq!(dump("[ab]{2}", Syntax::PERL5), "[ab]{2}");
        assert_eq!(dump("^*", Syntax::EMACS), r"^\*");
    }

    #[test]
    fn errors() {
        assert_eq!(err("(abc", Syntax::PERL5), (ErrorKind::UnmatchedLeftParen, 0));
        assert_eq!(err("a(b(c)", Syntax::PERL5), (ErrorKind::UnmatchedLeftParen, 1));
        assert_eq!(err(r"\(a", Syntax::POSIX_BASIC), (ErrorKind::UnmatchedLeftParen, 0));
        assert_eq!(err("a)", Syntax::PERL5), (ErrorKind::UnmatchedRightParen, 1));
        assert_eq!(dump("a)", Syntax::POSIX_EXTENDED), r"a\)");
        assert_eq!(
            err("a{5,2}", Syntax::PERL5),
            (ErrorKind::InvalidInterval { min: 5, max: 2 }, 1)
        );
        assert_eq!(err("a{3", Syntax::PERL5), (ErrorKind::MalformedInterval, 1));
        assert_eq!(err("a{3,x}", Syntax::PERL5), (ErrorKind::MalformedInterval, 1));
        assert_eq!(
            err("[[:nope:]]", Syntax::POSIX_EXTENDED),
            (ErrorKind::UnknownPosixClass("nope".into()), 1)
        );
        assert_eq!(err(r"ab\", Syntax::PERL5), (ErrorKind::TrailingEscape, 2));
        assert_eq!(err("*a", Syntax::PERL5), (ErrorKind::NothingToRepeat, 0));
        assert_eq!(err("a|*b", Syntax::POSIX_EXTENDED), (ErrorKind::NothingToRepeat, 2));
        assert_eq!(err("(+a)", Syntax::POSIX_MINIMAL_EXTENDED), (ErrorKind::NothingToRepeat, 1));
        assert_eq!(err(r"(a)\2", Syntax::PERL5), (ErrorKind::UndefinedGroup(2), 3));
        assert_eq!(err("a(?#x", Syntax::PERL5), (ErrorKind::UnterminatedComment, 1));
        assert_eq!(err("(?<a>x)", Syntax::PERL5), (ErrorKind::UnknownGroupFlag('<'), 2));
        assert_eq!(err("[a", Syntax::PERL5), (ErrorKind::UnterminatedBracket, 0));
        assert_eq!(err("[b-a]", Syntax::PERL5), (ErrorKind::EmptyRange('b', 'a'), 1));
    }
}
