/*!
A backtracking regex engine with selectable syntax dialects.

## Features
- [Syntax dialects](syntax)
  - POSIX basic and extended, awk, grep, egrep, Emacs, ed/sed and Perl 4/5 presets.
  - Or any combination of [`SyntaxFlags`], e.g. Perl 5 without look-ahead.
- Backtracking matching
  - Greedy and stingy (lazy) repetition, bounded intervals, alternation.
  - Capture groups and backreferences, look-ahead assertions, word boundaries.
  - Per-match [anchoring flags](MatchFlags) for matching in the middle of a larger text.
- Unicode support
  - Matching is done on chars, not bytes, so `.` never splits a char.
  - Unicode case insensitivity.
- [Streaming input](matcher::input)
  - Match over any [`CharSource`](matcher::input::CharSource), including a [`std::io::Read`] via [`ReaderSource`](matcher::input::ReaderSource), which releases consumed input as matching proceeds.
*/
//! ## Usage
//! ```
//! use ib_regexp::{Regex, Syntax};
//!
//! let re = Regex::new(r"(\d{4})-(\d{2})").unwrap();
//! let m = re.find("released 2024-06, patched 2024-09").unwrap();
//! assert_eq!(m.range(), 9..16);
//! assert_eq!(m.group(1), Some(9..13));
//!
//! // the same pattern in POSIX basic syntax
//! let re = Regex::builder()
//!     .syntax(Syntax::POSIX_BASIC)
//!     .build(r"\([0-9]\{4\}\)-\([0-9]\{2\}\)")
//!     .unwrap();
//! assert_eq!(re.find_all("2024-06 2024-09").len(), 2);
//!
//! // dialects can also be picked by name
//! let re = ib_regexp::compile("colou?r", "egrep".parse().unwrap()).unwrap();
//! assert!(re.is_match("what colour"));
//! ```
/*!
## Streaming
```
use ib_regexp::{matcher::input::ReaderSource, Regex};

let log = "GET /a 200\nGET /b 404\nPOST /c 500\n".repeat(100);
let re = Regex::new(r"[45]\d\d").unwrap();
let mut source = ReaderSource::new(log.as_bytes());
assert_eq!(re.find_iter(&mut source).count(), 200);
assert!(source.take_error().is_none());
```
*/
//! ## Performance
//! The following `Cargo.toml` settings are recommended if best performance is desired:
//! ```toml
//! [profile.release]
//! lto = "fat"
//! codegen-units = 1
//! ```
//!
//! Backtracking is exponential in the worst case, e.g. `(a*)*b` on a long run of `a`. Prefer patterns whose alternatives don't overlap.
//!
//! ## Crate features
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]

pub mod error;
pub mod matcher;
pub mod regex;
pub mod syntax;

pub use error::{ErrorKind, SyntaxError, UnknownSyntax};
pub use matcher::{Match, MatchConfig, MatchFlags};
pub use regex::Regex;
pub use syntax::{Syntax, SyntaxFlags};

/// Compiles `pattern` in the given dialect with the default [`MatchConfig`].
///
/// Shorthand for `Regex::builder().syntax(syntax).build(pattern)`.
pub fn compile(pattern: &str, syntax: Syntax) -> Result<Regex, SyntaxError> {
    Regex::builder().syntax(syntax).build(pattern)
}
