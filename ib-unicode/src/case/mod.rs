/*!
## Mono case
The "mono lowercase" (and "mono uppercase") mentioned in this module refers to the single-char case mapping of a Unicode character, i.e. the first char of [`char::to_lowercase()`]/[`char::to_uppercase()`].

- The only multi-char lowercase mapping is `İ` -> `i\u{307}`, which is mapped to `i` here.
- Multi-char uppercase mappings like `ß` -> `SS` keep only the first char, so `ß` is mapped to `S`. This makes `ß` equal to `s` under [`eq_ignore_case()`](CharCaseExt::eq_ignore_case), a known limitation of simple case mapping.

Full case folding (where one char can match several) is out of scope.
*/
use crate::Sealed;

pub trait CharCaseExt: Sealed + Copy {
    /// See [mono case](super::case) for details.
    fn to_mono_lowercase(self) -> char;

    /// See [mono case](super::case) for details.
    fn to_mono_uppercase(self) -> char;

    /// Equal under simple case mapping.
    ///
    /// ```
    /// use ib_unicode::case::CharCaseExt;
    ///
    /// assert!('a'.eq_ignore_case('A'));
    /// assert!('Σ'.eq_ignore_case('σ'));
    /// assert!('a'.eq_ignore_case('b') == false);
    /// ```
    fn eq_ignore_case(self, other: char) -> bool;
}

impl CharCaseExt for char {
    #[inline]
    fn to_mono_lowercase(self) -> char {
        if self.is_ascii() {
            return self.to_ascii_lowercase();
        }
        self.to_lowercase().next().unwrap_or(self)
    }

    #[inline]
    fn to_mono_uppercase(self) -> char {
        if self.is_ascii() {
            return self.to_ascii_uppercase();
        }
        self.to_uppercase().next().unwrap_or(self)
    }

    #[inline]
    fn eq_ignore_case(self, other: char) -> bool {
        self == other
            || self.to_mono_lowercase() == other.to_mono_lowercase()
            // e.g. 'ς' and 'σ' only meet in uppercase
            || self.to_mono_uppercase() == other.to_mono_uppercase()
    }
}

pub trait StrCaseExt: Sealed {
    /// See [mono case](super::case) for details.
    fn to_mono_lowercase(&self) -> String;

    /// Char-by-char [`CharCaseExt::eq_ignore_case`].
    fn eq_ignore_case(&self, other: &str) -> bool;
}

impl StrCaseExt for str {
    fn to_mono_lowercase(&self) -> String {
        self.chars().map(|c| c.to_mono_lowercase()).collect()
    }

    fn eq_ignore_case(&self, other: &str) -> bool {
        let mut a = self.chars();
        let mut b = other.chars();
        loop {
            match (a.next(), b.next()) {
                (Some(x), Some(y)) if x.eq_ignore_case(y) => continue,
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}
