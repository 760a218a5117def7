use bon::Builder;

/// Compile-time match options. Independent of the [`Syntax`](crate::Syntax) dialect.
///
/// ```
/// use ib_regexp::{matcher::MatchConfig, Regex};
///
/// let re = Regex::builder()
///     .config(MatchConfig::builder().case_insensitive(true).build())
///     .build("ABC")
///     .unwrap();
/// assert!(re.is_match("xabc"));
/// ```
#[derive(Builder, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MatchConfig {
    /// Literals, bracket expressions, POSIX classes and backreferences ignore case.
    ///
    /// Only simple per-char case mapping is done, see [`ib_unicode::case`].
    #[builder(default = false)]
    pub(crate) case_insensitive: bool,

    /// `^` and `$` also match after and before a newline.
    #[builder(default = false)]
    pub(crate) multiline: bool,

    /// `.` matches newline regardless of [`SyntaxFlags::DOT_NEWLINE`](crate::SyntaxFlags::DOT_NEWLINE).
    #[builder(default = false)]
    pub(crate) dot_newline: bool,
}

impl MatchConfig {
    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn multiline(&self) -> bool {
        self.multiline
    }

    pub fn dot_newline(&self) -> bool {
        self.dot_newline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        assert_eq!(MatchConfig::builder().build(), MatchConfig::default());
        let config = MatchConfig::builder().multiline(true).build();
        assert!(config.multiline());
        assert!(!config.case_insensitive());
        assert!(!config.dot_newline());
    }
}
