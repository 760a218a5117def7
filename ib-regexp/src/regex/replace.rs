use crate::matcher::{input::StrSource, Match};

/// Appends `template` to `out`, expanding `$0`-`$9` to group texts and `$$` to `$`.
///
/// A group that did not participate expands to nothing. A `$` not followed by a digit or `$` is kept.
pub(crate) fn expand(template: &str, m: &Match, source: &StrSource<'_>, out: &mut String) {
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some(d @ '0'..='9') => {
                chars.next();
                let group = d as usize - '0' as usize;
                if let Some(range) = m.group(group) {
                    out.push_str(source.slice(range));
                }
            }
            _ => out.push('$'),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Regex;

    use super::*;

    #[test]
    fn templates() {
        let hay = "key=value";
        let m = Regex::new("(\\w+)=(\\w+)|(x)").unwrap().find(hay).unwrap();
        let mut out = String::new();
        expand("$2=$1 [$0] $3$$ $x $", &m, &StrSource::new(hay), &mut out);
        assert_eq!(out, "value=key [key=value] $ $x $");
    }
}
