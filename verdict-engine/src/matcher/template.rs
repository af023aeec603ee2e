// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Patterns for parameterized test labels.
//!
//! A label like `add(%i, %i)` or `$a + $b` is declared once in source, but the runner reports
//! one record per parameter set with the placeholders substituted.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Placeholders recognized in labels: printf-style conversions (`%%` is a literal percent
/// sign), `$name` substitutions with optional dotted paths, and `${...}` interpolations.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%%|%[psdifjoO#]|\$\{[^}]*\}|\$[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*")
        .expect("placeholder regex is valid")
});

/// A label with at least one placeholder, compiled into an anchored pattern.
#[derive(Clone, Debug)]
pub struct TemplatePattern {
    body: String,
    regex: Regex,
}

impl TemplatePattern {
    /// Compiles `label` into a pattern, or returns `None` if the label has no placeholder.
    pub fn compile(label: &str) -> Option<Self> {
        let mut body = String::with_capacity(label.len() + 8);
        let mut has_placeholder = false;
        let mut last_end = 0;

        for m in PLACEHOLDER.find_iter(label) {
            body.push_str(&regex::escape(&label[last_end..m.start()]));
            if m.as_str() == "%%" {
                body.push_str(&regex::escape("%"));
            } else {
                body.push_str("(.*?)");
                has_placeholder = true;
            }
            last_end = m.end();
        }
        body.push_str(&regex::escape(&label[last_end..]));

        if !has_placeholder {
            return None;
        }

        match Regex::new(&format!("^{body}$")) {
            Ok(regex) => Some(Self { body, regex }),
            Err(error) => {
                warn!("label `{label}` could not be compiled into a pattern, matching it verbatim: {error}");
                None
            }
        }
    }

    /// Returns the unanchored pattern source.
    pub fn as_str(&self) -> &str {
        &self.body
    }

    /// Returns true if `name` is an instance of this template.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn named_and_interpolated_placeholders() {
        let pattern = TemplatePattern::compile("$a + $b returned value not be less than ${i}")
            .expect("label has placeholders");
        assert_eq!(
            pattern.as_str(),
            r"(.*?) \+ (.*?) returned value not be less than (.*?)"
        );
        assert!(pattern.is_match("1 + 2 returned value not be less than 3"));
        assert!(!pattern.is_match("1 - 2 returned value not be less than 3"));
    }

    #[test]
    fn printf_placeholder() {
        let pattern = TemplatePattern::compile("%i").expect("label has placeholders");
        assert_eq!(pattern.as_str(), "(.*?)");
        assert!(pattern.is_match("42"));
        assert!(pattern.is_match(""));
    }

    #[test_case("adds two numbers"; "plain")]
    #[test_case("100%% coverage"; "escaped percent only")]
    #[test_case("costs $5"; "dollar before digit")]
    #[test_case("50% off"; "unknown conversion")]
    fn labels_without_placeholders(label: &str) {
        assert!(TemplatePattern::compile(label).is_none());
    }

    #[test]
    fn literal_percent_and_metacharacters() {
        let pattern = TemplatePattern::compile("%s is 100%% (done) [$user.name]")
            .expect("label has placeholders");
        assert!(pattern.is_match("build is 100% (done) [alice]"));
        assert!(!pattern.is_match("build is 100%% (done) [alice]"));
        // `%s` absorbs any leading text.
        assert!(pattern.is_match("prefix build is 100% (done) [alice]"));
    }

    #[test]
    fn pattern_is_anchored() {
        let pattern = TemplatePattern::compile("sum %i done").expect("label has placeholders");
        assert!(pattern.is_match("sum 1 done"));
        assert!(!pattern.is_match("x sum 1 done"));
        assert!(!pattern.is_match("sum 1 done x"));
    }

    #[test]
    fn all_printf_conversions() {
        let pattern = TemplatePattern::compile("%p %s %d %i %f %j %o %O %#")
            .expect("label has placeholders");
        assert!(pattern.is_match("a b 1 2 3.5 {} [] {\"x\":1} 0"));
    }
}
