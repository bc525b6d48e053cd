//! Glob classification of changed file paths.
//!
//! Patterns follow the usual shell conventions: `*` stays inside one path segment,
//! `**` spans segments, wildcards skip dot-prefixed segments unless the pattern
//! names the dot, and matching is case-sensitive. Brace (`{a,b}`) and extglob
//! (`+(a|b)`, `@(a|b)`, `?(a|b)`, `*(a|b)`) groups keep their shell meaning.
//! Each pattern is translated into one anchored `Regex`, so matching stays
//! linear in the path length however many alternatives a pattern spells.

use regex::{Regex, RegexBuilder};
use std::fmt;

use crate::error::{LabelerError, Result};

/// Longest accepted pattern source, in characters.
pub const MAX_PATTERN_LEN: usize = 1024;

/// Compiled program size limit handed to the regex builder.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// One segment, not starting with a dot.
const SEGMENT: &str = "[^/.][^/]*";

/// One source pattern and its compiled form.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(source: &str) -> Result<Self> {
        let invalid = |message: String| LabelerError::Pattern {
            pattern: source.to_string(),
            message,
        };

        if source.chars().count() > MAX_PATTERN_LEN {
            return Err(invalid(format!(
                "pattern is longer than {MAX_PATTERN_LEN} characters"
            )));
        }

        let translated = translate(source).map_err(invalid)?;
        let regex = RegexBuilder::new(&translated)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// A named group of patterns; a path matches the set if it matches any member.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<GlobPattern>,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| GlobPattern::new(pattern.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Build a set from user-supplied patterns, dropping the ones that fail to compile.
    pub fn lenient<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|pattern| match GlobPattern::new(pattern.as_ref()) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unusable glob pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }

    /// True when there is at least one path and every path matches the set.
    pub fn matches_every<'a, I>(&self, paths: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = false;
        for path in paths {
            if !self.matches(path) {
                return false;
            }
            seen = true;
        }
        seen
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(GlobPattern::as_str)
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<&str> = self.sources().collect();
        f.write_str(&sources.join(", "))
    }
}

/// Translate a glob into an anchored regular expression.
fn translate(pattern: &str) -> std::result::Result<String, String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut translator = Translator { chars, pos: 0 };
    let body = translator.sequence(&[], true)?;
    Ok(format!("^{body}$"))
}

struct Translator {
    chars: Vec<char>,
    pos: usize,
}

impl Translator {
    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Translate up to the end of input or an unconsumed `stops` character.
    fn sequence(
        &mut self,
        stops: &[char],
        mut segment_start: bool,
    ) -> std::result::Result<String, String> {
        let mut out = String::new();

        while let Some(c) = self.peek(0) {
            if stops.contains(&c) {
                break;
            }

            if matches!(c, '+' | '@' | '?' | '*' | '!') && self.peek(1) == Some('(') {
                if c == '!' {
                    return Err("negated extglob groups are not supported".to_string());
                }
                self.pos += 2;
                let group = self.group('|', ')', segment_start)?;
                out.push_str(&group);
                match c {
                    '+' => out.push('+'),
                    '*' => out.push('*'),
                    '?' => out.push('?'),
                    _ => {}
                }
                segment_start = false;
                continue;
            }

            match c {
                '{' => {
                    self.pos += 1;
                    let group = self.group(',', '}', segment_start)?;
                    out.push_str(&group);
                    segment_start = false;
                }
                '*' => {
                    let mut stars = 0;
                    while self.peek(0) == Some('*') {
                        self.pos += 1;
                        stars += 1;
                    }
                    if stars > 1 && segment_start && self.peek(0) == Some('/') {
                        self.pos += 1;
                        out.push_str(&format!("(?:{SEGMENT}/)*"));
                        continue;
                    }
                    if stars > 1 && segment_start && self.pos == self.chars.len() {
                        out.push_str(&format!("{SEGMENT}(?:/{SEGMENT})*"));
                    } else if segment_start && self.peek(0) == Some('.') {
                        out.push_str(SEGMENT);
                    } else if segment_start {
                        out.push_str(&format!("(?:{SEGMENT})?"));
                    } else {
                        out.push_str("[^/]*");
                    }
                    segment_start = false;
                }
                '?' => {
                    self.pos += 1;
                    out.push_str(if segment_start { "[^/.]" } else { "[^/]" });
                    segment_start = false;
                }
                '[' => {
                    out.push_str(&self.class());
                    segment_start = false;
                }
                '\\' => {
                    self.pos += 1;
                    let escaped = self.peek(0).unwrap_or('\\');
                    self.pos += 1;
                    out.push_str(&regex::escape(&escaped.to_string()));
                    segment_start = false;
                }
                _ => {
                    self.pos += 1;
                    out.push_str(&regex::escape(&c.to_string()));
                    segment_start = c == '/';
                }
            }
        }

        Ok(out)
    }

    /// Alternatives up to `close`, already past the opening delimiter.
    fn group(
        &mut self,
        separator: char,
        close: char,
        segment_start: bool,
    ) -> std::result::Result<String, String> {
        let open = if close == '}' { '{' } else { '(' };
        let mut alternatives = Vec::new();

        loop {
            alternatives.push(self.sequence(&[separator, close], segment_start)?);
            match self.peek(0) {
                Some(c) if c == separator => self.pos += 1,
                Some(_) => {
                    self.pos += 1;
                    return Ok(format!("(?:{})", alternatives.join("|")));
                }
                None => return Err(format!("unclosed '{open}' group")),
            }
        }
    }

    /// A `[...]` class, or a literal `[` when it is never closed.
    fn class(&mut self) -> String {
        let open = self.pos;
        let mut i = open + 1;
        let negated = matches!(self.chars.get(i), Some('!' | '^'));
        if negated {
            i += 1;
        }
        let first = i;
        // A `]` right after `[` or `[!` is a literal member of the class.
        i += 1;
        while i < self.chars.len() && self.chars[i] != ']' {
            i += 1;
        }
        if first >= self.chars.len() || i >= self.chars.len() {
            self.pos += 1;
            return regex::escape("[");
        }

        let mut out = String::from(if negated { "[^/" } else { "[" });
        for &c in &self.chars[first..i] {
            if matches!(c, '\\' | '[' | ']' | '^' | '&' | '~') {
                out.push('\\');
            }
            out.push(c);
        }
        out.push(']');
        self.pos = i + 1;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CHROMATIC_SKIP_GLOB_PATTERNS, NON_DEPLOYMENT_GLOB_PATTERNS};

    fn glob(pattern: &str) -> GlobPattern {
        GlobPattern::new(pattern).unwrap()
    }

    #[test]
    fn test_translate_groups() {
        assert_eq!(
            translate("**/*.+(mocks|fixtures).ts").unwrap(),
            r"^(?:[^/.][^/]*/)*[^/.][^/]*\.(?:mocks|fixtures)+\.ts$"
        );
        assert_eq!(translate("src/{a,b}/x").unwrap(), "^src/(?:a|b)/x$");
        assert_eq!(translate("*.y?(a)ml").unwrap(), r"^[^/.][^/]*\.y(?:a)?ml$");
    }

    #[test]
    fn test_brace_and_nested_groups_match() {
        let pattern = glob("{lib,bin}/*.@(js|ts)");
        assert!(pattern.matches("lib/index.js"));
        assert!(pattern.matches("bin/cli.ts"));
        assert!(!pattern.matches("src/index.js"));
        assert!(!pattern.matches("lib/index.jsx"));

        let pattern = glob("src/{a,{b,c}}/x");
        assert!(pattern.matches("src/c/x"));
        assert!(!pattern.matches("src/d/x"));
    }

    #[test]
    fn test_rejects_bad_groups() {
        assert!(GlobPattern::new("src/{a,b").is_err());
        assert!(GlobPattern::new("!(foo)").is_err());
        assert!(GlobPattern::new("src/+(a|b").is_err());
    }

    #[test]
    fn test_long_pattern_is_rejected() {
        let pattern = format!("src/{}", "{a,b}".repeat(MAX_PATTERN_LEN / 5 + 1));
        match GlobPattern::new(&pattern) {
            Err(LabelerError::Pattern { message, .. }) => {
                assert!(message.contains("longer than"));
            }
            other => panic!("expected a pattern error, got {other:?}"),
        }
        assert_eq!(PatternSet::lenient([pattern.as_str(), "dist/**"]).len(), 1);
    }

    #[test]
    fn test_many_alternations_compile() {
        let pattern = glob(&"{a,b}".repeat(18));
        assert!(pattern.matches("abbabaabbabaabbaba"));
        assert!(!pattern.matches("abbabaabbabaabbab"));
        assert!(!pattern.matches("abbabaabbabaabbabc"));
    }

    #[test]
    fn test_extglob_repetition() {
        let pattern = glob("**/*.+(mocks|mock-data).ts");
        assert!(pattern.matches("a/x.mocksmocks.ts"));
        assert!(pattern.matches("a/x.mock-datamocks.ts"));
        assert!(!pattern.matches("a/x..ts"));

        let pattern = glob("build*(-[0-9]).log");
        assert!(pattern.matches("build.log"));
        assert!(pattern.matches("build-1-2-3.log"));
        assert!(!pattern.matches("build-x.log"));
    }

    #[test]
    fn test_classes_and_escapes() {
        assert!(glob("v[0-9].txt").matches("v3.txt"));
        assert!(!glob("v[!0-9].txt").matches("v3.txt"));
        assert!(glob("v[!0-9].txt").matches("vx.txt"));
        assert!(!glob("a[!x]b").matches("a/b"));
        assert!(glob(r"notes\*.md").matches("notes*.md"));
        assert!(!glob(r"notes\*.md").matches("notes1.md"));
        assert!(glob("a[b").matches("a[b"));
    }

    #[test]
    fn test_wildcards_skip_dot_segments() {
        assert!(!glob("*").matches(".env"));
        assert!(!glob("?env").matches(".env"));
        assert!(!glob("**/*.md").matches(".changeset/notes.md"));
        assert!(glob("**/.changeset/*.md").matches(".changeset/notes.md"));
        assert!(glob("src/*").matches("src/index.ts"));
    }

    #[test]
    fn test_directory_anchored_pattern() {
        let pattern = glob(".github/**");
        assert!(pattern.matches(".github/workflows/ci.yml"));
        assert!(pattern.matches(".github/CODEOWNERS"));
        assert!(!pattern.matches("src/.github/workflows/ci.yml"));
        assert!(!pattern.matches("github/workflows/ci.yml"));
    }

    #[test]
    fn test_basename_any_depth_pattern() {
        let pattern = glob("**/*.md");
        assert!(pattern.matches("README.md"));
        assert!(pattern.matches("docs/guide/intro.md"));
        assert!(!pattern.matches("README.MD"));
        assert!(!pattern.matches("src/readme.mdx"));
    }

    #[test]
    fn test_star_does_not_cross_separator() {
        let pattern = glob("*.lock");
        assert!(pattern.matches("yarn.lock"));
        assert!(!pattern.matches("packages/app/yarn.lock"));
    }

    #[test]
    fn test_extglob_patterns_match() {
        assert!(glob("**/*.+(mocks|mock-data).ts").matches("src/api/user.mocks.ts"));
        assert!(glob("**/*.+(mocks|mock-data).ts").matches("src/api/user.mock-data.ts"));
        assert!(!glob("**/*.+(mocks|mock-data).ts").matches("src/api/user.ts"));
        assert!(glob("**/*.test.ts?(x)").matches("src/components/Button.test.tsx"));
        assert!(glob("**/*.test.ts?(x)").matches("src/utils/date.test.ts"));
        assert!(glob("**/*.y?(a)ml").matches("config/app.yaml"));
        assert!(glob("**/*.y?(a)ml").matches("docker-compose.yml"));
    }

    #[test]
    fn test_server_only_pattern() {
        let pattern = glob("**/src/server/**");
        assert!(pattern.matches("src/server/db.ts"));
        assert!(pattern.matches("apps/api/src/server/routes/user.ts"));
        assert!(!pattern.matches("src/client/server.ts"));
    }

    #[test]
    fn test_pattern_set_matches_any() {
        let set = PatternSet::new(NON_DEPLOYMENT_GLOB_PATTERNS).unwrap();
        assert!(set.matches("docs/setup.txt"));
        assert!(set.matches(".husky/pre-commit"));
        assert!(set.matches("src/Button.story.tsx"));
        assert!(!set.matches("src/Button.tsx"));
    }

    #[test]
    fn test_matches_every_requires_non_empty() {
        let set = PatternSet::new(CHROMATIC_SKIP_GLOB_PATTERNS).unwrap();
        assert!(!set.matches_every(std::iter::empty()));
        assert!(set.matches_every(["README.md", ".github/workflows/ci.yml"]));
        assert!(!set.matches_every(["README.md", "src/App.tsx"]));
    }

    #[test]
    fn test_lenient_set_drops_invalid_patterns() {
        let set = PatternSet::lenient(["dist/**", "src/{broken"]);
        assert_eq!(set.len(), 1);
        assert!(set.matches("dist/bundle.js"));
    }

    #[test]
    fn test_display_lists_sources() {
        let set = PatternSet::new([".github/**", "**/*.md"]).unwrap();
        assert_eq!(set.to_string(), ".github/**, **/*.md");
    }
}
