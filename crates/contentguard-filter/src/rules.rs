//! Local rule set: sensitive words and regex patterns

use aho_corasick::{AhoCorasick, MatchKind};
use contentguard_core::{Error, Result};
use regex::Regex;
use std::collections::BTreeSet;

/// Which local rule rejected the content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleMatch {
    /// Lower-cased sensitive word found in the content
    Word(String),
    /// Source of the first matching pattern
    Pattern(String),
}

/// Sensitive words plus an ordered list of compiled patterns
#[derive(Debug, Default)]
pub struct LocalRules {
    words: BTreeSet<String>,
    matcher: Option<AhoCorasick>,
    patterns: Vec<Regex>,
}

impl LocalRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add words (lower-cased, blanks ignored) to the existing set.
    ///
    /// Returns how many were new.
    pub fn add_words<I, S>(&mut self, words: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.words.len();
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() {
                self.words.insert(word);
            }
        }

        let added = self.words.len() - before;
        if added > 0 {
            self.rebuild_matcher()?;
        }
        Ok(added)
    }

    fn rebuild_matcher(&mut self) -> Result<()> {
        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&self.words)
            .map_err(|e| Error::internal(format!("Failed to build word matcher: {}", e)))?;
        self.matcher = Some(matcher);
        Ok(())
    }

    /// Compile and append a pattern; the list is unchanged on error
    pub fn add_pattern(&mut self, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::validation(format!("invalid regex pattern: {}", e)))?;
        self.patterns.push(regex);
        Ok(())
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// First matching word (leftmost in the content), else first matching pattern
    pub fn check(&self, content: &str) -> Option<RuleMatch> {
        self.check_words(content).or_else(|| self.check_patterns(content))
    }

    pub fn check_words(&self, content: &str) -> Option<RuleMatch> {
        let matcher = self.matcher.as_ref()?;
        let lowered = content.to_lowercase();
        matcher
            .find(&lowered)
            .map(|m| RuleMatch::Word(lowered[m.start()..m.end()].to_string()))
    }

    pub fn check_patterns(&self, content: &str) -> Option<RuleMatch> {
        self.patterns
            .iter()
            .find(|p| p.is_match(content))
            .map(|p| RuleMatch::Pattern(p.as_str().to_string()))
    }
}
