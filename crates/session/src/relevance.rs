//! Keyword-based relevance gating.
//!
//! A prompt is allowed when it contains, as a whole word or phrase, any
//! keyword from any configured language. Matching is case-insensitive and
//! Unicode-aware, and never touches the network.

use std::collections::BTreeMap;

use palaver_config::RelevanceConfig;
use regex::Regex;
use tracing::debug;

/// One compiled alternation per language.
#[derive(Debug, Clone)]
struct LanguageRule {
    language: String,
    pattern: Regex,
}

/// Decides whether free text falls inside the allowed topic domain.
#[derive(Debug, Clone)]
pub struct RelevanceClassifier {
    rules: Vec<LanguageRule>,
}

impl RelevanceClassifier {
    /// Compile a classifier from a language → keywords mapping.
    ///
    /// Blank keywords are ignored, and so are languages left with none.
    pub fn new(keywords: &BTreeMap<String, Vec<String>>) -> Result<Self, regex::Error> {
        let mut rules = Vec::with_capacity(keywords.len());

        for (language, words) in keywords {
            let alternatives: Vec<String> = words
                .iter()
                .filter(|w| !w.trim().is_empty())
                .map(|w| keyword_pattern(w))
                .collect();

            if alternatives.is_empty() {
                continue;
            }

            // A keyword must not touch another word character on either side.
            let source = format!(r"(?i)(?:^|\W)(?:{})(?:\W|$)", alternatives.join("|"));
            rules.push(LanguageRule {
                language: language.clone(),
                pattern: Regex::new(&source)?,
            });
        }

        debug!(languages = rules.len(), "Compiled relevance classifier");
        Ok(Self { rules })
    }

    /// Build the classifier described by `config`, or `None` when gating is off.
    pub fn from_config(config: &RelevanceConfig) -> Result<Option<Self>, regex::Error> {
        if !config.enabled {
            return Ok(None);
        }
        Self::new(&config.keywords).map(Some)
    }

    /// Whether `text` mentions any allowed keyword.
    pub fn is_allowed(&self, text: &str) -> bool {
        self.matched_language(text).is_some()
    }

    /// The first language (in tag order) whose keyword list matches `text`.
    pub fn matched_language(&self, text: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(text))
            .map(|rule| rule.language.as_str())
    }

    /// Recognized language tags, in order.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.language.as_str())
    }
}

/// Escape a keyword; internal whitespace matches any whitespace run.
fn keyword_pattern(keyword: &str) -> String {
    keyword
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}
