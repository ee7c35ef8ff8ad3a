// src/ingest/classify.rs
//! Keyword heuristics for direction and magnitude.
//!
//! Word lists come from configuration; these are approximate signals, not a
//! calibrated classifier. Matching is case-insensitive substring matching so
//! "protect" also hits "protections".

use regex::Regex;

use crate::model::Direction;

/// Compiled "toward democratic norms" keyword set for one source.
#[derive(Debug, Clone)]
pub struct Classifier {
    re: Option<Regex>,
}

impl Classifier {
    /// Build from a word list. Empty list → every text classifies as autocratic.
    pub fn from_keywords<S: AsRef<str>>(words: &[S]) -> anyhow::Result<Self> {
        let alts: Vec<String> = words
            .iter()
            .map(|w| w.as_ref().trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();
        if alts.is_empty() {
            return Ok(Self { re: None });
        }
        let pattern = format!("(?i)(?:{})", alts.join("|"));
        let re = Regex::new(&pattern)
            .map_err(|e| anyhow::anyhow!("keyword regex error: {}", e))?;
        Ok(Self { re: Some(re) })
    }

    pub fn is_democratic(&self, text: &str) -> bool {
        self.re.as_ref().is_some_and(|re| re.is_match(text))
    }

    pub fn direction(&self, text: &str) -> Direction {
        Direction::from_flag(self.is_democratic(text))
    }
}

/// Magnitude tier from an action/type description.
///
/// final/enacted/signed/opinion → 3.0, vote/pass → 2.5,
/// introduced/hearing → 1.5, anything else → 1.0.
pub fn magnitude_from_action(kind: Option<&str>) -> f64 {
    let Some(kind) = kind else {
        return 1.0;
    };
    let k = kind.to_ascii_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| k.contains(w));

    if has(&["final", "enacted", "signed", "opinion"]) {
        3.0
    } else if has(&["vote", "pass"]) {
        2.5
    } else if has(&["introduced", "hearing"]) {
        1.5
    } else {
        1.0
    }
}
