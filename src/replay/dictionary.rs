//! Word-list dictionary with longest-prefix matching.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::time::{Duration, sleep};

use crate::scan::{
    DictionaryEntry, LookupContext, LookupKind, LookupResult, LookupService, MatchDetails,
    MatchType, ScanError,
};

#[derive(Debug, Clone, Default)]
pub struct WordListDictionary {
    terms: HashMap<String, Vec<DictionaryEntry>>,
    longest_term: usize,
    latency: Duration,
}

impl WordListDictionary {
    pub fn new(entries: impl IntoIterator<Item = DictionaryEntry>) -> Self {
        let mut terms: HashMap<String, Vec<DictionaryEntry>> = HashMap::new();
        for entry in entries {
            terms.entry(entry.term.clone()).or_default().push(entry);
        }
        let longest_term = terms
            .keys()
            .map(|term| term.chars().count())
            .max()
            .unwrap_or(0);

        Self {
            terms,
            longest_term,
            latency: Duration::ZERO,
        }
    }

    /// Simulated time each lookup takes.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn len(&self) -> usize {
        self.terms.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn lookup(&self, text: &str, details: &MatchDetails) -> LookupResult {
        let chars: Vec<char> = text.chars().collect();
        match details.kind {
            LookupKind::Kanji => chars
                .first()
                .and_then(|c| self.terms.get(&c.to_string()))
                .map(|entries| LookupResult {
                    entries: entries.clone(),
                    consumed_length: 1,
                })
                .unwrap_or_default(),
            LookupKind::Terms => {
                for length in (1..=chars.len().min(self.longest_term)).rev() {
                    let prefix: String = chars[..length].iter().collect();
                    if let Some(entries) = self.terms.get(&prefix) {
                        return LookupResult {
                            entries: entries.clone(),
                            consumed_length: length,
                        };
                    }
                }
                if details.match_type == MatchType::Prefix && !text.is_empty() {
                    return self.prefix_matches(text, chars.len());
                }
                LookupResult::default()
            }
        }
    }

    fn prefix_matches(&self, text: &str, length: usize) -> LookupResult {
        let mut entries: Vec<DictionaryEntry> = self
            .terms
            .iter()
            .filter(|(term, _)| term.starts_with(text))
            .flat_map(|(_, entries)| entries.iter().cloned())
            .collect();
        entries.sort_by(|a, b| a.term.cmp(&b.term));
        let consumed_length = if entries.is_empty() { 0 } else { length };
        LookupResult {
            entries,
            consumed_length,
        }
    }
}

#[async_trait(?Send)]
impl LookupService for WordListDictionary {
    async fn find(
        &self,
        text: &str,
        details: &MatchDetails,
        _context: &LookupContext,
    ) -> Result<LookupResult, ScanError> {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        Ok(self.lookup(text, details))
    }
}
