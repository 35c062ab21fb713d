//! Banned-phrase filter
//!
//! Pure, case-insensitive substring filter over the configured phrase
//! set. Phrases are lower-cased once at construction; matching has no
//! word-boundary semantics.

/// Case-insensitive banned-phrase filter
///
/// Immutable for the server's lifetime.
#[derive(Debug, Clone)]
pub struct BannedPhraseFilter {
    phrases: Vec<String>,
}

impl BannedPhraseFilter {
    /// Build a filter from configured phrases.
    ///
    /// Phrases are trimmed, lower-cased and deduplicated; empty entries
    /// are dropped so no phrase can match every message.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lowered: Vec<String> = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        lowered.sort();
        lowered.dedup();
        Self { phrases: lowered }
    }

    /// Check whether a message contains any banned phrase.
    ///
    /// Lower-cases the message and tests substring containment against
    /// each stored phrase, returning true on the first match.
    pub fn is_banned(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        self.phrases.iter().any(|p| lowered.contains(p))
    }

    /// The stored phrases, lower-cased and sorted
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}
