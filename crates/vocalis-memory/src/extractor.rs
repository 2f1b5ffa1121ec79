// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic extraction of memory-worthy spans from conversation turns.
//!
//! A turn is split into sentence spans. Each span is scored by summing the
//! weights of the personal-detail markers it contains, clamped to [0, 1]:
//!
//! | Marker                                      | Weight |
//! |---------------------------------------------|--------|
//! | first-person pronoun (`I`, `my`, `we` ...)   | +0.30  |
//! | autobiographical phrase (`grew up`, `passed away` ...) | +0.30 |
//! | family member or pet (`mother`, `dog` ...)   | +0.20  |
//! | temporal anchor (`last`, `ago`, a year ...)  | +0.15  |
//! | proper noun after the first word            | +0.15  |
//! | answers a question the avatar just asked    | +0.10  |
//! | span is itself a question                   | -0.30  |
//!
//! Spans with fewer than three words score zero. Only user turns are
//! scored; avatar turns are context. The extractor never touches storage.

use tracing::debug;
use vocalis_core::{ConversationTurn, Speaker};

use crate::types::FragmentCandidate;

const FIRST_PERSON_WEIGHT: f32 = 0.30;
const AUTOBIOGRAPHICAL_WEIGHT: f32 = 0.30;
const RELATION_WEIGHT: f32 = 0.20;
const TEMPORAL_WEIGHT: f32 = 0.15;
const PROPER_NOUN_WEIGHT: f32 = 0.15;
const ANSWER_WEIGHT: f32 = 0.10;
const QUESTION_PENALTY: f32 = 0.30;
const MIN_WORDS: usize = 3;

const FIRST_PERSON: &[&str] = &[
    "i", "i'm", "i've", "i'd", "i'll", "me", "my", "mine", "myself", "we", "we're", "we've",
    "our", "ours", "us",
];

const AUTOBIOGRAPHICAL: &[&str] = &[
    "grew up",
    "was born",
    "were born",
    "passed away",
    "used to",
    "remember",
    "married",
    "my name is",
    "i live",
    "i lived",
    "worked as",
    "work as",
    "retired",
    "favorite",
    "favourite",
    "graduated",
    "moved to",
    "died",
    "miss",
    "loved",
    "love",
    "always",
];

const RELATIONS: &[&str] = &[
    "mother", "father", "mom", "mum", "dad", "wife", "husband", "son", "daughter", "brother",
    "sister", "grandma", "grandpa", "grandmother", "grandfather", "grandson", "granddaughter",
    "aunt", "uncle", "cousin", "children", "kids", "family", "friend", "dog", "cat", "pet",
    "puppy", "horse",
];

const TEMPORAL: &[&str] = &[
    "last",
    "ago",
    "years",
    "when i was",
    "childhood",
    "yesterday",
    "birthday",
    "anniversary",
    "spring",
    "summer",
    "autumn",
    "fall",
    "winter",
    "christmas",
];

/// Words that start with a capital letter without being names.
const NON_NAMES: &[&str] = &["i", "i'm", "i've", "i'd", "i'll"];

/// Scores spans of user turns and emits those at or above a threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentExtractor;

impl FragmentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Candidate fragments from `turn`, tagged with the turn's own scope.
    ///
    /// `context` holds the preceding turns, oldest first. It only influences
    /// scoring; its scopes are never consulted.
    pub fn extract(
        &self,
        turn: &ConversationTurn,
        context: &[ConversationTurn],
        threshold: f32,
    ) -> Vec<FragmentCandidate> {
        if turn.speaker != Speaker::User {
            return vec![];
        }

        let answers_question = context
            .last()
            .is_some_and(|prev| prev.speaker == Speaker::Avatar && prev.text.trim_end().ends_with('?'));

        let candidates: Vec<FragmentCandidate> = split_spans(&turn.text)
            .into_iter()
            .filter_map(|span| {
                let mut score = score_span(span);
                if score > 0.0 && answers_question {
                    score = (score + ANSWER_WEIGHT).min(1.0);
                }
                (score >= threshold && score > 0.0).then(|| FragmentCandidate {
                    text: span.to_string(),
                    score,
                    scope: turn.scope.clone(),
                    turn_id: turn.id.clone(),
                    extracted_at: turn.timestamp,
                })
            })
            .collect();

        debug!(
            turn_id = %turn.id,
            avatar_id = %turn.scope.avatar_id,
            user_id = %turn.scope.user_id,
            candidates = candidates.len(),
            "extracted fragment candidates"
        );
        candidates
    }
}

/// Splits text at newlines and at `.`, `!`, `?` followed by whitespace or end of text.
fn split_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        let terminal = matches!(ch, '.' | '!' | '?')
            && chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if terminal || ch == '\n' {
            let end = idx + ch.len_utf8();
            let span = text[start..end].trim();
            if !span.is_empty() {
                spans.push(span);
            }
            start = end;
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        spans.push(rest);
    }
    spans
}

fn normalize_word(word: &str) -> String {
    word.replace('\u{2019}', "'")
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .to_lowercase()
}

/// Memory-worthiness of a single span in [0, 1].
pub fn score_span(span: &str) -> f32 {
    let raw_words: Vec<&str> = span.split_whitespace().collect();
    if raw_words.len() < MIN_WORDS {
        return 0.0;
    }
    let words: Vec<String> = raw_words.iter().map(|w| normalize_word(w)).collect();
    // Padded so phrase lookups match whole words only.
    let joined = format!(" {} ", words.join(" "));
    let has_any = |list: &[&str]| list.iter().any(|m| joined.contains(&format!(" {m} ")));

    let mut score = 0.0;
    if words.iter().any(|w| FIRST_PERSON.contains(&w.as_str())) {
        score += FIRST_PERSON_WEIGHT;
    }
    if has_any(AUTOBIOGRAPHICAL) {
        score += AUTOBIOGRAPHICAL_WEIGHT;
    }
    if has_any(RELATIONS) {
        score += RELATION_WEIGHT;
    }
    if has_any(TEMPORAL) || words.iter().any(|w| is_year(w)) {
        score += TEMPORAL_WEIGHT;
    }
    if raw_words.iter().skip(1).any(|w| is_proper_noun(w)) {
        score += PROPER_NOUN_WEIGHT;
    }
    if span.trim_end().ends_with('?') {
        score -= QUESTION_PENALTY;
    }
    score.clamp(0.0, 1.0)
}

fn is_year(word: &str) -> bool {
    word.len() == 4
        && word.chars().all(|c| c.is_ascii_digit())
        && (word.starts_with("19") || word.starts_with("20"))
}

fn is_proper_noun(raw: &str) -> bool {
    let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
    trimmed.chars().next().is_some_and(char::is_uppercase)
        && !NON_NAMES.contains(&normalize_word(trimmed).as_str())
}
