//! Trip intent extraction
//!
//! Destination and stay duration are filled from three independent language
//! model answers:
//! 1. the latest destination mentioned anywhere in the conversation,
//! 2. the latest stay duration mentioned anywhere in the conversation,
//! 3. the single city named in the current question alone, if any.
//!
//! A usable answer to (3) overrides (1), so an explicit city in the new
//! question beats a stale destination from earlier turns, while pronouns like
//! "there" still resolve through the history-aware answer.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::Result;
use crate::llm::{LanguageModel, UNKNOWN_ANSWER};
use crate::models::{ConversationState, TripIntent};

const DESTINATION_PROMPT: &str = "\
Based on our conversation so far, which city is the latest travel destination the \
user mentioned? Answer with the bare city name only, a single word without any other \
text. If you are not certain, answer exactly: unknown";

const DURATION_PROMPT: &str = "\
Based on our conversation so far, for how many days does the user most recently say \
they will stay? Answer with a single integer only, without any other text. If you are \
not certain, answer exactly: unknown";

const MENTION_PROMPT: &str = "\
Does the following message mention exactly one city name? If it does, answer with \
that city name only, a single word without any other text. If it mentions no city or \
more than one city, answer exactly: unknown";

/// Raw answers of the three extraction queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentSignals {
    /// History-aware latest destination
    pub destination: Option<String>,
    /// History-aware latest stay duration
    pub duration: Option<String>,
    /// History-free single city in the current question
    pub mention: Option<String>,
}

impl IntentSignals {
    /// Combine the three answers into a trip intent
    #[must_use]
    pub fn reconcile(&self) -> TripIntent {
        let mention = usable_city(self.mention.as_deref());
        let destination = mention.or_else(|| usable_city(self.destination.as_deref()));

        let Some(destination) = destination else {
            return TripIntent::unresolved();
        };

        let stay_duration_days = usable_duration(self.duration.as_deref()).unwrap_or(0);
        TripIntent::new(destination, stay_duration_days)
    }
}

/// Fills trip intent slots from a conversation
pub struct TripIntentExtractor {
    llm: Arc<dyn LanguageModel>,
}

impl TripIntentExtractor {
    #[must_use]
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Extract destination and stay duration for `question`
    #[instrument(skip(self, question, conversation), fields(session_id = %conversation.session_id))]
    pub async fn extract(
        &self,
        question: &str,
        conversation: &ConversationState,
    ) -> Result<TripIntent> {
        let signals = self.collect_signals(question, conversation).await?;
        debug!(?signals, "Collected intent signals");

        let intent = signals.reconcile();
        debug!(?intent, "Reconciled trip intent");
        Ok(intent)
    }

    /// Issue the three queries concurrently; all must succeed
    pub async fn collect_signals(
        &self,
        question: &str,
        conversation: &ConversationState,
    ) -> Result<IntentSignals> {
        let destination_prompt = with_question(DESTINATION_PROMPT, question);
        let duration_prompt = with_question(DURATION_PROMPT, question);
        let mention_prompt = format!("{MENTION_PROMPT}\n\nMessage: {question}");

        let (destination, duration, mention) = futures::future::try_join3(
            self.llm.extract_slot(&destination_prompt, true, conversation),
            self.llm.extract_slot(&duration_prompt, true, conversation),
            self.llm.extract_slot(&mention_prompt, false, conversation),
        )
        .await?;

        Ok(IntentSignals {
            destination: Some(destination),
            duration: Some(duration),
            mention: Some(mention),
        })
    }
}

fn with_question(prompt: &str, question: &str) -> String {
    format!("The user's latest message is: {question}\n\n{prompt}")
}

/// Strip whitespace and wrapping quotes or periods models like to add
fn normalize(answer: &str) -> &str {
    answer
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '.' | '`'))
        .trim()
}

fn is_sentinel(answer: &str) -> bool {
    answer.eq_ignore_ascii_case(UNKNOWN_ANSWER)
}

/// A city answer is usable when it is one alphabetic word other than the sentinel
#[must_use]
pub fn usable_city(answer: Option<&str>) -> Option<String> {
    let candidate = normalize(answer?);
    let usable = !candidate.is_empty()
        && !is_sentinel(candidate)
        && candidate.chars().all(char::is_alphabetic);
    usable.then(|| candidate.to_string())
}

/// A duration answer is usable when it is all decimal digits and fits `u32`.
///
/// Persian and Arabic-Indic digits count as digits.
#[must_use]
pub fn usable_duration(answer: Option<&str>) -> Option<u32> {
    let candidate = normalize(answer?);
    if candidate.is_empty() || is_sentinel(candidate) {
        return None;
    }
    candidate.chars().try_fold(0u32, |days, c| {
        let digit = ascii_digit(c)?.to_digit(10)?;
        days.checked_mul(10)?.checked_add(digit)
    })
}

/// Map a decimal digit of a supported script to its ASCII form
fn ascii_digit(c: char) -> Option<char> {
    let offset = match c {
        '0'..='9' => return Some(c),
        '\u{0660}'..='\u{0669}' => u32::from(c) - 0x0660,
        '\u{06F0}'..='\u{06F9}' => u32::from(c) - 0x06F0,
        _ => return None,
    };
    char::from_digit(offset, 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TravelAdviserError;
    use crate::llm::GenerationRequest;
    use async_trait::async_trait;
    use rstest::rstest;
    use tokio::sync::mpsc;

    fn signals(destination: &str, duration: &str, mention: &str) -> IntentSignals {
        IntentSignals {
            destination: Some(destination.to_string()),
            duration: Some(duration.to_string()),
            mention: Some(mention.to_string()),
        }
    }

    #[test]
    fn test_current_question_overrides_history() {
        let intent = signals("Tehran", "3", "Isfahan").reconcile();
        assert_eq!(intent.destination_city.as_deref(), Some("Isfahan"));
        assert_eq!(intent.stay_duration_days, 3);
    }

    #[test]
    fn test_history_destination_used_when_mention_unknown() {
        let intent = signals("Tehran", "unknown", "unknown").reconcile();
        assert_eq!(intent.destination_city.as_deref(), Some("Tehran"));
        assert_eq!(intent.stay_duration_days, 0);
    }

    #[test]
    fn test_unusable_destination_resolves_to_nothing() {
        let intent = signals("unknown", "4", "New York").reconcile();
        assert_eq!(intent, TripIntent::unresolved());
    }

    #[test]
    fn test_mention_fills_unusable_history_destination() {
        let intent = signals("unknown", "2", "Yazd").reconcile();
        assert_eq!(intent, TripIntent::new("Yazd", 2));
    }

    #[test]
    fn test_persian_answers_reconcile() {
        let intent = signals("شیراز", "۳", "unknown").reconcile();
        assert_eq!(intent, TripIntent::new("شیراز", 3));
    }

    #[test]
    fn test_missing_signals_resolve_to_nothing() {
        assert_eq!(IntentSignals::default().reconcile(), TripIntent::unresolved());
    }

    #[rstest]
    #[case(Some("Shiraz"), Some("Shiraz"))]
    #[case(Some("  Shiraz\n"), Some("Shiraz"))]
    #[case(Some("\"Tabriz\"."), Some("Tabriz"))]
    #[case(Some("شیراز"), Some("شیراز"))]
    #[case(Some("unknown"), None)]
    #[case(Some("Unknown"), None)]
    #[case(Some("New York"), None)]
    #[case(Some("Kish2"), None)]
    #[case(Some("The city is Yazd"), None)]
    #[case(Some(""), None)]
    #[case(None, None)]
    fn test_usable_city(#[case] answer: Option<&str>, #[case] expected: Option<&str>) {
        assert_eq!(usable_city(answer).as_deref(), expected);
    }

    #[rstest]
    #[case(Some("3"), Some(3))]
    #[case(Some(" 10 "), Some(10))]
    #[case(Some("0"), Some(0))]
    #[case(Some("unknown"), None)]
    #[case(Some("three"), None)]
    #[case(Some("3 days"), None)]
    #[case(Some("-2"), None)]
    #[case(Some("99999999999"), None)]
    #[case(Some("۳"), Some(3))]
    #[case(Some("۱۰"), Some(10))]
    #[case(Some("٢"), Some(2))]
    #[case(Some("½"), None)]
    #[case(None, None)]
    fn test_usable_duration(#[case] answer: Option<&str>, #[case] expected: Option<u32>) {
        assert_eq!(usable_duration(answer), expected);
    }

    /// Answers by prompt kind and records whether history was requested
    struct KeywordModel {
        destination: &'static str,
        duration: &'static str,
        mention: &'static str,
    }

    #[async_trait]
    impl LanguageModel for KeywordModel {
        async fn extract_slot(
            &self,
            prompt: &str,
            use_history: bool,
            _conversation: &ConversationState,
        ) -> Result<String> {
            let answer = if prompt.contains(MENTION_PROMPT) {
                assert!(!use_history, "mention query must not use history");
                self.mention
            } else if prompt.contains(DURATION_PROMPT) {
                assert!(use_history);
                self.duration
            } else {
                assert!(use_history);
                self.destination
            };
            Ok(answer.to_string())
        }

        async fn generate_streaming(
            &self,
            _request: GenerationRequest<'_>,
            _tokens: mpsc::Sender<String>,
        ) -> Result<String> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_extract_routes_prompts_to_signals() {
        let extractor = TripIntentExtractor::new(Arc::new(KeywordModel {
            destination: "Tehran",
            duration: "4",
            mention: "unknown",
        }));
        let conversation = ConversationState::new("session-1");
        let intent = extractor
            .extract("What should I see there?", &conversation)
            .await
            .unwrap();
        assert_eq!(intent, TripIntent::new("Tehran", 4));
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        async fn extract_slot(
            &self,
            _prompt: &str,
            _use_history: bool,
            _conversation: &ConversationState,
        ) -> Result<String> {
            Err(TravelAdviserError::llm("connection reset"))
        }

        async fn generate_streaming(
            &self,
            _request: GenerationRequest<'_>,
            _tokens: mpsc::Sender<String>,
        ) -> Result<String> {
            Err(TravelAdviserError::llm("connection reset"))
        }
    }

    #[tokio::test]
    async fn test_extract_propagates_collaborator_failure() {
        let extractor = TripIntentExtractor::new(Arc::new(FailingModel));
        let result = extractor
            .extract("Trip to Shiraz", &ConversationState::new("session-2"))
            .await;
        assert!(matches!(result.unwrap_err(), TravelAdviserError::Llm { .. }));
    }
}
