//! Language model access
//!
//! The pipeline talks to a language model through [`LanguageModel`] only;
//! which backend sits behind it is never inspected.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;
use crate::models::{AggregatedAttraction, ConversationState, TripIntent};

pub mod openai;

pub use openai::OpenAiChatClient;

/// Answer meaning "no confident answer" in slot extraction
pub const UNKNOWN_ANSWER: &str = "unknown";

/// Everything the generation stage gets to see for one question
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub question: &'a str,
    pub conversation: &'a ConversationState,
    pub intent: &'a TripIntent,
    pub attractions: &'a [AggregatedAttraction],
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Single-shot completion for slot filling.
    ///
    /// With `use_history` the conversation history is sent along with the
    /// prompt, otherwise the prompt stands alone. Implementations answer
    /// [`UNKNOWN_ANSWER`] when the model response is unusable.
    async fn extract_slot(
        &self,
        prompt: &str,
        use_history: bool,
        conversation: &ConversationState,
    ) -> Result<String>;

    /// Generate the final answer, forwarding tokens to `tokens` while it is
    /// open. Returns the full text produced.
    async fn generate_streaming(
        &self,
        request: GenerationRequest<'_>,
        tokens: mpsc::Sender<String>,
    ) -> Result<String>;
}
