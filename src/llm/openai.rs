use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use super::{GenerationRequest, LanguageModel, UNKNOWN_ANSWER};
use crate::config::LlmConfig;
use crate::models::{ChatMessage, ChatRole, ConversationState};
use crate::{Result, TravelAdviserError};

const ADVISER_SYSTEM_PROMPT: &str = "\
You are a smart travel adviser who helps users plan their trips. Users may ask \
about sights, itineraries, sightseeing suggestions and local activities. Based on \
the destination and the length of the stay, prepare a detailed day-by-day schedule \
as a table with the columns: day, time, place/activity, notes. Only use the \
attractions provided to you; do not invent places that are not listed.";

/// Client for OpenAI-compatible chat completion endpoints
pub struct OpenAiChatClient {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

/// One parsed line of a streamed completion
#[derive(Debug, PartialEq)]
enum StreamEvent {
    Token(String),
    Done,
    Skip,
}

impl OpenAiChatClient {
    /// Create a new client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(concat!("travel-adviser/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TravelAdviserError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}{}", config.api_base.trim_end_matches('/'), config.path),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
        })
    }

    fn post(&self, body: &Value) -> RequestBuilder {
        let request = self.client.post(&self.url).json(body);
        match &self.api_key {
            Some(api_key) => request.bearer_auth(api_key),
            None => request,
        }
    }

    async fn send(&self, body: &Value) -> Result<Response> {
        let response = self
            .post(body)
            .send()
            .await
            .map_err(|e| TravelAdviserError::llm(format!("Chat completion request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TravelAdviserError::llm(format!(
                "Chat completion endpoint returned {status}: {error_text}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    #[instrument(
        level = "debug",
        skip(self, prompt, conversation),
        fields(session_id = %conversation.session_id)
    )]
    async fn extract_slot(
        &self,
        prompt: &str,
        use_history: bool,
        conversation: &ConversationState,
    ) -> Result<String> {
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": slot_messages(prompt, use_history, conversation),
        });

        let json: Value = self
            .send(&body)
            .await?
            .json()
            .await
            .map_err(|e| TravelAdviserError::llm(format!("Failed to read completion: {e}")))?;

        match completion_content(&json) {
            Some(content) => Ok(content.trim().to_string()),
            None => {
                warn!("Completion response has no message content; treating as unknown");
                Ok(UNKNOWN_ANSWER.to_string())
            }
        }
    }

    #[instrument(level = "debug", skip_all, fields(session_id = %request.conversation.session_id))]
    async fn generate_streaming(
        &self,
        request: GenerationRequest<'_>,
        tokens: mpsc::Sender<String>,
    ) -> Result<String> {
        let evidence = serde_json::to_string(request.attractions)
            .map_err(|e| TravelAdviserError::general(format!("Failed to encode evidence: {e}")))?;

        let mut messages = vec![
            json!({ "role": "system", "content": ADVISER_SYSTEM_PROMPT }),
            json!({
                "role": "system",
                "content": format!(
                    "Answer the question using the following results as your knowledge: {evidence}"
                ),
            }),
        ];
        if let Some(destination) = &request.intent.destination_city {
            messages.push(json!({
                "role": "system",
                "content": format!(
                    "The user is planning a {}-day trip to {destination}.",
                    request.intent.stay_duration_days
                ),
            }));
        }
        messages.extend(history_messages(&request.conversation.history));
        messages.push(json!({
            "role": "user",
            "content": format!("Question: {}", request.question),
        }));

        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "stream": true,
            "messages": messages,
        });

        let mut response = self.send(&body).await?;
        let mut pending: Vec<u8> = Vec::new();
        let mut output = String::new();

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TravelAdviserError::llm(format!("Completion stream failed: {e}")))?
        {
            pending.extend_from_slice(&chunk);

            while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=newline).collect();
                match parse_stream_line(String::from_utf8_lossy(&line).trim()) {
                    StreamEvent::Token(token) => {
                        output.push_str(&token);
                        if tokens.send(token).await.is_err() {
                            debug!("Token receiver dropped, stopping generation");
                            return Ok(output);
                        }
                    }
                    StreamEvent::Done => return Ok(output),
                    StreamEvent::Skip => {}
                }
            }
        }

        Ok(output)
    }
}

/// Chat messages for one extraction query; history only when requested
fn slot_messages(prompt: &str, use_history: bool, conversation: &ConversationState) -> Vec<Value> {
    let mut messages = Vec::new();
    if use_history {
        messages.extend(history_messages(&conversation.history));
    }
    messages.push(json!({ "role": "user", "content": prompt }));
    messages
}

fn history_messages(history: &[ChatMessage]) -> impl Iterator<Item = Value> + '_ {
    history.iter().map(|message| {
        let role = match message.role {
            ChatRole::Human => "user",
            ChatRole::Ai => "assistant",
        };
        json!({ "role": role, "content": message.content })
    })
}

fn completion_content(json: &Value) -> Option<&str> {
    json.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
}

fn parse_stream_line(line: &str) -> StreamEvent {
    let Some(data) = line.strip_prefix("data:") else {
        return StreamEvent::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return StreamEvent::Done;
    }

    let Ok(json) = serde_json::from_str::<Value>(data) else {
        warn!("Skipping malformed stream chunk");
        return StreamEvent::Skip;
    };

    json.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(|c| c.as_str())
        .filter(|token| !token.is_empty())
        .map_or(StreamEvent::Skip, |token| StreamEvent::Token(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_choice_content() {
        let json = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Isfahan" } }
            ]
        });
        assert_eq!(completion_content(&json), Some("Isfahan"));
    }

    #[test]
    fn test_missing_content_is_none() {
        assert_eq!(completion_content(&json!({ "choices": [] })), None);
        assert_eq!(completion_content(&json!({ "error": "overloaded" })), None);
    }

    #[test]
    fn test_parse_stream_lines() {
        assert_eq!(
            parse_stream_line(r#"data: {"choices":[{"delta":{"content":"Day 1"}}]}"#),
            StreamEvent::Token("Day 1".to_string())
        );
        assert_eq!(
            parse_stream_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            StreamEvent::Skip
        );
        assert_eq!(parse_stream_line("data: [DONE]"), StreamEvent::Done);
        assert_eq!(parse_stream_line(": keep-alive"), StreamEvent::Skip);
        assert_eq!(parse_stream_line(""), StreamEvent::Skip);
    }

    #[test]
    fn test_history_roles_are_mapped() {
        let history = vec![ChatMessage::human("I want to visit Shiraz"), ChatMessage::ai("Great!")];
        let roles: Vec<String> = history_messages(&history)
            .map(|m| m["role"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(roles, vec!["user", "assistant"]);
    }

    fn conversation() -> ConversationState {
        ConversationState::new("session-1").with_history(vec![
            ChatMessage::human("I will spend 3 days in Shiraz"),
            ChatMessage::ai("Shiraz is lovely in spring."),
        ])
    }

    #[test]
    fn test_slot_messages_with_history() {
        let messages = slot_messages("Which city?", true, &conversation());
        let roles: Vec<&str> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(messages[2]["content"], "Which city?");
    }

    #[test]
    fn test_slot_messages_without_history_send_prompt_only() {
        let messages = slot_messages("Which city is named here?", false, &conversation());
        assert_eq!(
            messages,
            vec![json!({ "role": "user", "content": "Which city is named here?" })]
        );
    }

    #[test]
    fn test_client_url_joins_base_and_path() {
        let config = LlmConfig {
            api_base: "http://localhost:11434/v1/".to_string(),
            ..LlmConfig::default()
        };
        let client = OpenAiChatClient::new(&config).unwrap();
        assert_eq!(client.url, "http://localhost:11434/v1/chat/completions");
    }
}
