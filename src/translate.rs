//! Free-text to rule-language translation through a chat-completions API.
//!
//! The service is asked to answer with a JSON object holding a single string
//! field, `rules`, whose value is newline-separated rule-language text.

use crate::error::{Error, Result};
use crate::fetch::{HttpRequest, ResilientFetcher};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, info};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Grammar description sent with every request.
pub const INSTRUCTION: &str = "\
You convert a player's description of Wordle clues into a rule language.
Answer with a JSON object of the form {\"rules\": \"<rules>\"} where <rules> is
newline-separated lines, each one of:
<LETTER> AT <POSITION>                      the letter is fixed at a 1-based position (1-9)
<LETTER> IN WORD                            the letter is in the word, position unknown
<LETTER> IN WORD, NOT AT <POS>, <POS>, ...  the letter is in the word but not at these positions
NO <LETTER>, <LETTER>, ...                  these letters are not in the word
LENGTH: <N>                                 the word has N letters (default 5)
Use upper-case letters. Output nothing except the JSON object.";

#[derive(Debug, Deserialize)]
struct RulesPayload {
    rules: String,
}

/// Client for the translation service.
#[derive(Clone)]
pub struct Translator {
    fetcher: ResilientFetcher,
    endpoint: String,
    model: String,
    api_key: String,
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Translator {
    pub fn new(
        fetcher: ResilientFetcher,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Translate `text` into rule-language text.
    pub fn translate(&self, text: &str) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration("translation API key is not set".to_string()));
        }
        if text.trim().is_empty() {
            return Err(Error::Configuration("no constraint text provided".to_string()));
        }

        let body = json!({
            "model": self.model,
            "temperature": 0,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": INSTRUCTION },
                { "role": "user", "content": text }
            ]
        });
        let request = HttpRequest::post_json(&self.endpoint, &body)
            .header("authorization", format!("Bearer {}", self.api_key));

        info!(model = %self.model, "requesting rule translation");
        let response = self.fetcher.fetch(&request)?;
        let rules = parse_completion(&response.body)?;
        debug!(%rules, "translated rules");
        Ok(rules)
    }
}

/// Pull the rule text out of a chat-completions response body.
pub fn parse_completion(body: &str) -> Result<String> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("response is not JSON: {}", e)))?;

    let content = json
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Parse("response has no message content".to_string()))?;

    parse_rules_payload(content)
}

/// Decode the `{"rules": "..."}` object the model is instructed to return.
pub fn parse_rules_payload(content: &str) -> Result<String> {
    let payload: RulesPayload = serde_json::from_str(content.trim())
        .map_err(|e| Error::Parse(format!("message content is not a rules object: {}", e)))?;
    Ok(payload.rules)
}
