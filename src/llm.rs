//! Language-model capability used by the clause analyzer.
//!
//! The core only needs "given an instruction template and named values,
//! return text". Templates use `{name}` placeholders; [`render_template`]
//! substitutes them and rejects placeholders with no value, so a typo in a
//! prompt fails loudly instead of sending a literal `{clause_txt}` upstream.
//!
//! | Provider | Endpoint | Notes |
//! |----------|----------|-------|
//! | `disabled` | none | every call fails; all chunks are skipped |
//! | `openai` | `{url}/chat/completions` | any OpenAI-compatible API (OpenRouter, vLLM, ...) |
//! | `ollama` | `{url}/api/chat` | local models, no key |
//!
//! Calls are not retried. The analyzer treats a failed call as a skipped
//! chunk.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    /// Send a fully rendered prompt and return the model's text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Render `template` with `vars` and send it.
    async fn ask(&self, template: &str, vars: &BTreeMap<&str, String>) -> Result<String> {
        let prompt = render_template(template, vars)?;
        let answer = self.complete(&prompt).await?;
        Ok(answer.trim().to_string())
    }
}

/// Substitute `{name}` placeholders.
///
/// A brace that does not open an identifier followed by `}` is copied
/// through unchanged.
pub fn render_template(template: &str, vars: &BTreeMap<&str, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if name_len > 0 && after[name_len..].starts_with('}') {
            let name = &after[..name_len];
            match vars.get(name) {
                Some(value) => out.push_str(value),
                None => bail!("template placeholder {{{}}} has no value", name),
            }
            rest = &after[name_len + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Create the language model selected by `[llm].provider`.
pub fn create_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledModel)),
        "openai" => Ok(Arc::new(OpenAiChat::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaChat::new(config)?)),
        other => bail!(
            "Unknown LLM provider: '{}'. Supported: disabled, openai, ollama",
            other
        ),
    }
}

/// HTTP client with a whole-request deadline of `timeout_secs`; 0 means none.
pub(crate) fn http_client(timeout_secs: u64) -> Result<Client> {
    let mut builder = Client::builder();
    if timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }
    builder.build().context("failed to build HTTP client")
}

// ============ Disabled ============

/// Placeholder model for running without a configured LLM.
pub struct DisabledModel;

#[async_trait]
impl LanguageModel for DisabledModel {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("language model is disabled; set [llm].provider to enable clause analysis")
    }
}

// ============ OpenAI-compatible ============

pub struct OpenAiChat {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("{} environment variable not set", config.api_key_env))?;
        let base_url = config
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            api_key,
            temperature: config.temperature,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for OpenAiChat {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.trim()))
            .json(&body)
            .send()
            .await
            .context("failed to call chat completions")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("chat completions returned {}: {}", status, text);
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .context("failed to parse chat completions response")?;
        parse_chat_choices(parsed)
    }
}

fn parse_chat_choices(parsed: ChatResponse) -> Result<String> {
    match parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
    {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => bail!("model returned an empty answer"),
    }
}

// ============ Ollama ============

pub struct OllamaChat {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
}

impl OllamaChat {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            url: config
                .url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            temperature: config.temperature,
        })
    }
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: AssistantMessage,
}

#[async_trait]
impl LanguageModel for OllamaChat {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = OllamaChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };

        let resp = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&body)
            .send()
            .await
            .context("failed to call Ollama chat")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("Ollama returned {}: {}", status, text);
        }

        let parsed: OllamaChatResponse = resp
            .json()
            .await
            .context("failed to parse Ollama chat response")?;
        match parsed.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => bail!("model returned an empty answer"),
        }
    }
}
