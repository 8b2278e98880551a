//! Natural-language to shell-command translation.
//!
//! When direct execution fails, the user's input is sent to the DeepSeek
//! chat-completions endpoint together with the platform dialect and working
//! directory, and the first completion is taken as the proposed command.
//! One request per fallback attempt; there are no retries and no caching.

use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::platform::PlatformKind;
use crate::providers::{EnvProvider, SystemEnv};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding the API credential.
pub const API_KEY_VAR: &str = "DEEPSEEK_API_KEY";

const API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
const MODEL: &str = "deepseek-chat";
const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f64 = 0.3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const SYSTEM_PROMPT: &str = "You are a top-tier shell command expert who \
translates natural language precisely into single-line shell commands for a \
specific operating system.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Trait for translating a natural-language request into a command line.
///
/// The interactive loop depends on this trait rather than on the concrete
/// API client, so tests can script translations.
#[async_trait]
pub trait CommandTranslator: Send + Sync {
    /// Returns the proposed single-line command for `user_text`.
    ///
    /// # Errors
    ///
    /// Returns an error when the credential is missing, the request fails or
    /// times out, or the response cannot be parsed. The caller reports the
    /// error and treats the translation as absent; it is never fatal.
    async fn translate(&self, user_text: &str, cwd: &Path) -> Result<String>;
}

/// Translator backed by the DeepSeek chat-completions API.
pub struct AiTranslator {
    platform: PlatformKind,
    http: Box<dyn HttpClient>,
    env: Box<dyn EnvProvider>,
}

impl AiTranslator {
    /// Creates a translator using the real HTTP client and process
    /// environment. Requests time out after 20 seconds.
    pub fn new(platform: PlatformKind) -> Result<Self> {
        Ok(Self::with_deps(
            platform,
            Box::new(ReqwestHttpClient::new(REQUEST_TIMEOUT)?),
            Box::new(SystemEnv),
        ))
    }

    /// Creates a translator with injected dependencies (for testing).
    pub fn with_deps(
        platform: PlatformKind,
        http: Box<dyn HttpClient>,
        env: Box<dyn EnvProvider>,
    ) -> Self {
        Self {
            platform,
            http,
            env,
        }
    }

    fn build_prompt(&self, user_text: &str, cwd: &Path) -> String {
        let dialect = self.platform.dialect_name();
        format!(
            "# Task rules\n\
             1. Target system only: generate a command for \"{dialect}\" and \
             nothing else. Never emit commands for any other operating system.\n\
             2. Single line: the response must be a single shell command that \
             can be copied and run as-is.\n\
             3. No extra content: no explanations, no comments, no code fence \
             markers (```), no text that is not the command itself.\n\
             \n\
             # Context\n\
             - Operating system: {dialect}\n\
             - Current working directory: `{cwd}`\n\
             - User request: `{user_text}`\n\
             \n\
             Generate the corresponding command:",
            dialect = dialect,
            cwd = cwd.display(),
            user_text = user_text,
        )
    }

    fn extract_command(body: &str) -> Result<String> {
        let response: ChatResponse = serde_json::from_str(body)
            .context("could not parse the completion response")?;

        let content = response
            .choices
            .first()
            .map(|choice| choice.message.content.trim())
            .ok_or_else(|| anyhow!("completion response contained no choices"))?;

        let command = strip_code_fence(content);
        if command.is_empty() {
            return Err(anyhow!("completion response contained no command"));
        }

        Ok(command)
    }
}

#[async_trait]
impl CommandTranslator for AiTranslator {
    async fn translate(&self, user_text: &str, cwd: &Path) -> Result<String> {
        let api_key = self.env.var(API_KEY_VAR).ok_or_else(|| {
            anyhow!(
                "{} is not set. Export your DeepSeek API key to enable the AI fallback.",
                API_KEY_VAR
            )
        })?;

        let prompt = self.build_prompt(user_text, cwd);
        let body = json!({
            "model": MODEL,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });
        let auth = format!("Bearer {}", api_key);
        let headers = [
            ("Content-Type", "application/json"),
            ("Authorization", auth.as_str()),
        ];

        info!("Requesting translation for: {}", user_text);
        let response_body = self
            .http
            .post_json(API_URL, &headers, &body)
            .await
            .context("translation request failed")?;

        let command = Self::extract_command(&response_body).map_err(|e| {
            warn!("Malformed completion response: {}", response_body);
            e
        })?;

        info!("Translator proposed: {}", command);
        Ok(command)
    }
}

/// Best-effort cleanup for a model that ignored the no-code-fence rule.
///
/// If the text is fenced at both ends, keeps only the last non-empty line
/// between the fences. This is a normalization heuristic, not a parser.
fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() > 6 && trimmed.starts_with("```") && trimmed.ends_with("```") {
        trimmed
            .trim_matches('`')
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string()
    } else {
        trimmed.to_string()
    }
}
