//! Title detection with a vision-language model served by Ollama.
//!
//! The screenshot is sent to `/api/chat` together with a JSON schema for
//! [`Titles`], so the model is constrained to answer with a titles object.
//! The answer is then validated: the example names from the instruction
//! (`TITLE_1`, `TITLE_2`, ...) are rejected rather than passed on as titles.

use super::{Detection, PerceptionError, TitleDetector};
use crate::utils::truncate_for_log;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, instrument};

pub const DEFAULT_VISION_MODEL: &str = "llama3.2-vision";

const TITLES_INSTRUCTION: &str = "\
## Task
The image is a partial screenshot of a news website. It should show the titles
of articles listed on the site. Find these titles and return only the titles.
If there is a single title, return a list with one element.
If there are no titles, return an empty list.

## Output Format
Answer with JSON in exactly this shape:
```json
{
    \"titles\": [\"TITLE_1\", \"TITLE_2\", ...]
}
```";

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*TITLE_\d+\s*$").expect("placeholder pattern is valid"));

/// Structured answer expected from the vision model.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Titles {
    pub titles: Vec<String>,
}

impl Titles {
    /// Reject the instruction's example names.
    pub fn validate(self) -> Result<Self, PerceptionError> {
        match self.titles.iter().find(|t| PLACEHOLDER_RE.is_match(t)) {
            Some(placeholder) => Err(PerceptionError::Validation(format!(
                "{placeholder} is an example name from the instruction, not an actual title"
            ))),
            None => Ok(self),
        }
    }

    /// JSON schema passed to the model's `format` option.
    pub fn schema() -> serde_json::Value {
        serde_json::to_value(schema_for!(Titles)).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    format: serde_json::Value,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
    images: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Ollama-backed [`TitleDetector`].
#[derive(Debug, Clone)]
pub struct OllamaVision {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaVision {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.3,
        }
    }

    /// Ask the model for titles and validate its answer.
    pub async fn titles_from_image(&self, screenshot: &Path) -> Result<Titles, PerceptionError> {
        let bytes = tokio::fs::read(screenshot)
            .await
            .map_err(|source| PerceptionError::Image {
                path: screenshot.display().to_string(),
                source,
            })?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: TITLES_INSTRUCTION.to_string(),
                images: vec![STANDARD.encode(bytes)],
            }],
            stream: false,
            format: Titles::schema(),
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        let t0 = Instant::now();
        let response: ChatResponse = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            response_preview = %truncate_for_log(&response.message.content, 300),
            "Vision model answered"
        );

        serde_json::from_str::<Titles>(&response.message.content)?.validate()
    }
}

impl TitleDetector for OllamaVision {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn detect_titles(&self, screenshot: &Path) -> Detection<Vec<String>> {
        match self.titles_from_image(screenshot).await {
            Ok(Titles { titles }) if titles.is_empty() => Detection::Empty,
            Ok(Titles { titles }) => Detection::Detected(titles),
            Err(e) => {
                error!(screenshot = %screenshot.display(), error = %e, "Title detection failed");
                Detection::Empty
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": DEFAULT_VISION_MODEL,
            "message": {"role": "assistant", "content": content},
            "done": true
        }))
    }

    fn screenshot() -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        std::fs::write(file.path(), b"\x89PNG fake").unwrap();
        file
    }

    #[test]
    fn test_validate_rejects_placeholder() {
        let titles = Titles {
            titles: vec!["Real headline here".to_string(), "TITLE_1".to_string()],
        };
        assert!(matches!(
            titles.validate(),
            Err(PerceptionError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_accepts_titles_mentioning_title() {
        let titles = Titles {
            titles: vec!["TITLE_1 of the season goes to Spain".to_string()],
        };
        assert!(titles.validate().is_ok());
    }

    #[test]
    fn test_schema_requires_titles_array() {
        let schema = Titles::schema();
        assert_eq!(schema["properties"]["titles"]["type"], "array");
        assert_eq!(schema["required"][0], "titles");
    }

    #[tokio::test]
    async fn test_detect_titles_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": DEFAULT_VISION_MODEL,
                "stream": false
            })))
            .respond_with(chat_reply(
                r#"{"titles": ["Researchers unveil new model today", "Chip stocks slide"]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let shot = screenshot();
        let vision = OllamaVision::new(server.uri(), DEFAULT_VISION_MODEL);
        let detection = vision.detect_titles(shot.path()).await;

        assert_eq!(
            detection,
            Detection::Detected(vec![
                "Researchers unveil new model today".to_string(),
                "Chip stocks slide".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn test_placeholder_answer_is_empty_detection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(chat_reply(r#"{"titles": ["TITLE_1"]}"#))
            .mount(&server)
            .await;

        let shot = screenshot();
        let vision = OllamaVision::new(server.uri(), DEFAULT_VISION_MODEL);
        assert!(vision.titles_from_image(shot.path()).await.is_err());
        assert_eq!(vision.detect_titles(shot.path()).await, Detection::Empty);
    }

    #[tokio::test]
    async fn test_malformed_answer_is_empty_detection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(chat_reply("Here are the titles: none"))
            .mount(&server)
            .await;

        let shot = screenshot();
        let vision = OllamaVision::new(server.uri(), DEFAULT_VISION_MODEL);
        assert_eq!(vision.detect_titles(shot.path()).await, Detection::Empty);
    }

    #[tokio::test]
    async fn test_server_error_is_empty_detection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let shot = screenshot();
        let vision = OllamaVision::new(server.uri(), DEFAULT_VISION_MODEL);
        assert_eq!(vision.detect_titles(shot.path()).await, Detection::Empty);
    }

    #[tokio::test]
    async fn test_empty_list_is_empty_detection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_reply(r#"{"titles": []}"#))
            .mount(&server)
            .await;

        let shot = screenshot();
        let vision = OllamaVision::new(server.uri(), DEFAULT_VISION_MODEL);
        assert_eq!(vision.detect_titles(shot.path()).await, Detection::Empty);
    }

    #[tokio::test]
    async fn test_missing_screenshot_is_empty_detection() {
        let vision = OllamaVision::new("http://127.0.0.1:9", DEFAULT_VISION_MODEL);
        assert_eq!(
            vision.detect_titles(Path::new("/nonexistent/gn_S0.png")).await,
            Detection::Empty
        );
    }
}
