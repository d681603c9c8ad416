use std::env;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use quiz_core::model::{Document, MAX_QUESTIONS, Question, Quiz};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::error::GenerationError;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: None,
        }
    }
}

impl GenerationConfig {
    /// Read `QUIZ_API_URL` and `QUIZ_API_TIMEOUT_SECS`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("QUIZ_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let timeout = env::var("QUIZ_API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        Self { base_url, timeout }
    }

    fn quiz_url(&self) -> String {
        format!("{}/quiz", self.base_url.trim_end_matches('/'))
    }
}

/// Source of generated quizzes.
///
/// Each call issues exactly one request; implementations do not retry.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// Upload `document` and return the quiz generated from it.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` on transport failures, non-success statuses, or
    /// payloads that are not a JSON object.
    async fn request_quiz(&self, document: &Document) -> Result<Quiz, GenerationError>;
}

/// `QuizGenerator` backed by the HTTP quiz service (`POST {base_url}/quiz`).
#[derive(Clone)]
pub struct HttpQuizGenerator {
    client: Client,
    config: GenerationConfig,
}

impl HttpQuizGenerator {
    /// # Errors
    ///
    /// Returns `GenerationError::Http` if the HTTP client cannot be built.
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// # Errors
    ///
    /// Returns `GenerationError::Http` if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, GenerationError> {
        Self::new(GenerationConfig::from_env())
    }

    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

#[async_trait]
impl QuizGenerator for HttpQuizGenerator {
    async fn request_quiz(&self, document: &Document) -> Result<Quiz, GenerationError> {
        let part = Part::bytes(document.bytes().to_vec())
            .file_name(document.file_name().to_owned())
            .mime_str(document.content_type())?;
        let form = Form::new().part("file", part);

        debug!(
            "uploading {} ({} bytes) to {}",
            document.file_name(),
            document.len(),
            self.config.quiz_url()
        );
        let response = self
            .client
            .post(self.config.quiz_url())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body = response.bytes().await?;
        parse_quiz_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct QuizItem {
    question: String,
    options: Vec<String>,
    answer: String,
}

/// Decode the quiz service's response body.
///
/// A missing or non-array `quiz` field yields an empty quiz; any list item that
/// is not a valid question fails the whole response. Lists longer than
/// `MAX_QUESTIONS` are truncated.
///
/// # Errors
///
/// Returns `GenerationError::Malformed` if the body is not a JSON object or an
/// item cannot be turned into a `Question`.
pub fn parse_quiz_response(body: &[u8]) -> Result<Quiz, GenerationError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    let serde_json::Value::Object(mut fields) = value else {
        return Err(GenerationError::Malformed("expected a JSON object".into()));
    };
    let model = fields
        .get("model_used")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("unknown")
        .to_owned();

    let Some(serde_json::Value::Array(items)) = fields.remove("quiz") else {
        debug!("quiz field missing or not a list; treating as empty quiz");
        return Ok(Quiz::empty());
    };

    if items.len() > MAX_QUESTIONS {
        warn!(
            "quiz service returned {} questions; keeping the first {MAX_QUESTIONS}",
            items.len()
        );
    }

    let mut questions = Vec::with_capacity(items.len().min(MAX_QUESTIONS));
    for (i, item) in items.into_iter().take(MAX_QUESTIONS).enumerate() {
        let item: QuizItem = serde_json::from_value(item)
            .map_err(|e| GenerationError::Malformed(format!("question {}: {e}", i + 1)))?;
        let question = Question::from_raw(&item.question, item.options.as_slice(), &item.answer)
            .map_err(|e| GenerationError::Malformed(format!("question {}: {e}", i + 1)))?;
        questions.push(question);
    }

    let quiz = Quiz::new(questions).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    info!("generated quiz with {} questions (model: {model})", quiz.len());
    Ok(quiz)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(question: &str, answer: &str) -> serde_json::Value {
        serde_json::json!({
            "question": question,
            "options": ["A) 3", "B) 4", "C) 5", "D) 6"],
            "answer": answer,
        })
    }

    #[test]
    fn parses_questions_in_order() {
        let body = serde_json::json!({
            "model_used": "gemini-2.5-flash",
            "quiz": [item("What is 2+2?", "B"), item("What is 1+2?", "A")],
        });
        let quiz = parse_quiz_response(body.to_string().as_bytes()).unwrap();

        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz[0].text(), "What is 2+2?");
        assert_eq!(quiz[0].correct_answer(), "B");
        assert_eq!(quiz[0].options()[1].text, "4");
        assert_eq!(quiz[1].correct_answer(), "A");
    }

    #[test]
    fn missing_or_non_list_quiz_is_empty() {
        let quiz = parse_quiz_response(br#"{"model_used": "x"}"#).unwrap();
        assert!(quiz.is_empty());

        let quiz = parse_quiz_response(br#"{"quiz": "not a list"}"#).unwrap();
        assert!(quiz.is_empty());

        let quiz = parse_quiz_response(br#"{"quiz": null}"#).unwrap();
        assert!(quiz.is_empty());
    }

    #[test]
    fn non_object_payload_is_malformed() {
        let err = parse_quiz_response(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));

        let err = parse_quiz_response(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn invalid_item_fails_whole_response() {
        let body = serde_json::json!({
            "quiz": [item("ok", "B"), {"question": "bad", "options": ["A) 1"], "answer": "A"}],
        });
        let err = parse_quiz_response(body.to_string().as_bytes()).unwrap_err();
        match err {
            GenerationError::Malformed(detail) => assert!(detail.starts_with("question 2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn long_lists_are_truncated() {
        let items: Vec<_> = (0..MAX_QUESTIONS + 5)
            .map(|i| item(&format!("Q{i}"), "C"))
            .collect();
        let body = serde_json::json!({ "quiz": items });
        let quiz = parse_quiz_response(body.to_string().as_bytes()).unwrap();
        assert_eq!(quiz.len(), MAX_QUESTIONS);
        assert_eq!(quiz[MAX_QUESTIONS - 1].text(), format!("Q{}", MAX_QUESTIONS - 1));
    }

    #[test]
    fn config_builds_quiz_url() {
        let config = GenerationConfig {
            base_url: "http://example.test/api/".into(),
            timeout: None,
        };
        assert_eq!(config.quiz_url(), "http://example.test/api/quiz");
        assert_eq!(GenerationConfig::default().quiz_url(), "http://localhost:8000/quiz");
    }
}
