use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use validator::Validate;

use crate::core::config::Settings;
use crate::core::metrics::QUESTIONS_GENERATED;

const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct GenerationRequest {
    #[validate(length(min = 1, max = 500, message = "topic must not be empty"))]
    pub(crate) topic: String,
    #[serde(alias = "maxWeightage")]
    #[validate(range(min = 1, max = 100, message = "max_weightage must be between 1 and 100"))]
    pub(crate) max_weightage: u32,
    #[serde(alias = "numberOfQuestions")]
    #[validate(range(min = 1, message = "number_of_questions must be positive"))]
    pub(crate) number_of_questions: u32,
}

/// A normalized candidate question returned by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct GeneratedQuestionText {
    pub(crate) text: String,
}

#[derive(Debug, Clone)]
pub(crate) struct QuestionGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    max_questions: u32,
}

impl QuestionGenerator {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        if settings.ai().openai_base_url.trim().is_empty() {
            anyhow::bail!("OPENAI_BASE_URL is not configured");
        }
        let timeout = Duration::from_secs(settings.ai().ai_request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().openai_api_key.clone(),
            base_url: settings.ai().openai_base_url.trim_end_matches('/').to_string(),
            model: settings.ai().ai_model.clone(),
            max_tokens: settings.ai().ai_max_tokens,
            temperature: settings.ai().ai_temperature,
            max_questions: settings.paper().max_questions_per_generation,
        })
    }

    pub(crate) async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedQuestionText>> {
        request.validate().context("Invalid generation request")?;
        if request.number_of_questions > self.max_questions {
            anyhow::bail!(
                "at most {} questions can be generated per request, got {}",
                self.max_questions,
                request.number_of_questions
            );
        }

        let timer = Instant::now();
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": build_prompt(request)}
            ],
            "max_completion_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        tracing::info!(
            topic = %request.topic,
            count = request.number_of_questions,
            "Sending question generation request"
        );

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error = None;
        let mut body = Value::Null;

        for attempt in 0..=MAX_ATTEMPTS {
            let response =
                self.client.post(&url).bearer_auth(&self.api_key).json(&payload).send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    body = resp.json().await.unwrap_or(Value::Null);
                    if status.is_success() {
                        last_error = None;
                        break;
                    }
                    last_error = Some(anyhow::anyhow!("Generation API error ({status}): {body}"));
                }
                Err(err) => {
                    last_error = Some(anyhow::anyhow!(err).context("Failed to call generation API"));
                }
            }

            if attempt < MAX_ATTEMPTS {
                tracing::warn!(attempt, "Question generation attempt failed, retrying");
                tokio::time::sleep(Duration::from_secs(2_u64.pow(attempt))).await;
            }
        }

        if let Some(err) = last_error {
            return Err(err);
        }

        let content = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|value| value.as_str())
            .context("Missing generation response content")?;

        let questions = parse_generated_questions(content)?;
        metrics::counter!(QUESTIONS_GENERATED).increment(questions.len() as u64);

        tracing::info!(
            topic = %request.topic,
            returned = questions.len(),
            duration_seconds = timer.elapsed().as_secs_f64(),
            "Question generation completed"
        );

        Ok(questions)
    }
}

fn build_prompt(request: &GenerationRequest) -> String {
    format!(
        "Generate {count} descriptive academic questions on the topic \"{topic}\" suitable for \
         assessments worth up to {marks} marks each.\n\
         Return the response strictly as a raw JSON array (no markdown or backticks) of objects \
         with a single property:\n\
         - \"questionText\": the question stated in plain text with no code samples or snippets.\n\
         Do not include any code, pseudocode, markdown fences, numbering, or additional properties.",
        count = request.number_of_questions,
        topic = request.topic,
        marks = request.max_weightage,
    )
}

/// Turns raw model output into question texts.
///
/// A fence wrapping the whole response is unwrapped first. Well-formed JSON is preferred;
/// anything else falls back to one question per line with leading `1.` / `1)` numbering
/// removed. Code blocks inside texts are stripped, whitespace collapsed and empty texts dropped.
pub(crate) fn parse_generated_questions(raw: &str) -> Result<Vec<GeneratedQuestionText>> {
    let outer_fence = Regex::new(r"(?is)^\s*```(?:json)?\s*(.*?)\s*```\s*$")?;
    let numbering = Regex::new(r"^\d+[\).]\s*")?;
    let code_block = Regex::new(r"(?s)```.*?```")?;

    let cleaned = match outer_fence.captures(raw).and_then(|captures| captures.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw.trim(),
    };

    let candidates = match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => texts_from_json(value),
        Err(err) => {
            tracing::warn!(error = %err, "Generation output is not JSON, splitting lines");
            code_block
                .replace_all(cleaned, "")
                .lines()
                .map(|line| numbering.replace(line.trim(), "").trim().to_string())
                .collect()
        }
    };

    Ok(candidates
        .into_iter()
        .map(|text| {
            code_block.replace_all(&text, "").split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|text| !text.is_empty())
        .map(|text| GeneratedQuestionText { text })
        .collect())
}

fn texts_from_json(value: Value) -> Vec<String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(object)],
        },
        Value::String(text) => vec![Value::String(text)],
        _ => Vec::new(),
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(text) => text,
            Value::Object(object) => object
                .get("questionText")
                .or_else(|| object.get("question"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        })
        .collect()
}
