use crate::config::Config;
use crate::error::EvalError;
use crate::models::EvaluationResult;
use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
};
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Instruction sent as the system message of every evaluation request
pub const RUBRIC_INSTRUCTION: &str = r#"
You are a prompt engineering evaluator.

Check if prompt includes the following 10 elements:
Role, Context, Clear task, Output format, Constraints,
Structure, Examples, Tone, Completeness, Effectiveness.

Score each element 0-10.

Return JSON exactly like this:
{
"Role": 0,
"Context":0,
"ClearTask":0,
"OutputFormat":0,
"Constraints":0,
"Structure":0,
"Examples":0,
"Tone":0,
"Completeness":0,
"Effectiveness":0,
"Overall":0,
"Issues": ["list missing elements"],
"Suggestions": ["list tips"],
"ImprovedPrompt": "better version of the prompt"
}
"#;

/// Something that can score a prompt against the rubric.
///
/// The session only talks to this trait, so tests can count calls without a
/// network.
pub trait PromptEvaluator {
    async fn evaluate(&self, prompt: &str) -> Result<EvaluationResult, EvalError>;
}

/// Evaluator backed by an OpenAI-compatible chat completion endpoint
pub struct Evaluator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Evaluator {
    /// Create an evaluator for the configured endpoint.
    ///
    /// Requests carry the configured timeout and are never retried.
    pub fn new(config: &Config, api_key: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.api_endpoint);

        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(no_retry);

        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature as f32,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the chat completion request for one prompt
    fn build_request(&self, prompt: &str) -> Result<CreateChatCompletionRequest> {
        let system_message = ChatCompletionRequestSystemMessageArgs::default()
            .content(RUBRIC_INSTRUCTION.to_string())
            .build()
            .context("Failed to build system message")?
            .into();

        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .context("Failed to build user message")?
            .into();

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([system_message, user_message])
            .temperature(self.temperature)
            .max_tokens(u16::try_from(self.max_tokens).unwrap_or(u16::MAX))
            .build()
            .context("Failed to build chat completion request")
    }

    /// Execute the request; every failure here is a transport failure
    async fn execute_request(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<CreateChatCompletionResponse, EvalError> {
        self.client
            .chat()
            .create(request)
            .await
            .map_err(|err| EvalError::ServiceUnavailable(err.to_string()))
    }
}

impl PromptEvaluator for Evaluator {
    async fn evaluate(&self, prompt: &str) -> Result<EvaluationResult, EvalError> {
        let request = self
            .build_request(prompt)
            .map_err(|err| EvalError::ServiceUnavailable(format!("{err:#}")))?;

        debug!(model = %self.model, prompt_chars = prompt.len(), "sending evaluation request");
        let response = self.execute_request(request).await?;

        let content = extract_content(response)?;
        let result = parse_evaluation_response(&content)?;

        let out_of_range = result.out_of_range();
        if !out_of_range.is_empty() {
            warn!(fields = ?out_of_range, "evaluator returned scores outside 0-10");
        }
        info!(overall = result.overall, issues = result.issues.len(), "evaluation complete");

        Ok(result)
    }
}

/// Message content of the first choice
fn extract_content(response: CreateChatCompletionResponse) -> Result<String, EvalError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| EvalError::MalformedResponse("response has no message content".into()))?;

    if content.trim().is_empty() {
        return Err(EvalError::MalformedResponse("response content is empty".into()));
    }
    Ok(content)
}

/// Parse the evaluator's reply under the strict result schema.
///
/// A reply that is not JSON as a whole gets one more try on its outermost
/// `{...}` span, which covers code fences and leading prose.
pub fn parse_evaluation_response(content: &str) -> Result<EvaluationResult, EvalError> {
    match serde_json::from_str::<EvaluationResult>(content) {
        Ok(result) => Ok(result),
        Err(err) if err.is_syntax() || err.is_eof() => try_extract_embedded_json(content),
        Err(err) => Err(EvalError::MalformedResponse(err.to_string())),
    }
}

fn try_extract_embedded_json(content: &str) -> Result<EvaluationResult, EvalError> {
    let start = content
        .find('{')
        .ok_or_else(|| EvalError::MalformedResponse("no JSON object in response".into()))?;
    let end = content
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| EvalError::MalformedResponse("unterminated JSON object in response".into()))?;

    serde_json::from_str(&content[start..=end])
        .map_err(|err| EvalError::MalformedResponse(err.to_string()))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::models::RubricElement;
    use crate::models::fixtures::INCIDENT_RESPONSE;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_rubric_instruction_names_every_field() {
        for element in RubricElement::ALL {
            assert!(RUBRIC_INSTRUCTION.contains(&format!("\"{}\"", element.key())));
        }
        assert!(RUBRIC_INSTRUCTION.contains("\"Overall\""));
        assert!(RUBRIC_INSTRUCTION.contains("\"ImprovedPrompt\""));
        assert!(RUBRIC_INSTRUCTION.contains("Score each element 0-10."));
    }

    #[test]
    fn test_build_request_is_deterministic() {
        let evaluator = evaluator_for("http://127.0.0.1:9".to_string());
        let request = evaluator.build_request("Summarize an incident").unwrap();

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.messages.len(), 2);
    }

    #[test]
    fn test_parse_valid_json() {
        let result = parse_evaluation_response(INCIDENT_RESPONSE).unwrap();
        assert_eq!(result.overall, 6);
        assert_eq!(result.examples, 2);
    }

    #[test]
    fn test_parse_embedded_json() {
        let content = format!("Here is the evaluation:\n```json\n{}\n```", INCIDENT_RESPONSE);
        let result = parse_evaluation_response(&content).unwrap();
        assert_eq!(result.tone, 9);
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_evaluation_response("I cannot evaluate this prompt.");
        assert!(matches!(result, Err(EvalError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_no_closing_brace() {
        let result = parse_evaluation_response(r#"{"Role": 5, "Context": 6"#);
        assert!(matches!(result, Err(EvalError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_missing_field() {
        let content = INCIDENT_RESPONSE.replace(r#""Overall":6,"#, "");
        let result = parse_evaluation_response(&content);
        assert!(matches!(result, Err(EvalError::MalformedResponse(msg)) if msg.contains("Overall")));
    }

    #[test]
    fn test_parse_wrong_type() {
        let content = INCIDENT_RESPONSE.replace(r#""Tone":9"#, r#""Tone":"high""#);
        let result = parse_evaluation_response(&content);
        assert!(matches!(result, Err(EvalError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_keeps_out_of_range_scores() {
        let content = INCIDENT_RESPONSE
            .replace(r#""Role":5"#, r#""Role":12"#)
            .replace(r#""Overall":6"#, r#""Overall":-1"#);
        let result = parse_evaluation_response(&content).unwrap();
        assert_eq!(result.role, 12);
        assert_eq!(result.overall, -1);
    }

    #[tokio::test]
    async fn test_evaluate_against_stub_service() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "temperature": 0.0
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(INCIDENT_RESPONSE))
            .create_async()
            .await;

        let evaluator = evaluator_for(server.url());
        let result = evaluator.evaluate("Summarize an incident").await.unwrap();

        let scores: Vec<i64> = RubricElement::ALL.iter().map(|e| result.score(*e)).collect();
        assert_eq!(scores, vec![5, 6, 7, 4, 3, 8, 2, 9, 6, 7]);
        assert_eq!(result.overall, 6);
        assert_eq!(result.issues, vec!["Missing examples".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_evaluate_sends_prompt_as_user_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Regex("Summarize an incident".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(INCIDENT_RESPONSE))
            .create_async()
            .await;

        let evaluator = evaluator_for(server.url());
        evaluator.evaluate("Summarize an incident").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_evaluate_invalid_json_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("Great prompt, 8/10!"))
            .create_async()
            .await;

        let evaluator = evaluator_for(server.url());
        let result = evaluator.evaluate("Summarize an incident").await;
        assert!(matches!(result, Err(EvalError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_evaluate_empty_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("   "))
            .create_async()
            .await;

        let evaluator = evaluator_for(server.url());
        let result = evaluator.evaluate("Summarize an incident").await;
        assert!(matches!(result, Err(EvalError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_evaluate_auth_failure() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "error": {
                        "message": "Incorrect API key provided",
                        "type": "invalid_request_error",
                        "param": null,
                        "code": "invalid_api_key"
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let evaluator = evaluator_for(server.url());
        let result = evaluator.evaluate("Summarize an incident").await;
        assert!(matches!(result, Err(EvalError::ServiceUnavailable(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_evaluate_server_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .expect(1)
            .create_async()
            .await;

        let evaluator = evaluator_for(server.url());
        let result = evaluator.evaluate("Summarize an incident").await;
        assert!(matches!(result, Err(EvalError::ServiceUnavailable(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_evaluate_rate_limit_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "error": {
                        "message": "Rate limit reached for requests",
                        "type": "requests",
                        "param": null,
                        "code": "rate_limit_exceeded"
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let evaluator = evaluator_for(server.url());
        let result = evaluator.evaluate("Summarize an incident").await;
        assert!(matches!(result, Err(EvalError::ServiceUnavailable(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_evaluate_times_out_on_silent_service() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let evaluator = evaluator_with_timeout(format!("http://{}", addr), 1);
        let started = std::time::Instant::now();
        let result = evaluator.evaluate("Summarize an incident").await;

        assert!(matches!(result, Err(EvalError::ServiceUnavailable(_))));
        assert!(started.elapsed() < Duration::from_secs(10));
        silent.abort();
    }

    #[tokio::test]
    async fn test_evaluate_unreachable_service() {
        let evaluator = evaluator_for("http://127.0.0.1:9".to_string());
        let result = evaluator.evaluate("Summarize an incident").await;
        assert!(matches!(result, Err(EvalError::ServiceUnavailable(_))));
    }
}
