use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::time::Duration;
use studychat_common::{ChatError, Result};
use tracing::{debug, info, warn};

use crate::backend::ModelBackend;
use crate::types::{GenerationRequest, InferenceOptions, InferencePayload, TokenStatus};

/// Reply used when the API answers with a shape that carries no text
pub const NO_TEXT_RESPONSE: &str =
    "I received your message but I'm not sure how to respond right now.";

/// Model used to check whether a token can run inference
const TOKEN_CHECK_MODEL: &str = "gpt2";

/// Hugging Face hosted inference API client
#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    base_url: String,
    api_token: String,
    client: Client,
}

impl HuggingFaceClient {
    /// Create new Hugging Face client
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::config(format!("Failed to create HTTP client: {}", e)))?;

        info!("Hugging Face client initialized: {}", base_url);
        Ok(Self {
            base_url,
            api_token: api_token.into(),
            client,
        })
    }

    fn model_url(&self, model_id: &str) -> String {
        format!("{}/models/{}", self.base_url, model_id)
    }

    /// POST a JSON body to a model endpoint; transport failures only
    async fn post_model(&self, model_id: &str, body: &impl serde::Serialize) -> Result<Response> {
        self.client
            .post(self.model_url(model_id))
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                ChatError::unavailable(
                    "Unable to reach the Hugging Face API. Please check your connection and try again.",
                    Some(e.to_string()),
                )
            })
    }

    /// Check that the token can run inference
    pub async fn verify_token(&self) -> Result<TokenStatus> {
        let body = json!({
            "inputs": "Hello",
            "parameters": { "max_new_tokens": 5 }
        });

        let response = self.post_model(TOKEN_CHECK_MODEL, &body).await?;
        let status = response.status();

        if status.is_success() {
            info!("API token verified");
            return Ok(TokenStatus {
                valid: true,
                status: None,
                error: None,
                message: "API token is valid and working!".to_string(),
            });
        }

        let error = read_error_details(response)
            .await
            .unwrap_or_else(|| "Unknown error".to_string());

        let message = if error.contains("sufficient permissions") {
            "Your API token needs \"Inference\" permissions. Please create a new token with \
             Inference permissions at https://huggingface.co/settings/tokens"
        } else {
            "API token validation failed"
        };

        warn!("API token validation failed ({}): {}", status.as_u16(), error);
        Ok(TokenStatus {
            valid: false,
            status: Some(status.as_u16()),
            error: Some(error),
            message: message.to_string(),
        })
    }
}

#[async_trait]
impl ModelBackend for HuggingFaceClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!(
            "Sending inference request - Model: {}, Input length: {}",
            request.model_id(),
            request.input().len()
        );

        let payload = InferencePayload {
            inputs: request.input(),
            parameters: request.params(),
            options: InferenceOptions::default(),
        };

        let response = self.post_model(request.model_id(), &payload).await?;
        let status = response.status();

        if !status.is_success() {
            let details = read_error_details(response).await;
            warn!(
                "Hugging Face API error {} for {}: {}",
                status.as_u16(),
                request.model_id(),
                details.as_deref().unwrap_or("<no body>")
            );
            return Err(ChatError::from_status(status.as_u16(), request.model_id(), details));
        }

        let body: Value = response.json().await.map_err(|e| {
            ChatError::unavailable(
                "The model returned a response that could not be read.",
                Some(e.to_string()),
            )
        })?;

        let text = extract_generated_text(body);
        debug!("Received inference response - Length: {}", text.len());
        Ok(text)
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

/// Pull generated text out of either response shape
///
/// Accepts `[{"generated_text": ...}]`, `{"generated_text": ...}`, the same
/// with a `text` field, or a bare string.
pub fn extract_generated_text(body: Value) -> String {
    match body {
        Value::Array(items) => match items.into_iter().next() {
            Some(first) => text_field(&first).unwrap_or_else(|| first.to_string()),
            None => NO_TEXT_RESPONSE.to_string(),
        },
        Value::String(text) if !text.is_empty() => text,
        other => text_field(&other).unwrap_or_else(|| NO_TEXT_RESPONSE.to_string()),
    }
}

fn text_field(value: &Value) -> Option<String> {
    ["generated_text", "text"].iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Error text from a failed response: the `error` or `message` field, else the raw body
async fn read_error_details(response: Response) -> Option<String> {
    let text = response.text().await.ok()?;
    if text.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Some(
            ["error", "message"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| value.to_string()),
        ),
        Err(_) => Some(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PromptPipeline;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HuggingFaceClient {
        HuggingFaceClient::new(server.uri(), "hf_test_token", Duration::from_secs(5)).unwrap()
    }

    fn gpt2_request() -> GenerationRequest {
        PromptPipeline::default().build_request("Hi", "gpt2", &[]).unwrap()
    }

    #[test]
    fn test_extract_generated_text_shapes() {
        assert_eq!(extract_generated_text(json!([{"generated_text": "hello"}])), "hello");
        assert_eq!(extract_generated_text(json!([{"text": "hello"}])), "hello");
        assert_eq!(extract_generated_text(json!({"generated_text": "hi"})), "hi");
        assert_eq!(extract_generated_text(json!({"text": "hi"})), "hi");
        assert_eq!(extract_generated_text(json!([{"score": 1}])), r#"{"score":1}"#);
        assert_eq!(extract_generated_text(json!([])), NO_TEXT_RESPONSE);
        assert_eq!(extract_generated_text(json!({"foo": "bar"})), NO_TEXT_RESPONSE);
        assert_eq!(
            extract_generated_text(json!({"generated_text": "", "text": "fallback"})),
            "fallback"
        );
    }

    #[tokio::test]
    async fn test_generate_sends_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gpt2"))
            .and(header("authorization", "Bearer hf_test_token"))
            .and(body_partial_json(json!({
                "inputs": "Human: Hi\nAssistant:",
                "parameters": {"max_new_tokens": 50, "top_k": 40, "eos_token_id": 50256},
                "options": {"wait_for_model": true, "use_cache": false}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"generated_text": "Human: Hi\nAssistant: Hello!"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server).generate(&gpt2_request()).await.unwrap();
        assert_eq!(text, "Human: Hi\nAssistant: Hello!");
    }

    #[tokio::test]
    async fn test_generate_maps_status_codes() {
        let cases: [(u16, fn(&ChatError) -> bool); 5] = [
            (401, |e| matches!(e, ChatError::Auth { .. })),
            (403, |e| matches!(e, ChatError::Permission { .. })),
            (404, |e| matches!(e, ChatError::NotFound { .. })),
            (429, |e| matches!(e, ChatError::RateLimit { .. })),
            (500, |e| matches!(e, ChatError::GenericBackend { status: 500, .. })),
        ];

        for (status, check) in cases {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/models/gpt2"))
                .respond_with(
                    ResponseTemplate::new(status).set_body_json(json!({"error": "upstream says no"})),
                )
                .expect(1)
                .mount(&server)
                .await;

            let err = client_for(&server).generate(&gpt2_request()).await.unwrap_err();
            assert!(check(&err), "status {} mapped to {:?}", status, err);
            assert_eq!(err.details().as_deref(), Some("upstream says no"));
        }
    }

    #[tokio::test]
    async fn test_generate_does_not_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).generate(&gpt2_request()).await.unwrap_err();
        assert_eq!(err.user_message(), "API error: 503");
        assert_eq!(err.details().as_deref(), Some("Service Unavailable"));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let client =
            HuggingFaceClient::new("http://127.0.0.1:9", "hf_test_token", Duration::from_secs(2)).unwrap();
        let err = client.generate(&gpt2_request()).await.unwrap_err();
        assert!(matches!(err, ChatError::BackendUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_verify_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gpt2"))
            .and(body_partial_json(json!({"inputs": "Hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"generated_text": "Hello!"}])))
            .mount(&server)
            .await;

        let status = client_for(&server).verify_token().await.unwrap();
        assert!(status.valid);

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": "This authentication method does not have sufficient permissions"
            })))
            .mount(&server)
            .await;

        let status = client_for(&server).verify_token().await.unwrap();
        assert!(!status.valid);
        assert_eq!(status.status, Some(403));
        assert!(status.message.contains("Inference"));
    }
}
