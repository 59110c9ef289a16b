//! Business-form prefill: one Messages API call that turns a free-text
//! description into best-effort business fields.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::util::extract_json_object;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Shorter descriptions are rejected before any network call.
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// Body of `POST /api/prefill` and the `prefill` command's result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefillResponse {
    pub success: bool,
    pub data: Option<Map<String, Value>>,
    pub error: Option<String>,
}

impl PrefillResponse {
    pub fn ok(data: Map<String, Value>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

pub fn check_description(description: &str) -> Result<()> {
    if description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        bail!(
            "Description must be at least {} characters long",
            MIN_DESCRIPTION_LEN
        );
    }
    Ok(())
}

pub fn prompt(description: &str) -> String {
    format!(
        r#"Analyze this business description and extract ONLY the concrete facts it states. If a piece of information is NOT explicitly mentioned, use null.

Description: {description}

Answer ONLY with valid JSON in exactly this shape (no markdown, no text before or after):
{{
  "name": "exact business name or null",
  "location": "city/country or null",
  "phone": "exact phone number or null",
  "email": "exact email or null",
  "year": founding year (number) or null,
  "services": "comma-separated services mentioned or null",
  "positioning": "positioning sentence or USP or null",
  "street": "street address if mentioned or null",
  "postal_code": "postal code if mentioned or null",
  "city": "city if mentioned or null"
}}

IMPORTANT:
- Do not infer or invent anything
- Copy the information EXACTLY as given
- Use null when something is not in the description"#
    )
}

/// Parse the model's answer. Markdown fences and surrounding prose are
/// tolerated; `null` values become empty strings.
pub fn parse_fields(answer: &str) -> Result<Map<String, Value>> {
    let json = extract_json_object(answer).context("No JSON object in prefill answer")?;
    let value: Value = serde_json::from_str(&json).context("Invalid JSON in prefill answer")?;
    let Value::Object(mut fields) = value else {
        bail!("Prefill answer is not a JSON object");
    };
    for value in fields.values_mut() {
        if value.is_null() {
            *value = Value::String(String::new());
        }
    }
    Ok(fields)
}

/// Client for the Messages API.
#[derive(Clone)]
pub struct PrefillClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl PrefillClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.into(),
            endpoint: MESSAGES_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn extract(&self, description: &str) -> Result<Map<String, Value>> {
        check_description(description)?;
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("ANTHROPIC_API_KEY is not set");
        };

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: [Message {
                role: "user",
                content: prompt(description),
            }],
        };

        tracing::debug!(model = %self.model, "requesting prefill");
        let response: MessagesResponse = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .context("Failed to send prefill request")?
            .error_for_status()
            .context("Messages API returned error status")?
            .json()
            .await
            .context("Failed to parse Messages API response")?;

        let answer = response
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        parse_fields(answer.trim())
    }
}

impl std::fmt::Debug for PrefillClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefillClient")
            .field("configured", &self.is_configured())
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
