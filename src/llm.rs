use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.3";

const API_BASE: &str = "https://api-inference.huggingface.co/models";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParams,
}

#[derive(Serialize)]
struct GenerateParams {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    return_full_text: bool,
}

impl Default for GenerateParams {
    fn default() -> Self {
        GenerateParams {
            max_new_tokens: 800,
            temperature: 0.1,
            top_p: 0.9,
            return_full_text: false,
        }
    }
}

/// Send one prompt to the inference API and return the generated text,
/// trimmed. Transport and API failures surface as errors with their cause;
/// there is no retry.
pub async fn generate(client: &reqwest::Client, model: &str, prompt: &str) -> Result<String> {
    let api_key = std::env::var("HUGGINGFACE_API_KEY")
        .map_err(|_| anyhow::anyhow!("HUGGINGFACE_API_KEY environment variable must be set"))?;

    debug!("Sending {} chars to {}", prompt.len(), model);

    let response = client
        .post(format!("{}/{}", API_BASE, model))
        .bearer_auth(api_key)
        .json(&GenerateRequest {
            inputs: prompt,
            parameters: GenerateParams::default(),
        })
        .send()
        .await
        .context("Inference request failed")?;

    let body: serde_json::Value = response
        .json()
        .await
        .context("Failed to read inference response")?;

    parse_generated_text(&body)
}

/// The API returns either `[{"generated_text": ...}]` or a bare object;
/// error bodies carry an `error` field instead.
fn parse_generated_text(body: &serde_json::Value) -> Result<String> {
    if let Some(err) = body.get("error").and_then(|e| e.as_str()) {
        anyhow::bail!("Inference API error: {}", err);
    }

    let text = body
        .as_array()
        .and_then(|arr| arr.first())
        .unwrap_or(body)
        .get("generated_text")
        .and_then(|t| t.as_str())
        .ok_or_else(|| anyhow::anyhow!("No generated_text in inference response"))?;

    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_shaped_response() {
        let body = json!([{"generated_text": "  | A |\n|---|\n| 1 |  "}]);
        assert_eq!(parse_generated_text(&body).unwrap(), "| A |\n|---|\n| 1 |");
    }

    #[test]
    fn object_shaped_response() {
        let body = json!({"generated_text": "hello"});
        assert_eq!(parse_generated_text(&body).unwrap(), "hello");
    }

    #[test]
    fn error_body_is_surfaced() {
        let body = json!({"error": "Model is currently loading"});
        let err = parse_generated_text(&body).unwrap_err();
        assert!(err.to_string().contains("currently loading"));
    }

    #[test]
    fn missing_text_is_an_error() {
        assert!(parse_generated_text(&json!([{}])).is_err());
        assert!(parse_generated_text(&json!(42)).is_err());
    }

    #[test]
    fn request_payload_shape() {
        let req = GenerateRequest {
            inputs: "p",
            parameters: GenerateParams::default(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["inputs"], "p");
        assert_eq!(v["parameters"]["max_new_tokens"], 800);
        assert_eq!(v["parameters"]["return_full_text"], false);
    }
}
