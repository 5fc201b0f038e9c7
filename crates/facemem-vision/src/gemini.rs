//! Gemini implementation of the extraction capability.
//!
//! Sends one band image inline (base64 JPEG) together with a roster
//! analysis prompt and a response schema that makes `box_2d` the only
//! mandatory field. Models are tried in order until one succeeds.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use facemem_models::ExtractedPerson;

use crate::config::GeminiConfig;
use crate::error::{VisionError, VisionResult};
use crate::extractor::FaceExtractor;

/// Models tried in order until one returns a parseable response.
const MODELS: &[&str] = &["gemini-2.0-flash", "gemini-2.5-flash"];

const SYSTEM_INSTRUCTION: &str =
    "You are a high-precision computer vision AI. You excel at detecting \
     faces in document grids and natural scenes.";

const EXTRACTION_PROMPT: &str = r#"Analyze this image. It is either a formal roster (grid) OR a natural group photo.

Task:
1. Detect EVERY face in the image.
2. Extract text associated with each person if available.

CRITICAL INSTRUCTION FOR FACE DETECTION:
- Provide the bounding box for the **FACE ONLY**.
- Do not include the shoulders or torso.
- The bounding box must be TIGHT around the head.
- box_2d format is [ymin, xmin, ymax, xmax] in 0-1000 normalized coordinates.

Extract fields (if text is available near the face):
1. Name
2. Job Group (e.g. IT, Biz)
3. Career (previous company or experience info)
4. Notes (major, school, remarks)
5. Gender (M or F) - Infer from face or name.

Return the result as a JSON array."#;

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Gemini vision client.
pub struct GeminiVision {
    config: GeminiConfig,
    client: Client,
}

impl GeminiVision {
    /// Create a new client from an explicit config.
    pub fn new(config: GeminiConfig) -> VisionResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(VisionError::Network)?;
        Ok(Self { config, client })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        let config = GeminiConfig::from_env().ok_or(VisionError::MissingApiKey)?;
        Self::new(config)
    }

    /// Response schema constraining the output to a detection array in
    /// which only `box_2d` is mandatory.
    fn response_schema() -> serde_json::Value {
        json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "name": { "type": "STRING" },
                    "job_group": { "type": "STRING" },
                    "career": { "type": "STRING" },
                    "notes": { "type": "STRING" },
                    "gender": { "type": "STRING", "enum": ["M", "F", "U"] },
                    "box_2d": {
                        "type": "ARRAY",
                        "items": { "type": "INTEGER" },
                        "description": "Tight bounding box of the face [ymin, xmin, ymax, xmax] in 0-1000 scale."
                    }
                },
                "required": ["box_2d"]
            }
        })
    }

    fn build_request(&self, image_jpeg: &[u8]) -> GeminiRequest {
        let data = base64::engine::general_purpose::STANDARD.encode(image_jpeg);
        GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".to_string(),
                            data,
                        },
                    },
                    Part::Text {
                        text: EXTRACTION_PROMPT.to_string(),
                    },
                ],
            }],
            system_instruction: Content {
                parts: vec![Part::Text {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: Self::response_schema(),
            },
        }
    }

    /// Call one model and parse its detection array.
    async fn call_model(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> VisionResult<Vec<ExtractedPerson>> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url, model, self.config.api_key
        );

        debug!("Sending extraction request to model {}", model);

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::RequestFailed(format!(
                "Gemini API returned {}: {}",
                status, body
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| VisionError::InvalidResponse(format!("bad response envelope: {}", e)))?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| VisionError::InvalidResponse("no content in response".to_string()))?;

        let value: serde_json::Value = serde_json::from_str(strip_code_fences(text))?;
        let (people, dropped) = ExtractedPerson::parse_array(value);
        if dropped > 0 {
            warn!("Dropped {} malformed detection element(s)", dropped);
        }
        Ok(people)
    }
}

/// Strip a markdown ```json fence if the model wrapped its output in one.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

#[async_trait]
impl FaceExtractor for GeminiVision {
    async fn extract(&self, image_jpeg: &[u8]) -> VisionResult<Vec<ExtractedPerson>> {
        let request = self.build_request(image_jpeg);

        let mut last_error = None;
        for model in MODELS {
            match self.call_model(model, &request).await {
                Ok(people) => {
                    info!("Model {} returned {} detection(s)", model, people.len());
                    return Ok(people);
                }
                Err(e) => {
                    warn!("Extraction failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| VisionError::RequestFailed("no models configured".to_string())))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> GeminiConfig {
        GeminiConfig {
            api_key: "test-key".to_string(),
            base_url,
            timeout: std::time::Duration::from_secs(5),
        }
    }

    fn gemini_body(text: &str) -> serde_json::Value {
        json!({
            "candidates": [
                { "content": { "parts": [ { "text": text } ] } }
            ]
        })
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("[1]"), "[1]");
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  ```json\n[]\n```  "), "[]");
    }

    #[tokio::test]
    async fn test_extract_parses_detection_array() {
        let server = MockServer::start().await;
        let text = r#"[{"name":"Kim","gender":"F","box_2d":[10,20,30,40]}]"#;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(text)))
            .mount(&server)
            .await;

        let client = GeminiVision::new(test_config(server.uri())).unwrap();
        let people = client.extract(b"fake jpeg").await.unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name.as_deref(), Some("Kim"));
        assert_eq!(people[0].box_2d.as_deref(), Some(&[10.0, 20.0, 30.0, 40.0][..]));
    }

    #[tokio::test]
    async fn test_extract_handles_fenced_payload() {
        let server = MockServer::start().await;
        let text = "```json\n[{\"box_2d\":[1,2,3,4]}]\n```";
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(text)))
            .mount(&server)
            .await;

        let client = GeminiVision::new(test_config(server.uri())).unwrap();
        let people = client.extract(b"fake jpeg").await.unwrap();
        assert_eq!(people.len(), 1);
    }

    #[tokio::test]
    async fn test_extract_falls_back_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("[]")))
            .mount(&server)
            .await;

        let client = GeminiVision::new(test_config(server.uri())).unwrap();
        let people = client.extract(b"fake jpeg").await.unwrap();
        assert!(people.is_empty());
    }

    #[tokio::test]
    async fn test_extract_all_models_fail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = GeminiVision::new(test_config(server.uri())).unwrap();
        let err = client.extract(b"fake jpeg").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_extract_malformed_elements_are_dropped() {
        let server = MockServer::start().await;
        let text = r#"[{"box_2d":[10,20,30,40]},{"name":"no box"},{"box_2d":[1,2]}]"#;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(text)))
            .mount(&server)
            .await;

        let client = GeminiVision::new(test_config(server.uri())).unwrap();
        let people = client.extract(b"fake jpeg").await.unwrap();
        // Elements parse leniently here; boxless ones are dropped later
        // at validation.
        assert_eq!(people.len(), 3);
        assert_eq!(people.iter().filter_map(|p| p.clone().validate()).count(), 1);
    }
}
