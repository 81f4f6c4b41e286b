//! Schedule summary and the generative-model analysis of it.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::{AppSettings, CareEvent, EventType};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const SYSTEM_INSTRUCTION: &str =
    "You are a professional care assistant. Respond only in Hebrew. Be helpful and encouraging.";

/// One line per registration: `date: slot (role) - name`.
pub fn schedule_summary(events: &[CareEvent], settings: &AppSettings) -> String {
    events
        .iter()
        .map(|e| {
            let slot = settings.slot(&e.slot_id);
            let role = match slot.map(|s| s.slot_type) {
                Some(EventType::Escort) => EventType::Escort.role_label(),
                _ => EventType::Visitor.role_label(),
            };
            let label = slot.map(|s| s.label.as_str()).unwrap_or("משבצת");
            let name = e.display_name();
            let name = if name.is_empty() { "ריק" } else { name.as_str() };
            format!("{}: {} ({}) - {}", e.date, label, role, name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(safety_note: &str, summary: &str) -> String {
    format!(
        "You are an assistant for a rehabilitation care coordinator.\n\
         Analyze the following weekly schedule and identify critical gaps \
         (missing escorts or days with no visitors).\n\
         Keep it brief and in Hebrew. Mention if safety rules are being met.\n\n\
         Safety Note: {safety_note}\n\n\
         Schedule:\n{summary}"
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Client for the `generateContent` endpoint.
#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for AnalysisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl AnalysisClient {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, AnalysisError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Ask the model about gaps in the schedule.
    ///
    /// # Errors
    /// `Disabled` without an API key, otherwise network, status or
    /// empty-output failures.
    #[tracing::instrument(skip_all, fields(events = events.len()))]
    pub async fn try_analyze(&self, events: &[CareEvent], settings: &AppSettings) -> Result<String, AnalysisError> {
        let api_key = self.api_key.as_deref().ok_or(AnalysisError::Disabled)?;

        let summary = schedule_summary(events, settings);
        let prompt = build_prompt(&settings.safety_note, &summary);
        let body = GenerateRequest {
            system_instruction: Content {
                parts: vec![Part { text: SYSTEM_INSTRUCTION }],
            },
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "analysis request failed");
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.text().ok_or(AnalysisError::EmptyResponse)
    }

    /// Like [`try_analyze`](Self::try_analyze), but failures become the
    /// fixed fallback text.
    pub async fn analyze(&self, events: &[CareEvent], settings: &AppSettings) -> String {
        match self.try_analyze(events, settings).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("schedule analysis failed: {}", e);
                e.fallback_text().to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventStatus;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event(slot: &str, first: Option<&str>) -> CareEvent {
        let mut data = BTreeMap::new();
        if let Some(first) = first {
            data.insert("firstName".to_string(), first.to_string());
            data.insert("lastName".to_string(), "Levi".to_string());
        }
        CareEvent {
            id: "e1".into(),
            slot_id: slot.into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            status: EventStatus::Pending,
            registration_data: data,
            creator_id: "public".into(),
        }
    }

    fn client(server: &MockServer, key: Option<&str>) -> AnalysisClient {
        AnalysisClient::new(key.map(String::from), "test-model", server.uri()).unwrap()
    }

    #[test]
    fn test_summary_lines() {
        let settings = AppSettings::default();
        let events = vec![event("s1", Some("Dana")), event("gone", None)];
        let summary = schedule_summary(&events, &settings);
        let lines: Vec<_> = summary.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("2025-03-03: "));
        assert!(lines[0].ends_with("- Dana Levi"));
        assert_eq!(lines[1], "2025-03-03: משבצת (מבקר) - ריק");
    }

    #[tokio::test]
    async fn test_analyze_returns_model_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .and(query_param("key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "הכל "}, {"text": "תקין"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server, Some("k"))
            .analyze(&[event("s1", Some("Dana"))], &AppSettings::default())
            .await;
        assert_eq!(text, "הכל תקין");
    }

    #[tokio::test]
    async fn test_empty_candidates_fall_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
            .mount(&server)
            .await;

        let c = client(&server, Some("k"));
        let settings = AppSettings::default();
        assert!(matches!(
            c.try_analyze(&[], &settings).await,
            Err(AnalysisError::EmptyResponse)
        ));
        assert_eq!(c.analyze(&[], &settings).await, "לא הצלחתי לנתח את הלוח כרגע.");
    }

    #[tokio::test]
    async fn test_api_error_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let c = client(&server, Some("k"));
        let settings = AppSettings::default();
        match c.try_analyze(&[], &settings).await {
            Err(AnalysisError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "denied");
            }
            other => panic!("expected api error, got {other:?}"),
        }
        assert_eq!(c.analyze(&[], &settings).await, "שגיאה בחיבור לבינה המלאכותית.");
    }

    #[tokio::test]
    async fn test_disabled_without_key() {
        let server = MockServer::start().await;
        let c = client(&server, Some("  "));
        assert!(!c.is_enabled());
        assert!(matches!(
            c.try_analyze(&[], &AppSettings::default()).await,
            Err(AnalysisError::Disabled)
        ));
    }
}
