//! Query analysis through the OpenAI chat completions API
//!
//! A plain-language request is turned into keywords, example titles and a
//! single catalogue query. The model is asked for a JSON object; replies
//! that wrap the object in prose are still accepted.

use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::http::HttpBackend;
use crate::config::{NetworkConfig, OpenAiConfig};
use crate::error::{Result, ShelfmarkError};
use crate::models::SearchTerms;

lazy_static::lazy_static! {
    static ref OBJECT_RE: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

const SYSTEM_PROMPT: &str = "You are a helpful assistant designed to output JSON.";

/// Chat completion response, reduced to what is read
#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// Client that extracts catalogue search terms from a request
pub struct OpenAiClient {
    http: Arc<dyn HttpBackend>,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client; the API key is checked on each call
    pub fn new(
        http: Arc<dyn HttpBackend>,
        openai: &OpenAiConfig,
        network: &NetworkConfig,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: openai.base_url.trim_end_matches('/').to_string(),
            model: openai.model.clone(),
            temperature: openai.temperature,
            timeout: Duration::from_secs(network.openai_timeout),
            api_key: api_key.into(),
        }
    }

    /// Analyze a request and return the extracted search terms
    pub async fn analyze(&self, user_query: &str) -> Result<SearchTerms> {
        if self.api_key.trim().is_empty() {
            return Err(ShelfmarkError::Config(format!(
                "OpenAI API key is not configured (set {})",
                crate::config::OPENAI_API_KEY_ENV
            )));
        }

        let url = Url::parse(&format!("{}/chat/completions", self.base_url))?;
        let body = self.request_body(user_query);

        let response = self
            .http
            .post_json(&url, Some(&self.api_key), &body, self.timeout)
            .await?;

        let completion: ChatCompletion = serde_json::from_str(&response)
            .map_err(|e| ShelfmarkError::Analysis(format!("unexpected response: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let terms = parse_terms(&content);
        tracing::debug!("Extracted search terms: {:?}", terms);
        Ok(terms)
    }

    fn request_body(&self, user_query: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(user_query)},
            ],
            "response_format": {"type": "json_object"},
            "temperature": self.temperature,
        })
    }
}

/// Prompt asking for keywords, titles and one catalogue query
pub fn build_prompt(user_query: &str) -> String {
    format!(
        r#"당신은 한국 도서 추천 전문가입니다. 아래 사용자 요청을 분석하여 도서관 정보나루 도서 검색(/api/srchBooks)에 가장 알맞은 검색 정보를 만들어 주세요.

사용자 요청: "{query}"

단계:
1. 요청의 핵심 주제나 의도를 파악합니다.
2. 주제와 관련된 한국어 핵심 키워드를 1-3개 고릅니다.
3. 요청에 어울리는 도서 제목 예시를 1-2개 제안합니다.
4. 키워드나 제목을 바탕으로 도서 검색에 쓸 간결하고 명확한 검색어 1개를 만듭니다.

출력 형식 (JSON):
{{
  "keywords": ["키워드1", "키워드2"],
  "titles": ["제목 예시 1", "제목 예시 2"],
  "narou_query": "최종 검색어"
}}

검색어가 너무 넓거나 모호하지 않은지 확인한 뒤, 설명 없이 JSON만 출력하세요."#,
        query = user_query.trim()
    )
}

/// Decode model output into search terms.
///
/// Falls back to the outermost `{...}` span when the whole reply is not
/// JSON, and to empty terms when nothing decodes.
pub fn parse_terms(content: &str) -> SearchTerms {
    if let Ok(value) = serde_json::from_str::<Value>(content) {
        return terms_from_value(&value);
    }

    tracing::warn!("Model reply is not plain JSON, looking for an embedded object");

    let Some(m) = OBJECT_RE.find(content) else {
        tracing::warn!("No JSON object found in model reply");
        return SearchTerms::default();
    };

    match serde_json::from_str::<Value>(m.as_str()) {
        Ok(value) => terms_from_value(&value),
        Err(e) => {
            tracing::warn!("Embedded object failed to decode: {}", e);
            SearchTerms::default()
        }
    }
}

fn terms_from_value(value: &Value) -> SearchTerms {
    SearchTerms {
        keywords: string_list(value.get("keywords")),
        titles: string_list(value.get("titles")),
        query: value
            .get("narou_query")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
