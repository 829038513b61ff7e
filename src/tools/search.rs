//! search tool - web search via the Serper API
//!
//! The API key is injected at construction; the engine never reads or
//! mutates process environment during a run.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{Tool, ToolResult};

/// Default number of results returned per query
const DEFAULT_MAX_RESULTS: usize = 5;

/// Search the web using Serper (google.serper.dev)
pub struct SerperSearchTool {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl SerperSearchTool {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, "https://google.serper.dev".to_string())
    }

    /// Override the endpoint (used by tests against a local server)
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            api_key,
            base_url,
            http,
        }
    }

    async fn search(&self, query: &str, max_results: usize) -> ToolResult {
        debug!(%query, max_results, "search: called");

        let body = serde_json::json!({
            "q": query,
            "num": max_results,
        });

        let response = match self
            .http
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return ToolResult::error(format!("Search request failed: {}", e)),
        };

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return ToolResult::error(format!("Serper API error {}: {}", status, error_text));
        }

        let result: Value = match response.json().await {
            Ok(r) => r,
            Err(e) => return ToolResult::error(format!("Failed to parse response: {}", e)),
        };

        format_organic_results(&result, max_results)
    }
}

/// Format Serper organic results into a ranked snippet list
fn format_organic_results(result: &Value, max_results: usize) -> ToolResult {
    let results = match result["organic"].as_array() {
        Some(r) if !r.is_empty() => r,
        _ => return ToolResult::success("No results found"),
    };

    let output: Vec<String> = results
        .iter()
        .take(max_results)
        .enumerate()
        .map(|(i, r)| {
            let title = r["title"].as_str().unwrap_or("(no title)");
            let link = r["link"].as_str().unwrap_or("");
            let snippet = r["snippet"].as_str().unwrap_or("");
            format!("{}. {}\n   {}\n   {}\n", i + 1, title, link, truncate(snippet, 200))
        })
        .collect();

    ToolResult::success(output.join("\n"))
}

/// Truncate string to at most `max_len` bytes, cutting on a char boundary
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    // Snippets carry multibyte text (accented place names, ₹ amounts), so
    // the cut must land on a boundary, never inside a character.
    let end = s
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= max_len)
        .last()
        .unwrap_or(0);
    format!("{}...", &s[..end])
}

#[async_trait]
impl Tool for SerperSearchTool {
    fn name(&self) -> &'static str {
        "search"
    }

    fn description(&self) -> &'static str {
        "Search the web for current information such as flight prices, attractions, and weather."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum results to return (default: 5)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        let query = match input["query"].as_str() {
            Some(q) => q,
            None => return ToolResult::error("query is required"),
        };
        let max_results = input["max_results"].as_u64().unwrap_or(DEFAULT_MAX_RESULTS as u64) as usize;

        self.search(query, max_results).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_missing_query() {
        let tool = SerperSearchTool::new("test-key".to_string());
        let result = tool.execute(serde_json::json!({})).await;
        assert!(result.is_error);
        assert!(result.content.contains("query is required"));
    }

    #[test]
    fn test_format_organic_results() {
        let payload = serde_json::json!({
            "organic": [
                {"title": "Cheap flights", "link": "https://example.com/a", "snippet": "From $450 round trip"},
                {"title": "More flights", "link": "https://example.com/b", "snippet": "Nonstop options"}
            ]
        });
        let result = format_organic_results(&payload, 5);
        assert!(!result.is_error);
        assert!(result.content.contains("1. Cheap flights"));
        assert!(result.content.contains("2. More flights"));
        assert!(result.content.contains("From $450 round trip"));
    }

    #[test]
    fn test_format_empty_results() {
        let payload = serde_json::json!({"organic": []});
        let result = format_organic_results(&payload, 5);
        assert!(!result.is_error);
        assert_eq!(result.content, "No results found");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is a ...");
    }

    #[test]
    fn test_truncate_multibyte_boundary() {
        // byte 200 falls inside the two-byte 'é'
        let snippet = format!("{}économique", "a".repeat(199));
        let cut = truncate(&snippet, 200);
        assert_eq!(cut, format!("{}...", "a".repeat(199)));

        // every boundary of "₹" (3 bytes) misses 200
        let rupees = "₹".repeat(90);
        let cut = truncate(&rupees, 200);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= 203);
    }

    #[test]
    fn test_format_results_with_multibyte_snippets() {
        let payload = serde_json::json!({
            "organic": [
                {"title": "Cafés in Paris", "link": "https://example.com/a", "snippet": "café ".repeat(50)},
                {"title": "Hotels", "link": "https://example.com/b", "snippet": "₹".repeat(90)}
            ]
        });
        let result = format_organic_results(&payload, 5);
        assert!(!result.is_error);
        assert!(result.content.contains("1. Cafés in Paris"));
    }
}
