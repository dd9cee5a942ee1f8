//! Web tools: web_search and web_fetch.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::ToolHandler;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Web search via the Brave Search API.
pub struct WebSearchTool {
    api_key: String,
    max_results: u32,
}

impl WebSearchTool {
    pub fn new(api_key: Option<String>, max_results: u32) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("BRAVE_API_KEY").ok())
            .unwrap_or_default();
        Self {
            api_key,
            max_results,
        }
    }
}

#[derive(Deserialize)]
struct WebSearchArgs {
    query: String,
    count: Option<u32>,
}

#[async_trait]
impl ToolHandler for WebSearchTool {
    fn name(&self) -> &str {
        super::WEB_SEARCH_TOOL
    }
    fn description(&self) -> &str {
        "Search the web. Returns titles, URLs, and snippets."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" },
                "count": { "type": "integer", "description": "Number of results (1-10)", "minimum": 1, "maximum": 10 }
            },
            "required": ["query"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        if self.api_key.is_empty() {
            return Ok("Error: BRAVE_API_KEY not configured".to_string());
        }
        let args: WebSearchArgs = serde_json::from_value(args)?;
        let count = args.count.unwrap_or(self.max_results).clamp(1, 10);
        debug!("web search: {}", args.query);

        let client = reqwest::Client::new();
        let response = client
            .get("https://api.search.brave.com/res/v1/web/search")
            .query(&[("q", &args.query), ("count", &count.to_string())])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(format!("Error: search API returned {}", status));
        }

        let data: serde_json::Value = response.json().await?;
        let results = data
            .get("web")
            .and_then(|w| w.get("results"))
            .and_then(|r| r.as_array());

        let Some(results) = results.filter(|r| !r.is_empty()) else {
            return Ok(format!("No results for: {}", args.query));
        };

        let mut lines = vec![format!("Results for: {}", args.query)];
        for (i, item) in results.iter().take(count as usize).enumerate() {
            let title = item.get("title").and_then(|t| t.as_str()).unwrap_or("");
            let url = item.get("url").and_then(|u| u.as_str()).unwrap_or("");
            let desc = item
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or("");
            lines.push(format!("{}. {}", i + 1, title));
            lines.push(format!("   {}", url));
            if !desc.is_empty() {
                lines.push(format!("   {}", desc));
            }
        }
        Ok(lines.join("\n"))
    }
}

/// Fetch a URL and extract readable text.
pub struct WebFetchTool {
    max_chars: usize,
}

impl WebFetchTool {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for WebFetchTool {
    fn default() -> Self {
        Self::new(50000)
    }
}

#[derive(Deserialize)]
struct WebFetchArgs {
    url: String,
    max_chars: Option<usize>,
}

#[async_trait]
impl ToolHandler for WebFetchTool {
    fn name(&self) -> &str {
        super::WEB_FETCH_TOOL
    }
    fn description(&self) -> &str {
        "Fetch a URL and extract readable text content."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "URL to fetch" },
                "max_chars": { "type": "integer", "minimum": 100 }
            },
            "required": ["url"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: WebFetchArgs = serde_json::from_value(args)?;
        let max_chars = args.max_chars.unwrap_or(self.max_chars);
        debug!("fetching {}", args.url);

        let client = reqwest::Client::new();
        let response = client
            .get(&args.url)
            .header("User-Agent", USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await?;

        let (content, extractor) = if content_type.contains("application/json") {
            (body, "json")
        } else if content_type.contains("text/html") {
            (extract_readable(&body), "html")
        } else {
            (body, "raw")
        };

        let truncated = content.len() > max_chars;
        let content = if truncated {
            super::truncate_at_boundary(&content, max_chars).to_string()
        } else {
            content
        };

        Ok(json!({
            "url": args.url,
            "status": status.as_u16(),
            "extractor": extractor,
            "truncated": truncated,
            "text": content
        })
        .to_string())
    }
}

/// Pull the title plus body text out of an HTML page.
fn extract_readable(html: &str) -> String {
    let document = scraper::Html::parse_document(html);

    let title = scraper::Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let body = html2text::from_read(html.as_bytes(), 100);

    match title {
        Some(title) => format!("# {}\n\n{}", title, body),
        None => body,
    }
}
