//! Enrichment work for the domain services this worker knows how to run.

use std::time::Duration;

use chrono::Utc;
use enrichly_application::QueuedJob;
use enrichly_domain::CompletionOutcome;
use scraper::{Html, Selector};
use serde_json::{Map, Value, json};
use tokio::net::lookup_host;

/// Services with an executor in this worker.
pub const SUPPORTED_SERVICES: &[&str] = &[
    "domain_testing",
    "domain_a_record_testing",
    "domain_web_content_extraction",
];

const DOMAIN_ATTRIBUTE: &str = "domain";
const MAX_SUMMARY_LENGTH: usize = 300;

/// Result of running one job, reported back through the completion callback.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub outcome: CompletionOutcome,
    pub metadata: Map<String, Value>,
    pub error_message: Option<String>,
    pub attribute_updates: Option<Map<String, Value>>,
}

impl ExecutionReport {
    fn success(metadata: Map<String, Value>, attribute_updates: Map<String, Value>) -> Self {
        Self {
            outcome: CompletionOutcome::Success,
            metadata,
            error_message: None,
            attribute_updates: Some(attribute_updates),
        }
    }

    fn failed(
        error_message: impl Into<String>,
        metadata: Map<String, Value>,
        attribute_updates: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            outcome: CompletionOutcome::Failed,
            metadata,
            error_message: Some(error_message.into()),
            attribute_updates,
        }
    }
}

/// Runs queued jobs against DNS and HTTP.
#[derive(Clone)]
pub struct JobExecutor {
    http_client: reqwest::Client,
    lookup_timeout: Duration,
}

impl JobExecutor {
    pub fn new(http_client: reqwest::Client, lookup_timeout: Duration) -> Self {
        Self {
            http_client,
            lookup_timeout,
        }
    }

    pub async fn execute(&self, job: &QueuedJob) -> ExecutionReport {
        let Some(domain) = job
            .attributes
            .get(DOMAIN_ATTRIBUTE)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|domain| !domain.is_empty())
        else {
            return ExecutionReport::failed(
                format!("entity {} has no '{DOMAIN_ATTRIBUTE}' attribute", job.entity),
                Map::new(),
                None,
            );
        };

        match job.service_name.as_str() {
            "domain_testing" => self.test_dns(domain).await,
            "domain_a_record_testing" => self.test_www_a_record(domain).await,
            "domain_web_content_extraction" => self.extract_web_content(domain).await,
            other => ExecutionReport::failed(
                format!("worker has no executor for service '{other}'"),
                Map::new(),
                None,
            ),
        }
    }

    /// Marks `dns` true when the domain resolves; timeouts leave it unset for a retry.
    async fn test_dns(&self, domain: &str) -> ExecutionReport {
        let mut metadata = Map::new();
        metadata.insert("domain_name".to_owned(), json!(domain));

        match self.resolve(domain).await {
            Lookup::Resolved(addresses) => {
                metadata.insert("addresses".to_owned(), json!(addresses));
                ExecutionReport::success(metadata, attributes([("dns", json!(true))]))
            }
            Lookup::Unresolved(error) => ExecutionReport::failed(
                format!("DNS test failed: {error}"),
                metadata,
                Some(attributes([("dns", json!(false))])),
            ),
            Lookup::TimedOut => ExecutionReport::failed("DNS lookup timed out", metadata, None),
        }
    }

    async fn test_www_a_record(&self, domain: &str) -> ExecutionReport {
        let host = format!("www.{domain}");
        let mut metadata = Map::new();
        metadata.insert("host".to_owned(), json!(host));

        match self.resolve(host.as_str()).await {
            Lookup::Resolved(addresses) => {
                let first = addresses.first().cloned().unwrap_or_default();
                ExecutionReport::success(
                    metadata,
                    attributes([("www", json!(true)), ("a_record_ip", json!(first))]),
                )
            }
            Lookup::Unresolved(error) => ExecutionReport::failed(
                format!("A record test failed: {error}"),
                metadata,
                Some(attributes([("www", json!(false))])),
            ),
            Lookup::TimedOut => ExecutionReport::failed("A record lookup timed out", metadata, None),
        }
    }

    async fn extract_web_content(&self, domain: &str) -> ExecutionReport {
        let url = format!("https://{domain}");
        let mut metadata = Map::new();
        metadata.insert("url".to_owned(), json!(url));

        let response = match self.http_client.get(url.as_str()).send().await {
            Ok(response) => response,
            Err(error) => {
                return ExecutionReport::failed(
                    format!("failed to fetch {url}: {error}"),
                    metadata,
                    None,
                );
            }
        };

        let status = response.status();
        metadata.insert("status_code".to_owned(), json!(status.as_u16()));
        if !status.is_success() {
            return ExecutionReport::failed(
                format!("{url} returned status {}", status.as_u16()),
                metadata,
                None,
            );
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(error) => {
                return ExecutionReport::failed(
                    format!("failed to read body of {url}: {error}"),
                    metadata,
                    None,
                );
            }
        };

        let summary = PageSummary::parse(body.as_str());
        let content = json!({
            "url": url,
            "status_code": status.as_u16(),
            "title": summary.title,
            "description": summary.description,
            "content_length": body.len(),
            "extracted_at": Utc::now().to_rfc3339(),
        });

        ExecutionReport::success(metadata, attributes([("web_content_data", content)]))
    }

    async fn resolve(&self, host: &str) -> Lookup {
        match tokio::time::timeout(self.lookup_timeout, lookup_host((host, 80))).await {
            Err(_) => Lookup::TimedOut,
            Ok(Err(error)) => Lookup::Unresolved(error.to_string()),
            Ok(Ok(addresses)) => {
                let addresses: Vec<String> =
                    addresses.map(|address| address.ip().to_string()).collect();
                if addresses.is_empty() {
                    Lookup::Unresolved("no addresses returned".to_owned())
                } else {
                    Lookup::Resolved(addresses)
                }
            }
        }
    }
}

enum Lookup {
    Resolved(Vec<String>),
    Unresolved(String),
    TimedOut,
}

fn attributes<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

/// Title and meta description of a fetched page.
#[derive(Debug, Default, PartialEq, Eq)]
struct PageSummary {
    title: Option<String>,
    description: Option<String>,
}

impl PageSummary {
    fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);

        Self {
            title: first_text(&document, "title"),
            description: first_attribute(&document, "meta[name=description]", "content"),
        }
    }
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| normalize(element.text().collect::<String>().as_str()))
}

fn first_attribute(document: &Html, selector: &str, attribute: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .find_map(|element| element.value().attr(attribute))
        .and_then(normalize)
}

/// Collapses whitespace and caps the length; blank values become `None`.
fn normalize(value: &str) -> Option<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    Some(collapsed.chars().take(MAX_SUMMARY_LENGTH).collect())
}
