//! DOAJ (Directory of Open Access Journals) search API client
//!
//! Article search maps a DOI to its journal ISSN; journal search returns the
//! journal record including its editorial review process.

use serde_json::Value;
use thiserror::Error;

/// DOAJ client errors
#[derive(Debug, Error)]
pub enum DoajError {
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 4xx: DOAJ has nothing for this query
    #[error("No DOAJ data found ({0})")]
    NotFound(u16),

    /// 5xx: DOAJ itself failed
    #[error("DOAJ server error {0}")]
    ServerError(u16),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// DOAJ API client
#[derive(Debug, Clone)]
pub struct DoajClient {
    http_client: reqwest::Client,
    articles_url: String,
    journals_url: String,
}

impl DoajClient {
    pub fn new(http_client: reqwest::Client, articles_url: &str, journals_url: &str) -> Self {
        Self {
            http_client,
            articles_url: articles_url.to_string(),
            journals_url: journals_url.to_string(),
        }
    }

    /// Article search by DOI, e.g. `.../articles/doi:10.3389%2Ffpsyg.2013.00479`
    pub async fn search_articles_by_doi(&self, doi: &str) -> Result<Value, DoajError> {
        let url = format!("{}doi:{}", self.articles_url, urlencoding::encode(doi));
        tracing::debug!(doi = %doi, url = %url, "Fetching ISSN from DOAJ");
        self.fetch(&url).await
    }

    /// Journal search by ISSN, e.g. `.../journals/issn%3A1664-1078`
    pub async fn search_journals_by_issn(&self, issn: &str) -> Result<Value, DoajError> {
        let query = format!("issn:{}", issn);
        let url = format!("{}{}", self.journals_url, urlencoding::encode(&query));
        tracing::debug!(issn = %issn, url = %url, "Fetching review status from DOAJ");
        self.fetch(&url).await
    }

    async fn fetch(&self, url: &str) -> Result<Value, DoajError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| DoajError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status.is_server_error() {
            return Err(DoajError::ServerError(status.as_u16()));
        }

        if status.is_client_error() {
            return Err(DoajError::NotFound(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DoajError::NetworkError(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| DoajError::ParseError(e.to_string()))
    }
}

/// First ISSN of the first article result
pub fn first_issn(articles: &Value) -> Option<&str> {
    articles
        .pointer("/results/0/bibjson/journal/issns/0")
        .and_then(Value::as_str)
        .filter(|issn| !issn.is_empty())
}

/// Editorial review process text of the first journal result
pub fn review_process(journals: &Value) -> Option<&str> {
    journals
        .pointer("/results/0/bibjson/editorial_review/process")
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_issn() {
        let articles = json!({
            "results": [{ "bibjson": { "journal": { "issns": ["1664-1078", "1664-0000"] } } }]
        });
        assert_eq!(first_issn(&articles), Some("1664-1078"));
    }

    #[test]
    fn test_first_issn_missing() {
        assert_eq!(first_issn(&json!({ "results": [] })), None);
        assert_eq!(first_issn(&json!({ "results": [{ "bibjson": {} }] })), None);
        assert_eq!(
            first_issn(&json!({ "results": [{ "bibjson": { "journal": { "issns": [""] } } }] })),
            None
        );
    }

    #[test]
    fn test_review_process() {
        let journals = json!({
            "results": [{ "bibjson": { "editorial_review": { "process": "Blind peer review" } } }]
        });
        assert_eq!(review_process(&journals), Some("Blind peer review"));
        assert_eq!(review_process(&json!({ "results": [{}] })), None);
    }
}
