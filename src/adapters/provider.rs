use crate::domain::model::{FetchRequest, Record};
use crate::domain::ports::{RecordFetcher, RecordSink};
use crate::utils::error::{FetchError, MonitorError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// 透過 HTTP 向外部 provider 抓取記錄並寫入資料集
pub struct ProviderFetcher<W: RecordSink + ?Sized> {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    sink: Arc<W>,
}

impl<W: RecordSink + ?Sized> ProviderFetcher<W> {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        request_timeout: Duration,
        sink: Arc<W>,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| MonitorError::InvalidConfigValueError {
            field: "provider.endpoint".to_string(),
            value: endpoint.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| MonitorError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            sink,
        })
    }

    fn request_url(&self, request: &FetchRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("industry", &request.pair.industry)
            .append_pair("country", &request.pair.country)
            .append_pair("limit", &request.limit.to_string());
        url
    }

    async fn download(&self, request: &FetchRequest) -> std::result::Result<Vec<Record>, FetchError> {
        let url = self.request_url(request);
        tracing::debug!("Making provider request to: {}", url);

        let mut builder = self.client.get(url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await.map_err(|e| FetchError::Network {
            message: e.to_string(),
        })?;

        let status = response.status();
        tracing::debug!("Provider response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(FetchError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Provider {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| FetchError::Provider {
            status: status.as_u16(),
            message: format!("invalid JSON body: {}", e),
        })?;
        Ok(parse_records(body, request.limit))
    }
}

/// 接受物件陣列，或包在 `records` / `data` 欄位中的陣列；非物件項目略過
fn parse_records(body: serde_json::Value, limit: usize) -> Vec<Record> {
    let items = match body {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj
            .remove("records")
            .or_else(|| obj.remove("data"))
        {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::Object(data) => Some(Record { data }),
            _ => None,
        })
        .take(limit)
        .collect()
}

#[async_trait]
impl<W: RecordSink + ?Sized> RecordFetcher for ProviderFetcher<W> {
    async fn fetch_and_persist(
        &self,
        request: &FetchRequest,
        deadline: Instant,
    ) -> std::result::Result<usize, FetchError> {
        let work = async {
            let records = self.download(request).await?;
            if records.is_empty() {
                tracing::warn!(pair = %request.pair, "Provider returned no records");
                return Ok(0);
            }
            self.sink
                .append_records(&request.pair, records)
                .await
                .map_err(|e| FetchError::Persistence {
                    message: e.to_string(),
                })
        };

        match tokio::time::timeout_at(deadline, work).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::DeadlineExceeded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryDataset;
    use crate::domain::model::IndustryCountryPair;
    use crate::domain::ports::CoverageStore;
    use httpmock::prelude::*;

    fn request(limit: usize) -> FetchRequest {
        FetchRequest {
            pair: IndustryCountryPair::new("florists", "fr"),
            limit,
        }
    }

    fn fetcher(server: &MockServer, sink: Arc<MemoryDataset>) -> ProviderFetcher<MemoryDataset> {
        ProviderFetcher::new(
            &server.url("/records"),
            Some("secret".to_string()),
            Duration::from_secs(5),
            sink,
        )
        .unwrap()
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[test]
    fn test_parse_records_shapes() {
        let array = serde_json::json!([{"id": 1}, {"id": 2}, "junk", {"id": 3}]);
        assert_eq!(parse_records(array, 10).len(), 3);

        let wrapped = serde_json::json!({"records": [{"id": 1}, {"id": 2}]});
        assert_eq!(parse_records(wrapped, 1).len(), 1);

        let data = serde_json::json!({"data": [{"id": 1}]});
        assert_eq!(parse_records(data, 10).len(), 1);

        assert!(parse_records(serde_json::json!("nope"), 10).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_persists_records_up_to_limit() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/records")
                .query_param("industry", "florists")
                .query_param("country", "fr")
                .query_param("limit", "2")
                .header("Authorization", "Bearer secret");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([{"id": 1}, {"id": 2}, {"id": 3}]));
        });

        let sink = Arc::new(MemoryDataset::new(vec!["florists".into()], vec!["fr".into()]));
        let written = fetcher(&server, sink.clone())
            .fetch_and_persist(&request(2), far_deadline())
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(written, 2);
        assert_eq!(sink.count_for_pair(&request(2).pair).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_is_typed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/records");
            then.status(429).header("Retry-After", "12");
        });

        let sink = Arc::new(MemoryDataset::default());
        let err = fetcher(&server, sink)
            .fetch_and_persist(&request(5), far_deadline())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FetchError::RateLimited {
                retry_after: Some(Duration::from_secs(12))
            }
        );
    }

    #[tokio::test]
    async fn test_server_error_is_provider_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/records");
            then.status(503).body("maintenance");
        });

        let sink = Arc::new(MemoryDataset::default());
        let err = fetcher(&server, sink)
            .fetch_and_persist(&request(5), far_deadline())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Provider { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_slow_provider_hits_deadline() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/records");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(serde_json::json!([{"id": 1}]));
        });

        let sink = Arc::new(MemoryDataset::default());
        let err = fetcher(&server, sink)
            .fetch_and_persist(&request(5), Instant::now() + Duration::from_millis(50))
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::DeadlineExceeded);
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let result = ProviderFetcher::new(
            "not a url",
            None,
            Duration::from_secs(1),
            Arc::new(MemoryDataset::default()),
        );
        assert!(matches!(
            result,
            Err(MonitorError::InvalidConfigValueError { .. })
        ));
    }
}
