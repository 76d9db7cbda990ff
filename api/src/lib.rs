pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod utilities;

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, info};
use url::Url;

pub use crate::db::ApiHubDb;
pub use crate::error::{ApiHubError, Result};

use crate::{
    config::{Config, TesterConfig},
    domain::{
        request::{RequestDescriptor, TestRequestInput},
        response::{DispatchError, DispatchOutcome, ExecutionResult},
    },
    utilities::{
        request::{convert_http_method, normalize},
        response::{classify, completed, dispatch_error},
    },
};

/// Shared handle for the tester and the store. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ApiHub {
    pub client: reqwest::Client,
    pub db: ApiHubDb,
    pub tester: TesterConfig,
}

impl ApiHub {
    pub async fn new(config: &Config) -> Result<Self> {
        let db = ApiHubDb::connect(&config.database).await?;
        Self::with_db(db, config.tester.clone())
    }

    pub fn with_db(db: ApiHubDb, tester: TesterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(tester.user_agent.clone())
            .build()?;
        Ok(ApiHub { client, db, tester })
    }

    /// Normalizes raw form input and dispatches it.
    pub async fn test_request(&self, mut input: TestRequestInput) -> Result<ExecutionResult> {
        if input.timeout_ms.is_none() {
            input.timeout_ms = Some(self.tester.default_timeout_ms);
        }
        let descriptor = normalize(input)?;
        self.execute(&descriptor).await
    }

    /// Performs exactly one outbound request, never retried.
    ///
    /// Only a URL that is not absolute http(s) is an error. Every transport
    /// problem, status code and body comes back as an `ExecutionResult`.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ExecutionResult> {
        let url = Url::parse(&descriptor.url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| {
                ApiHubError::validation(format!(
                    "'{}' is not an absolute http(s) url",
                    descriptor.url
                ))
            })?;

        info!("submitting {} {}", descriptor.method, url);
        let started = Instant::now();
        let outcome = match build_headers(descriptor) {
            Ok(headers) => self.dispatch(descriptor, url, headers).await,
            Err(error) => DispatchOutcome::Failed(error),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = classify(outcome, elapsed_ms);
        debug!(
            "{} {} finished in {}ms with status {}",
            descriptor.method,
            descriptor.url,
            elapsed_ms,
            result.status()
        );
        Ok(result)
    }

    async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        url: Url,
        headers: HeaderMap,
    ) -> DispatchOutcome {
        let mut req = self
            .client
            .request(convert_http_method(descriptor.method), url)
            .headers(headers)
            .timeout(Duration::from_millis(descriptor.timeout_ms));
        if let Some(body) = &descriptor.body_text {
            req = req.body(body.clone());
        }

        let res = match req.send().await {
            Ok(res) => res,
            Err(e) => return DispatchOutcome::Failed(dispatch_error(&e)),
        };
        let status = res.status();
        let headers = res.headers().clone();
        match res.bytes().await {
            Ok(body) => DispatchOutcome::Completed(completed(status, &headers, &body)),
            Err(e) => DispatchOutcome::Failed(dispatch_error(&e)),
        }
    }
}

fn build_headers(descriptor: &RequestDescriptor) -> std::result::Result<HeaderMap, DispatchError> {
    let mut headers = HeaderMap::new();
    for header in descriptor.headers.iter() {
        let name = HeaderName::from_bytes(header.key.as_bytes()).map_err(|e| DispatchError::Client {
            message: format!("invalid header name '{}': {}", header.key, e),
            status: None,
        })?;
        let value = HeaderValue::from_str(&header.value).map_err(|e| DispatchError::Client {
            message: format!("invalid value for header '{}': {}", header.key, e),
            status: None,
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}
