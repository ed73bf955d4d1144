use std::future::Future;

use reqwest::Url;
use tracing::{debug, warn};

use crate::error::{EndpointError, FetchError};

/// One upstream base URL plus a log-safe label.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: String,
    /// Host (and port) only. Paths and query strings often carry API keys.
    pub label: String,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Self, String> {
        let parsed = Url::parse(url.trim()).map_err(|e| format!("invalid URL: {}", e))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(format!("unsupported scheme '{}'", parsed.scheme()));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| "URL has no host".to_string())?;
        let label = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Endpoint {
            url: url.trim().to_string(),
            label,
        })
    }
}

/// Try `attempt` against each endpoint in order and return the first success.
///
/// Every failure is logged and the next endpoint is tried; only when the whole
/// list is exhausted does the caller see an error.
pub async fn first_success<'a, T, F, Fut>(
    operation: &str,
    endpoints: &'a [Endpoint],
    mut attempt: F,
) -> Result<T, FetchError>
where
    F: FnMut(&'a Endpoint) -> Fut,
    Fut: Future<Output = Result<T, EndpointError>>,
{
    let mut last = None;

    for endpoint in endpoints {
        match attempt(endpoint).await {
            Ok(value) => {
                debug!(operation, endpoint = %endpoint.label, "upstream call succeeded");
                return Ok(value);
            }
            Err(e) => {
                warn!(
                    operation,
                    endpoint = %endpoint.label,
                    error = %e,
                    "upstream call failed, trying next endpoint"
                );
                last = Some(e);
            }
        }
    }

    match last {
        Some(last) => Err(FetchError::Exhausted {
            operation: operation.to_string(),
            attempts: endpoints.len(),
            last,
        }),
        None => Err(FetchError::NoEndpoints {
            operation: operation.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn endpoints(n: usize) -> Vec<Endpoint> {
        (0..n)
            .map(|i| format!("https://node{}.example.com/v1/secret-key", i))
            .map(|url| Endpoint::parse(&url).unwrap())
            .collect()
    }

    #[test]
    fn test_label_strips_path_and_query() {
        let ep = Endpoint::parse("https://base.example.com/v2/abc123?apikey=xyz").unwrap();
        assert_eq!(ep.label, "base.example.com");

        let ep = Endpoint::parse("http://127.0.0.1:8545").unwrap();
        assert_eq!(ep.label, "127.0.0.1:8545");
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(Endpoint::parse("not a url").is_err());
        assert!(Endpoint::parse("ftp://example.com").is_err());
    }

    #[tokio::test]
    async fn test_returns_first_success_in_order() {
        let eps = endpoints(3);
        let tried = RefCell::new(Vec::new());
        let result = first_success("op", &eps, |ep| {
            tried.borrow_mut().push(ep.label.clone());
            let ok = ep.label.starts_with("node1");
            let label = ep.label.clone();
            async move {
                if ok {
                    Ok(label)
                } else {
                    Err(EndpointError::Status(502))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "node1.example.com");
        assert_eq!(
            tried.into_inner(),
            vec!["node0.example.com".to_string(), "node1.example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_error() {
        let eps = endpoints(2);
        let err = first_success::<(), _, _>("eth_getBalance", &eps, |_| async {
            Err(EndpointError::Decode("expected value".to_string()))
        })
        .await
        .unwrap_err();

        match err {
            FetchError::Exhausted {
                operation,
                attempts,
                last,
            } => {
                assert_eq!(operation, "eth_getBalance");
                assert_eq!(attempts, 2);
                assert!(matches!(last, EndpointError::Decode(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_endpoints() {
        let err = first_success::<(), _, _>("eth_getCode", &[], |_| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NoEndpoints { .. }));
    }
}
