//! Prometheus instant-query client.
//!
//! Issues `GET /api/v1/query?query=<expr>&time=<unix>` over HTTP or
//! HTTPS and decodes the JSON envelope. Only the vector
//! result type carries per-node samples; the other result types are
//! decoded so callers can report what they got.

use std::collections::HashMap;
use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tracing::debug;

use realload_core::{ConfigError, ConfigResult, PluginArgs};

use crate::error::{SampleError, SampleResult};

/// One series of an instant vector.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSample {
    pub metric: HashMap<String, String>,
    pub timestamp: f64,
    pub value: f64,
}

/// Decoded `data` section of a query response.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Vector(Vec<VectorSample>),
    Scalar(f64),
    /// Range vectors are never usable here; only the series count is kept.
    Matrix(usize),
    String(String),
}

impl QueryResult {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryResult::Vector(_) => "vector",
            QueryResult::Scalar(_) => "scalar",
            QueryResult::Matrix(_) => "matrix",
            QueryResult::String(_) => "string",
        }
    }
}

/// A successful query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub result: QueryResult,
    pub warnings: Vec<String>,
}

/// Anything that can evaluate an instant query.
pub trait MetricsSource: Send + Sync {
    fn query(
        &self,
        expr: &str,
        at: SystemTime,
    ) -> impl Future<Output = SampleResult<QueryResponse>> + Send;
}

// ── Wire format ────────────────────────────────────────────────

#[derive(Deserialize)]
struct ApiEnvelope {
    status: String,
    data: Option<ApiData>,
    #[serde(rename = "errorType")]
    error_type: Option<String>,
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

#[derive(Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
enum ApiData {
    Vector(Vec<ApiSample>),
    Scalar((f64, String)),
    Matrix(Vec<serde_json::Value>),
    String((f64, String)),
}

#[derive(Deserialize)]
struct ApiSample {
    #[serde(default)]
    metric: HashMap<String, String>,
    value: (f64, String),
}

fn parse_value(raw: &str) -> SampleResult<f64> {
    raw.parse::<f64>()
        .map_err(|_| SampleError::InvalidValue(raw.to_string()))
}

/// Decode a response body. `status` is the HTTP status it arrived with.
pub fn decode_response(status: http::StatusCode, body: &[u8]) -> SampleResult<QueryResponse> {
    let envelope: ApiEnvelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        // Proxies in front of Prometheus answer errors with non-JSON bodies.
        Err(_) if !status.is_success() => return Err(SampleError::Status(status)),
        Err(e) => return Err(e.into()),
    };

    if envelope.status == "error" {
        return Err(SampleError::Backend {
            error_type: envelope.error_type.unwrap_or_else(|| "unknown".to_string()),
            error: envelope.error.unwrap_or_default(),
        });
    }
    if !status.is_success() {
        return Err(SampleError::Status(status));
    }

    let result = match envelope.data {
        None => return Err(SampleError::Empty),
        Some(ApiData::Vector(samples)) => QueryResult::Vector(
            samples
                .into_iter()
                .map(|s| {
                    Ok(VectorSample {
                        metric: s.metric,
                        timestamp: s.value.0,
                        value: parse_value(&s.value.1)?,
                    })
                })
                .collect::<SampleResult<Vec<_>>>()?,
        ),
        Some(ApiData::Scalar((_, v))) => QueryResult::Scalar(parse_value(&v)?),
        Some(ApiData::Matrix(series)) => QueryResult::Matrix(series.len()),
        Some(ApiData::String((_, s))) => QueryResult::String(s),
    };

    Ok(QueryResponse {
        result,
        warnings: envelope.warnings,
    })
}

// ── Client ─────────────────────────────────────────────────────

/// HTTP(S) client for a single Prometheus server.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    http: reqwest::Client,
    /// `scheme://authority` of the server.
    origin: String,
    /// Path prefix when Prometheus sits behind a sub-path, without trailing `/`.
    path_prefix: String,
}

impl PrometheusClient {
    /// Build a client from a validated `http://` or `https://` base URI.
    pub fn new(base: &http::Uri) -> ConfigResult<Self> {
        let scheme = base.scheme_str().unwrap_or("http");
        let authority = base
            .authority()
            .map(|a| a.as_str())
            .ok_or_else(|| ConfigError::Invalid(format!("prometheus address {base} has no host")))?;

        let http = reqwest::Client::builder()
            .user_agent("realload/0.1")
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            origin: format!("{scheme}://{authority}"),
            path_prefix: base.path().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_args(args: &PluginArgs) -> ConfigResult<Self> {
        Self::new(&args.prometheus_uri()?)
    }

    /// Path and query for an instant query, relative to `origin`.
    fn query_target(&self, expr: &str, at: SystemTime) -> String {
        let time = at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        format!(
            "{}/api/v1/query?query={}&time={time:.3}",
            self.path_prefix,
            urlencoding::encode(expr)
        )
    }
}

impl MetricsSource for PrometheusClient {
    async fn query(&self, expr: &str, at: SystemTime) -> SampleResult<QueryResponse> {
        let url = format!("{}{}", self.origin, self.query_target(expr, at));
        debug!(%url, "querying prometheus");

        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        decode_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn decodes_vector() {
        let body = br#"{
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {"node": "node-a", "job": "node"}, "value": [1700000000.5, "12.5"]},
                    {"metric": {"node": "node-b"}, "value": [1700000000.5, "87"]}
                ]
            }
        }"#;

        let resp = decode_response(http::StatusCode::OK, body).unwrap();
        let QueryResult::Vector(samples) = resp.result else {
            panic!("expected vector");
        };
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].metric["node"], "node-a");
        assert_eq!(samples[0].value, 12.5);
        assert_eq!(samples[0].timestamp, 1700000000.5);
        assert_eq!(samples[1].value, 87.0);
        assert!(resp.warnings.is_empty());
    }

    #[test]
    fn decodes_special_float_values() {
        let body = br#"{"status":"success","data":{"resultType":"vector","result":[
            {"metric":{"node":"a"},"value":[1,"NaN"]},
            {"metric":{"node":"b"},"value":[1,"+Inf"]},
            {"metric":{"node":"c"},"value":[1,"-Inf"]}
        ]}}"#;

        let resp = decode_response(http::StatusCode::OK, body).unwrap();
        let QueryResult::Vector(samples) = resp.result else {
            panic!("expected vector");
        };
        assert!(samples[0].value.is_nan());
        assert_eq!(samples[1].value, f64::INFINITY);
        assert_eq!(samples[2].value, f64::NEG_INFINITY);
    }

    #[test]
    fn decodes_scalar_and_string() {
        let scalar = br#"{"status":"success","data":{"resultType":"scalar","result":[1,"3"]}}"#;
        let resp = decode_response(http::StatusCode::OK, scalar).unwrap();
        assert_eq!(resp.result, QueryResult::Scalar(3.0));
        assert_eq!(resp.result.kind(), "scalar");

        let string = br#"{"status":"success","data":{"resultType":"string","result":[1,"hello"]}}"#;
        let resp = decode_response(http::StatusCode::OK, string).unwrap();
        assert_eq!(resp.result, QueryResult::String("hello".to_string()));
    }

    #[test]
    fn decodes_matrix_as_series_count() {
        let body = br#"{"status":"success","data":{"resultType":"matrix","result":[
            {"metric":{"node":"a"},"values":[[1,"1"],[2,"2"]]}
        ]}}"#;
        let resp = decode_response(http::StatusCode::OK, body).unwrap();
        assert_eq!(resp.result, QueryResult::Matrix(1));
    }

    #[test]
    fn keeps_warnings() {
        let body = br#"{"status":"success","data":{"resultType":"vector","result":[]},"warnings":["partial response"]}"#;
        let resp = decode_response(http::StatusCode::OK, body).unwrap();
        assert_eq!(resp.warnings, vec!["partial response".to_string()]);
    }

    #[test]
    fn error_envelope_is_backend_error() {
        let body = br#"{"status":"error","errorType":"bad_data","error":"parse error at char 3"}"#;
        let err = decode_response(http::StatusCode::BAD_REQUEST, body).unwrap_err();
        match err {
            SampleError::Backend { error_type, error } => {
                assert_eq!(error_type, "bad_data");
                assert!(error.contains("parse error"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_json_error_is_status_error() {
        let err = decode_response(http::StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, SampleError::Status(s) if s == http::StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn garbage_success_body_is_decode_error() {
        let err = decode_response(http::StatusCode::OK, b"not json").unwrap_err();
        assert!(matches!(err, SampleError::Decode(_)));
    }

    #[test]
    fn unparsable_value_is_rejected() {
        let body = br#"{"status":"success","data":{"resultType":"vector","result":[
            {"metric":{"node":"a"},"value":[1,"twelve"]}
        ]}}"#;
        let err = decode_response(http::StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, SampleError::InvalidValue(v) if v == "twelve"));
    }

    #[test]
    fn client_splits_base_uri() {
        let client = PrometheusClient::new(&"http://prom.monitoring:9090/".parse().unwrap()).unwrap();
        assert_eq!(client.origin, "http://prom.monitoring:9090");
        assert_eq!(client.path_prefix, "");

        let client = PrometheusClient::new(&"http://gateway/prometheus".parse().unwrap()).unwrap();
        assert_eq!(client.origin, "http://gateway");
        assert_eq!(client.path_prefix, "/prometheus");
    }

    #[test]
    fn client_keeps_https_origin() {
        let client =
            PrometheusClient::new(&"https://prom.example.com:8443/select/0".parse().unwrap()).unwrap();
        assert_eq!(client.origin, "https://prom.example.com:8443");
        assert_eq!(client.path_prefix, "/select/0");
    }

    #[test]
    fn query_target_encodes_expression() {
        let client = PrometheusClient::new(&"http://prom:9090/prom/".parse().unwrap()).unwrap();
        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_250);
        let target = client.query_target("avg by (node) (rate(cpu[5m]))", at);

        assert_eq!(
            target,
            "/prom/api/v1/query?query=avg%20by%20%28node%29%20%28rate%28cpu%5B5m%5D%29%29&time=1700000000.250"
        );

        let target = client.query_target("cpu{node=\"a\"}", UNIX_EPOCH);
        assert_eq!(target, "/prom/api/v1/query?query=cpu%7Bnode%3D%22a%22%7D&time=0.000");
    }
}
