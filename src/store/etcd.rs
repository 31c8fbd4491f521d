use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use snafu::prelude::*;
use tracing::{debug, warn};

use crate::store::{Action, ChangeEvent, KeyValueStore, StoreNode, UnknownActionError};

const ETCD_INDEX_HEADER: &str = "X-Etcd-Index";
/// etcd answers a watch with this code when the requested index was already compacted away
const EVENT_INDEX_CLEARED: u32 = 401;

/// Minimal client for the etcd v2 keys API.
#[derive(Debug, Clone)]
pub struct EtcdClient {
    http: Client,
    endpoints: Vec<String>,
}

/// Recursive listing of a directory together with the store index it was taken at.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub node: StoreNode,
    pub index: Option<u64>,
}

/// A decoded watch notification and the index of the change it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub event: ChangeEvent,
    pub index: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WatchResponse {
    action: String,
    node: StoreNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_code: u32,
    message: String,
    #[serde(default)]
    cause: String,
    #[serde(default)]
    index: u64,
}

impl EtcdClient {
    /// Creates a client for a comma separated list of endpoints.
    pub fn new(address: &str, timeout: Duration) -> Result<Self, StoreError> {
        let endpoints = parse_endpoints(address);
        ensure!(!endpoints.is_empty(), NoEndpointsSnafu { address });

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Replaces the configured endpoints with the client URLs advertised by the cluster.
    pub fn sync_cluster(&mut self) -> Result<(), StoreError> {
        for endpoint in self.endpoints.clone() {
            let url = format!("{endpoint}/v2/machines");
            let machines = match self.http.get(&url).send().and_then(Response::text) {
                Ok(body) => parse_endpoints(&body),
                Err(e) => {
                    warn!("Failed to reach etcd machine {}: {}", endpoint, e);
                    continue;
                }
            };
            if !machines.is_empty() {
                debug!("Synced etcd cluster machines: {:?}", machines);
                self.endpoints = machines;
                return Ok(());
            }
        }

        ClusterSyncSnafu {
            endpoints: self.endpoints.join(", "),
        }
        .fail()
    }

    /// Sends the request to each endpoint in turn until one answers.
    fn send(&self, request: impl Fn(&str) -> RequestBuilder) -> Result<Response, StoreError> {
        let mut last_error = None;
        for endpoint in &self.endpoints {
            match request(endpoint).send() {
                Ok(response) => return check_status(endpoint, response),
                Err(e) if e.is_timeout() => {
                    return Err(e).context(TransportSnafu {
                        endpoint: endpoint.clone(),
                    });
                }
                Err(e) => {
                    debug!("Request to {} failed: {}", endpoint, e);
                    last_error = Some((endpoint.clone(), e));
                }
            }
        }

        match last_error {
            Some((endpoint, source)) => Err(StoreError::TransportError { endpoint, source }),
            None => NoEndpointsSnafu { address: "" }.fail(),
        }
    }
}

impl KeyValueStore for EtcdClient {
    /// Fetches the whole subtree below `key`.
    fn snapshot(&self, key: &str) -> Result<Snapshot, StoreError> {
        let response = self.send(|endpoint| {
            self.http
                .get(keys_url(endpoint, key))
                .query(&[("recursive", "true")])
        })?;
        let index = response
            .headers()
            .get(ETCD_INDEX_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());

        #[derive(Deserialize)]
        struct GetResponse {
            node: StoreNode,
        }
        let body: GetResponse = response.json().context(DecodeSnafu)?;

        Ok(Snapshot {
            node: body.node,
            index,
        })
    }

    /// Long-polls for the next change below `key`, starting at `wait_index` when given.
    fn watch_once(
        &self,
        key: &str,
        wait_index: Option<u64>,
        timeout: Duration,
    ) -> Result<WatchEvent, StoreError> {
        let mut query = vec![("wait", "true".to_string()), ("recursive", "true".to_string())];
        if let Some(index) = wait_index {
            query.push(("waitIndex", index.to_string()));
        }

        let response = self.send(|endpoint| {
            self.http
                .get(keys_url(endpoint, key))
                .query(&query)
                .timeout(timeout)
        })?;
        let body: WatchResponse = response.json().context(DecodeSnafu)?;

        body.try_into()
    }
}

impl TryFrom<WatchResponse> for WatchEvent {
    type Error = StoreError;

    fn try_from(response: WatchResponse) -> Result<Self, Self::Error> {
        let node = response.node;
        let action: Action = response.action.parse().context(UnknownActionSnafu {
            index: node.modified_index,
        })?;
        let value = if action.is_removal() { None } else { node.value };

        Ok(WatchEvent {
            event: ChangeEvent {
                action,
                key: node.key,
                value,
                dir: node.dir,
            },
            index: node.modified_index,
        })
    }
}

fn check_status(endpoint: &str, response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match response.json::<ErrorBody>() {
        Ok(body) => Err(StoreError::ApiError {
            code: body.error_code,
            message: body.message,
            cause: body.cause,
            index: body.index,
        }),
        Err(_) => StatusSnafu {
            endpoint: endpoint.to_string(),
            status,
        }
        .fail(),
    }
}

fn parse_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|endpoint| endpoint.trim().trim_end_matches('/'))
        .filter(|endpoint| !endpoint.is_empty())
        .map(str::to_string)
        .collect()
}

fn keys_url(endpoint: &str, key: &str) -> String {
    let key = key.trim_start_matches('/');
    format!("{endpoint}/v2/keys/{key}")
}

#[derive(Debug, Snafu)]
pub enum StoreError {
    #[snafu(display("No etcd endpoint given in '{}'", address))]
    NoEndpoints { address: String },
    #[snafu(display("Failed to create the HTTP client"))]
    ClientBuildError { source: reqwest::Error },
    #[snafu(display("Cannot sync with etcd machines at {}", endpoints))]
    ClusterSyncError { endpoints: String },
    #[snafu(display("Request to etcd at {} failed", endpoint))]
    TransportError {
        endpoint: String,
        source: reqwest::Error,
    },
    #[snafu(display("etcd at {} answered with status {}", endpoint, status))]
    StatusError { endpoint: String, status: StatusCode },
    #[snafu(display("etcd error {}: {} ({})", code, message, cause))]
    ApiError {
        code: u32,
        message: String,
        cause: String,
        index: u64,
    },
    #[snafu(display("Failed to decode the etcd response"))]
    DecodeError { source: reqwest::Error },
    #[snafu(display("etcd reported a change at index {} the watcher does not understand", index))]
    UnknownActionError {
        index: u64,
        source: UnknownActionError,
    },
}

impl StoreError {
    /// Whether the request gave up waiting, which is expected for an idle long-poll.
    ///
    /// etcd sends the headers of a watch right away and holds back the body until a
    /// change arrives, so an idle poll usually times out while the body is being read.
    pub fn is_timeout(&self) -> bool {
        match self {
            StoreError::TransportError { source, .. } | StoreError::DecodeError { source } => {
                source.is_timeout()
            }
            _ => false,
        }
    }

    /// Index to resume watching from when the failed watch should be skipped over.
    ///
    /// That is the case when the requested index was already cleared from the store history
    /// and when the notification itself could not be understood.
    pub fn resume_index(&self) -> Option<u64> {
        match self {
            StoreError::ApiError { code, index, .. } if *code == EVENT_INDEX_CLEARED => {
                Some(index + 1)
            }
            StoreError::UnknownActionError { index, .. } => Some(index + 1),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:4001", &["http://localhost:4001"])]
    #[case("http://a:4001/, http://b:4001", &["http://a:4001", "http://b:4001"])]
    #[case("http://a:2379,,", &["http://a:2379"])]
    #[case("", &[])]
    fn splits_endpoint_lists(#[case] raw: &str, #[case] expected: &[&str]) {
        assert_eq!(parse_endpoints(raw), expected);
    }

    #[rstest]
    #[case("/rails/production", "http://a:4001/v2/keys/rails/production")]
    #[case("rails/production", "http://a:4001/v2/keys/rails/production")]
    #[case("/", "http://a:4001/v2/keys/")]
    fn builds_key_urls(#[case] key: &str, #[case] expected: &str) {
        assert_eq!(keys_url("http://a:4001", key), expected);
    }

    #[test]
    fn client_requires_an_endpoint() {
        let result = EtcdClient::new(" , ", Duration::from_secs(1));
        assert!(matches!(result, Err(StoreError::NoEndpoints { .. })));
    }

    #[test]
    fn client_keeps_configured_endpoints() {
        let client = EtcdClient::new("http://a:4001/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoints(), ["http://a:4001".to_string()]);
    }

    #[test]
    fn decodes_a_set_notification() {
        let body = r#"{
            "action": "set",
            "node": {"key": "/rails/production/database/port", "value": "5432", "modifiedIndex": 12, "createdIndex": 12},
            "prevNode": {"key": "/rails/production/database/port", "value": "3306", "modifiedIndex": 9, "createdIndex": 9}
        }"#;
        let response: WatchResponse = serde_json::from_str(body).unwrap();

        let event = WatchEvent::try_from(response).unwrap();

        assert_eq!(
            event,
            WatchEvent {
                event: ChangeEvent::set("/rails/production/database/port", "5432"),
                index: 12,
            }
        );
    }

    #[test]
    fn removals_carry_no_value() {
        let body = r#"{
            "action": "expire",
            "node": {"key": "/rails/production/session/token", "modifiedIndex": 20, "createdIndex": 3},
            "prevNode": {"key": "/rails/production/session/token", "value": "t", "modifiedIndex": 3, "createdIndex": 3}
        }"#;
        let response: WatchResponse = serde_json::from_str(body).unwrap();

        let event = WatchEvent::try_from(response).unwrap();

        assert_eq!(event.event.action, Action::Expire);
        assert_eq!(event.event.value, None);
        assert_eq!(event.index, 20);
    }

    #[test]
    fn directory_notifications_are_flagged() {
        let body = r#"{"action": "create", "node": {"key": "/rails/production/queues", "dir": true, "modifiedIndex": 4}}"#;
        let response: WatchResponse = serde_json::from_str(body).unwrap();

        let event = WatchEvent::try_from(response).unwrap();

        assert_eq!(
            event.event,
            ChangeEvent::directory(Action::Create, "/rails/production/queues")
        );
    }

    #[test]
    fn unknown_actions_are_rejected() {
        let body = r#"{"action": "get", "node": {"key": "/rails/production/a", "modifiedIndex": 41}}"#;
        let response: WatchResponse = serde_json::from_str(body).unwrap();

        let error = WatchEvent::try_from(response).unwrap_err();

        assert!(matches!(error, StoreError::UnknownActionError { .. }));
        assert_eq!(error.resume_index(), Some(42));
    }

    #[test]
    fn outdated_watches_resume_after_the_current_index() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"errorCode": 401, "message": "The event in requested index is outdated and cleared", "cause": "the requested history has been cleared [1008/5]", "index": 2007}"#,
        )
        .unwrap();
        let error = StoreError::ApiError {
            code: body.error_code,
            message: body.message,
            cause: body.cause,
            index: body.index,
        };

        assert_eq!(error.resume_index(), Some(2008));
        assert!(!error.is_timeout());
    }

    /// Accepts one request, answers with the headers of a watch and then never sends a body.
    fn stalled_watch_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\n\
                  Content-Type: application/json\r\n\
                  X-Etcd-Index: 17\r\n\
                  Transfer-Encoding: chunked\r\n\r\n",
            );
            let _ = stream.flush();
            thread::sleep(Duration::from_secs(5));
        });
        format!("http://{address}")
    }

    #[test]
    fn idle_long_poll_is_reported_as_timeout() {
        let client = EtcdClient::new(&stalled_watch_endpoint(), Duration::from_secs(10)).unwrap();

        let error = client
            .watch_once("/rails/production", Some(18), Duration::from_millis(300))
            .unwrap_err();

        assert!(error.is_timeout(), "unexpected error: {error}");
        assert_eq!(error.resume_index(), None);
    }

    #[test]
    fn other_api_errors_are_not_skipped() {
        let error = StoreError::ApiError {
            code: 100,
            message: "Key not found".into(),
            cause: "/rails/staging".into(),
            index: 5,
        };
        assert_eq!(error.resume_index(), None);
        assert_eq!(error.to_string(), "etcd error 100: Key not found (/rails/staging)");
    }
}
