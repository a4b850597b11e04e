//! An in-process fake of the Kubernetes API server endpoints used when adding
//! debug containers.
//!
//! The fake serves `/version`, a single pod and its `ephemeralcontainers`
//! subresource. Like real API servers, it only accepts the patch protocol
//! matching its version and records every request it receives.

use std::sync::{Arc, Mutex};

use http::{Method, Request, Response, StatusCode, header::CONTENT_TYPE};
use http_body_util::BodyExt as _;
use kube::{Client, client::Body};
use serde_json::{Value, json};
use strategic_merge::{MergeSchema, apply_strategic_merge_patch};
use tower_test::mock::{self, Handle, SendResponse};

pub const NAMESPACE: &str = "ns1";
pub const POD_NAME: &str = "web-0";

pub const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";
pub const STRATEGIC_MERGE_PATCH_CONTENT_TYPE: &str = "application/strategic-merge-patch+json";

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Protocol {
    JsonPatch,
    StrategicMerge,
}

pub struct FakeApiServer {
    git_version: Option<String>,
    protocol: Protocol,
    pod: Value,
    patch_rejection: Option<StatusCode>,
    read_failure_after_patch: Option<StatusCode>,
}

impl FakeApiServer {
    /// A cluster which only accepts JSON patches on the subresource.
    pub fn legacy(git_version: &str, pod: Value) -> Self {
        Self {
            git_version: Some(git_version.to_owned()),
            protocol: Protocol::JsonPatch,
            pod,
            patch_rejection: None,
            read_failure_after_patch: None,
        }
    }

    /// A cluster which only accepts strategic merge patches on the subresource.
    pub fn modern(git_version: &str, pod: Value) -> Self {
        Self {
            git_version: Some(git_version.to_owned()),
            protocol: Protocol::StrategicMerge,
            pod,
            patch_rejection: None,
            read_failure_after_patch: None,
        }
    }

    /// Never answers `/version` requests.
    pub fn unresponsive_version(mut self) -> Self {
        self.git_version = None;
        self
    }

    /// Answers every subresource patch with `status`.
    pub fn rejecting_patches(mut self, status: StatusCode) -> Self {
        self.patch_rejection = Some(status);
        self
    }

    /// Answers pod reads with `status` once a patch was accepted.
    pub fn failing_reads_after_patch(mut self, status: StatusCode) -> Self {
        self.read_failure_after_patch = Some(status);
        self
    }

    pub fn start(self) -> (Client, RunningApiServer) {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "default");

        let state = Arc::new(Mutex::new(State {
            pod: self.pod.clone(),
            requests: Vec::new(),
            patched: false,
        }));
        tokio::spawn(serve(handle, self, state.clone()));

        (client, RunningApiServer { state })
    }
}

struct State {
    pod: Value,
    requests: Vec<RecordedRequest>,
    patched: bool,
}

pub struct RunningApiServer {
    state: Arc<Mutex<State>>,
}

impl RunningApiServer {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .expect("state lock is not poisoned")
            .requests
            .clone()
    }

    pub fn patch_requests(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == Method::PATCH)
            .collect()
    }

    /// The pod as currently stored by the server.
    pub fn pod(&self) -> Value {
        self.state
            .lock()
            .expect("state lock is not poisoned")
            .pod
            .clone()
    }
}

pub fn pod_path() -> String {
    format!("/api/v1/namespaces/{NAMESPACE}/pods/{POD_NAME}")
}

pub fn subresource_path() -> String {
    format!("{}/ephemeralcontainers", pod_path())
}

async fn serve(
    mut handle: Handle<Request<Body>, Response<Body>>,
    server: FakeApiServer,
    state: Arc<Mutex<State>>,
) {
    // Requests which are never answered, kept so that their callers keep waiting
    let mut pending: Vec<SendResponse<Response<Body>>> = Vec::new();

    while let Some((request, send)) = handle.next_request().await {
        let (parts, body) = request.into_parts();
        let body = body
            .collect()
            .await
            .expect("request body is readable")
            .to_bytes();
        let recorded = RecordedRequest {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            content_type: parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(ToOwned::to_owned),
            body: (!body.is_empty())
                .then(|| serde_json::from_slice(&body).expect("request bodies are JSON")),
        };

        let mut stored = state.lock().expect("state lock is not poisoned");
        stored.requests.push(recorded.clone());

        let response = if recorded.method == Method::GET && recorded.path == "/version" {
            server
                .git_version
                .as_deref()
                .map(|git_version| json_response(StatusCode::OK, &version_info(git_version)))
        } else if recorded.method == Method::GET && recorded.path == pod_path() {
            match server.read_failure_after_patch {
                Some(status) if stored.patched => Some(status_response(
                    status,
                    "InternalError",
                    "an error on the server has prevented the request from succeeding",
                )),
                _ => Some(json_response(StatusCode::OK, &stored.pod)),
            }
        } else if recorded.method == Method::PATCH && recorded.path == subresource_path() {
            let response = patch_subresource(&server, &mut stored.pod, &recorded);
            stored.patched |= response.status().is_success();
            Some(response)
        } else {
            Some(status_response(
                StatusCode::NOT_FOUND,
                "NotFound",
                "the server could not find the requested resource",
            ))
        };
        drop(stored);

        match response {
            Some(response) => send.send_response(response),
            None => pending.push(send),
        }
    }
}

fn patch_subresource(
    server: &FakeApiServer,
    pod: &mut Value,
    request: &RecordedRequest,
) -> Response<Body> {
    if let Some(status) = server.patch_rejection {
        return status_response(
            status,
            "Invalid",
            "Pod \"web-0\" is invalid: spec.ephemeralContainers: Forbidden",
        );
    }

    let expected_content_type = match server.protocol {
        Protocol::JsonPatch => JSON_PATCH_CONTENT_TYPE,
        Protocol::StrategicMerge => STRATEGIC_MERGE_PATCH_CONTENT_TYPE,
    };
    if request.content_type.as_deref() != Some(expected_content_type) {
        return status_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UnsupportedMediaType",
            "the body of the request was in an unknown format",
        );
    }

    let patch = request.body.clone().unwrap_or(Value::Null);
    match server.protocol {
        Protocol::JsonPatch => {
            // Older API servers expose the subresource as its own kind
            let mut ephemeral_containers = json!({
                "apiVersion": "v1",
                "kind": "EphemeralContainers",
                "metadata": {"name": POD_NAME, "namespace": NAMESPACE},
                "ephemeralContainers": pod["spec"]
                    .get("ephemeralContainers")
                    .cloned()
                    .unwrap_or_else(|| json!([])),
            });
            let patch: json_patch::Patch =
                serde_json::from_value(patch).expect("request body is a JSON patch");
            json_patch::patch(&mut ephemeral_containers, &patch)
                .expect("JSON patch applies to the subresource");

            pod["spec"]["ephemeralContainers"] =
                ephemeral_containers["ephemeralContainers"].clone();
            json_response(StatusCode::OK, &ephemeral_containers)
        }
        Protocol::StrategicMerge => {
            *pod = apply_strategic_merge_patch(pod, &patch, &MergeSchema::pod())
                .expect("strategic merge patch applies to the pod");
            json_response(StatusCode::OK, pod)
        }
    }
}

fn version_info(git_version: &str) -> Value {
    let mut segments = git_version.trim_start_matches('v').split('.');
    json!({
        "major": segments.next().unwrap_or_default(),
        "minor": segments.next().unwrap_or_default(),
        "gitVersion": git_version,
        "gitCommit": "fake",
        "gitTreeState": "clean",
        "buildDate": "2024-01-01T00:00:00Z",
        "goVersion": "go1.22.0",
        "compiler": "gc",
        "platform": "linux/amd64",
    })
}

fn json_response(status: StatusCode, body: &Value) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(body).expect("responses serialize to JSON"),
        ))
        .expect("response is valid")
}

fn status_response(status: StatusCode, reason: &str, message: &str) -> Response<Body> {
    json_response(
        status,
        &json!({
            "apiVersion": "v1",
            "kind": "Status",
            "metadata": {},
            "status": "Failure",
            "message": message,
            "reason": reason,
            "code": status.as_u16(),
        }),
    )
}

pub fn pod_manifest(ephemeral_containers: Value) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": POD_NAME,
            "namespace": NAMESPACE,
            "uid": "0c9d4f3e-8e5b-4c9a-9c39-64a5c4a1f7de",
            "resourceVersion": "1234",
            "labels": {"app": "web"},
        },
        "spec": {
            "containers": [{
                "name": "web",
                "image": "nginx:1.27",
                "ports": [{"containerPort": 80, "protocol": "TCP"}],
            }],
            "ephemeralContainers": ephemeral_containers,
            "restartPolicy": "Always",
        },
        "status": {"phase": "Running"},
    })
}
