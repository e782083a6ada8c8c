#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::{MockServer, ResponseTemplate};

use kube::Resource;
use support_archive_client::{
    SupportArchive, SupportArchiveClient, SupportArchiveSpec,
};

/// Collection path the client is expected to hit for namespace `test`.
pub const BASE: &str = "/apis/k8s.cloudogu.com/v1/namespaces/test/supportarchives";

/// Build a client whose API server is the given mock.
pub async fn client_for(server: &MockServer) -> SupportArchiveClient {
    let uri: http::Uri = server.uri().parse().expect("mock server uri");
    let config = kube::Config::new(uri);
    let client = kube::Client::try_from(config).expect("kube client");
    SupportArchiveClient::namespaced(client, "test")
}

/// Serialized SupportArchive as the API server would return it.
pub fn archive_json(name: &str, resource_version: &str, status: Value) -> Value {
    json!({
        "apiVersion": "k8s.cloudogu.com/v1",
        "kind": "SupportArchive",
        "metadata": {
            "name": name,
            "namespace": "test",
            "resourceVersion": resource_version,
        },
        "spec": {},
        "status": status,
    })
}

/// In-memory copy as a controller would hold it between reconciles.
pub fn local_archive(name: &str, resource_version: &str) -> SupportArchive {
    let mut archive =
        SupportArchive::new(name, SupportArchiveSpec::default());
    archive.meta_mut().namespace = Some("test".to_string());
    archive.meta_mut().resource_version =
        Some(resource_version.to_string());
    archive
}

/// 409 Status body in the shape the API server produces on stale writes.
pub fn conflict_response(name: &str) -> ResponseTemplate {
    status_failure(
        409,
        "Conflict",
        &format!(
            "Operation cannot be fulfilled on supportarchives.k8s.cloudogu.com \"{name}\": \
             the object has been modified; please apply your changes to the latest version and try again"
        ),
    )
}

pub fn status_failure(
    code: u16,
    reason: &str,
    message: &str,
) -> ResponseTemplate {
    ResponseTemplate::new(code).set_body_json(json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code,
    }))
}

/// All requests the mock server saw for `method` on `path`, parsed as JSON.
pub async fn recorded_bodies(
    server: &MockServer,
    method: &str,
    path: &str,
) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .into_iter()
        .filter(|r| r.method.as_str() == method && r.url.path() == path)
        .map(|r| serde_json::from_slice(&r.body).expect("json request body"))
        .collect()
}
