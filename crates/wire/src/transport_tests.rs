// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use std::sync::Mutex as StdMutex;

struct EchoDispatch {
    seen: Arc<StdMutex<Vec<Request>>>,
}

#[async_trait]
impl Dispatch for EchoDispatch {
    async fn dispatch(&self, request: Request) -> Response {
        self.seen.lock().unwrap().push(request.clone());
        Response::ok(request.id, json!({"method": request.method}))
    }
}

#[tokio::test]
async fn loopback_transport_calls_dispatcher_directly() {
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let transport = LoopbackTransport::new(Arc::new(EchoDispatch { seen: seen.clone() }));

    let response = transport.send(Request::new("r1", "workspace", "listInstallations")).await.unwrap();
    assert_eq!(response.into_result().unwrap()["method"], "listInstallations");
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn scoped_transport_stamps_missing_scope_fields() {
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let inner = Arc::new(LoopbackTransport::new(Arc::new(EchoDispatch { seen: seen.clone() })));
    let scoped = ScopedTransport::new(
        inner,
        RequestScope { workspace_id: Some("wsp-1".into()), installation_id: None },
    );

    scoped.send(Request::new("r1", "workspace", "installation")).await.unwrap();
    let recorded = seen.lock().unwrap();
    assert_eq!(recorded[0].scope.as_ref().unwrap().workspace_id.as_deref(), Some("wsp-1"));
}

#[tokio::test]
async fn scoped_transport_never_overwrites_caller_supplied_scope() {
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let inner = Arc::new(LoopbackTransport::new(Arc::new(EchoDispatch { seen: seen.clone() })));
    let scoped = ScopedTransport::new(
        inner,
        RequestScope { workspace_id: Some("wsp-1".into()), installation_id: None },
    );

    let request = Request::new("r1", "workspace", "installation")
        .with_scope(RequestScope { workspace_id: Some("wsp-override".into()), installation_id: None });
    scoped.send(request).await.unwrap();
    let recorded = seen.lock().unwrap();
    assert_eq!(recorded[0].scope.as_ref().unwrap().workspace_id.as_deref(), Some("wsp-override"));
}
