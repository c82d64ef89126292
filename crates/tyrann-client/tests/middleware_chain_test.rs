//! Middleware ordering, short-circuiting, rewriting and retry, run against an
//! in-memory transport.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tyrann_client::{
    Apis, CallAction, CallResult, ClientOptions, Endpoint, Method, Middleware, Next, Operation,
    Request, RequestConfig, RetryMiddleware, TracingMiddleware, Transport, TransportError,
    TransportRequest, TransportResponse, Tyrann, TyrannError,
};
use tyrann_schema::{number, object};

type Log = Arc<Mutex<Vec<String>>>;

/// Plays back scripted outcomes in order, then keeps answering 200. Every
/// request is noted as `terminal` in the shared log.
#[derive(Debug, Default)]
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    seen: Mutex<Vec<TransportRequest>>,
    log: Log,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<TransportResponse, TransportError>>) -> Arc<Self> {
        Self::logging(script, &Log::default())
    }

    fn logging(script: Vec<Result<TransportResponse, TransportError>>, log: &Log) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
            log: log.clone(),
        })
    }

    fn calls(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        self.seen.lock().push(request.clone());
        self.log.lock().push("terminal".to_string());
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| Ok(TransportResponse::new(200, json!({ "result": 1 }))))
    }
}

/// Records entry and exit into a shared trace.
struct Trace {
    label: &'static str,
    log: Log,
}

#[async_trait]
impl Middleware for Trace {
    async fn handle(
        &self,
        _action: &CallAction,
        _options: &ClientOptions,
        next: Next<'_>,
    ) -> Result<CallResult, TyrannError> {
        self.log.lock().push(format!("{} in", self.label));
        let outcome = next.run().await;
        self.log.lock().push(format!("{} out", self.label));
        outcome
    }
}

/// Answers without calling the rest of the chain.
struct Cached;

#[async_trait]
impl Middleware for Cached {
    async fn handle(
        &self,
        _action: &CallAction,
        _options: &ClientOptions,
        _next: Next<'_>,
    ) -> Result<CallResult, TyrannError> {
        Ok(CallResult::new(
            TransportResponse::new(200, json!({ "result": 0 })),
            json!({ "result": 0 }),
        ))
    }
}

/// Rewrites the call: swaps the path id and adds a header.
struct Rewrite;

#[async_trait]
impl Middleware for Rewrite {
    async fn handle(
        &self,
        action: &CallAction,
        options: &ClientOptions,
        next: Next<'_>,
    ) -> Result<CallResult, TyrannError> {
        let mut action = action.clone();
        action.request.path = Some(json!({ "id": 99 }));
        let options = options
            .clone()
            .with_request_config(RequestConfig::new().with_header("x-rewritten", "yes"));
        next.run_with(&action, &options).await
    }
}

fn apis() -> Apis {
    Apis::new().endpoint(
        "/brotli/{id}",
        Endpoint::new().get(
            Operation::new()
                .path(object().field("id", number()))
                .response(200, object().field("result", number())),
        ),
    )
}

fn client(transport: &Arc<ScriptedTransport>, middlewares: Vec<Arc<dyn Middleware>>) -> Tyrann {
    Tyrann::with_options(
        apis(),
        ClientOptions::new()
            .with_shared_transport(transport.clone())
            .with_middlewares(middlewares),
    )
}

fn brotli(id: i64) -> Request {
    Request::new().with_path(json!({ "id": id }))
}

fn trace(label: &'static str, log: &Log) -> Arc<dyn Middleware> {
    Arc::new(Trace {
        label,
        log: log.clone(),
    })
}

#[tokio::test]
async fn chain_runs_outermost_first_and_unwinds_in_reverse() {
    let log = Log::default();
    let transport = ScriptedTransport::logging(vec![], &log);
    let client = client(
        &transport,
        vec![trace("A", &log), trace("B", &log), trace("C", &log)],
    );

    client.get("/brotli/{id}", brotli(1)).await.unwrap();

    assert_eq!(
        *log.lock(),
        ["A in", "B in", "C in", "terminal", "C out", "B out", "A out"]
    );
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn short_circuit_skips_transport_and_inner_layers() {
    let log = Log::default();
    let transport = ScriptedTransport::logging(vec![], &log);
    let client = client(
        &transport,
        vec![trace("A", &log), Arc::new(Cached), trace("C", &log)],
    );

    let result = client.get("/brotli/{id}", brotli(1)).await.unwrap();

    assert_eq!(result.get(200), Some(&json!({ "result": 0 })));
    assert_eq!(*log.lock(), ["A in", "A out"]);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn middleware_can_replace_action_and_options() {
    let transport = ScriptedTransport::new(vec![]);
    let client = client(&transport, vec![Arc::new(Rewrite)]);

    client.get("/brotli/{id}", brotli(1)).await.unwrap();

    let seen = transport.seen.lock();
    assert_eq!(seen[0].url, "/brotli/99");
    assert_eq!(seen[0].config.headers["x-rewritten"], "yes");
}

#[tokio::test]
async fn per_call_middlewares_replace_global_ones() {
    let transport = ScriptedTransport::new(vec![]);
    let log = Log::default();
    let client = client(&transport, vec![trace("global", &log)]);

    let action = client.create_call(Method::Get, "/brotli/{id}", brotli(1));
    let local = ClientOptions::new().with_middlewares(vec![trace("local", &log)]);
    client.call_with(&action, &local).await.unwrap();

    assert_eq!(*log.lock(), ["local in", "local out"]);
}

#[tokio::test]
async fn retry_recovers_from_transport_errors() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportError::Custom("connection reset".into())),
        Err(TransportError::Custom("connection reset".into())),
    ]);
    let client = client(
        &transport,
        vec![Arc::new(RetryMiddleware::new(3, Duration::from_millis(1)))],
    );

    let result = client.get("/brotli/{id}", brotli(1)).await.unwrap();

    assert_eq!(result.status(), 200);
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn retry_gives_up_after_max_retries() {
    let transport = ScriptedTransport::new(
        (0..10)
            .map(|_| Err(TransportError::Custom("down".into())))
            .collect(),
    );
    let client = client(
        &transport,
        vec![Arc::new(RetryMiddleware::new(2, Duration::from_millis(1)))],
    );

    let err = client.get("/brotli/{id}", brotli(1)).await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn retry_returns_url_and_header_errors_at_once() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportError::InvalidUrl {
            url: "/brotli/1".into(),
            reason: "relative URL without a base".into(),
        }),
        Err(TransportError::InvalidHeader {
            name: "authorization".into(),
            reason: "invalid header value".into(),
        }),
    ]);
    let client = client(
        &transport,
        vec![Arc::new(RetryMiddleware::new(3, Duration::from_secs(60)))],
    );

    let err = client.get("/brotli/{id}", brotli(1)).await.unwrap_err();
    assert!(matches!(
        err,
        TyrannError::Transport(TransportError::InvalidUrl { .. })
    ));
    assert_eq!(transport.calls(), 1);

    let err = client.get("/brotli/{id}", brotli(1)).await.unwrap_err();
    assert!(matches!(
        err,
        TyrannError::Transport(TransportError::InvalidHeader { .. })
    ));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn retry_does_not_repeat_response_failures() {
    let transport = ScriptedTransport::new(vec![Ok(TransportResponse::new(500, Value::Null))]);
    let client = client(
        &transport,
        vec![Arc::new(RetryMiddleware::new(3, Duration::from_millis(1)))],
    );

    let err = client.get("/brotli/{id}", brotli(1)).await.unwrap_err();

    assert!(matches!(err, TyrannError::StatusNotHandled { status: 500, .. }));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn tracing_middleware_is_transparent() {
    let transport = ScriptedTransport::new(vec![Ok(TransportResponse::new(
        200,
        json!({ "result": "not a number" }),
    ))]);
    let client = client(&transport, vec![Arc::new(TracingMiddleware)]);

    let err = client.get("/brotli/{id}", brotli(1)).await.unwrap_err();
    assert!(matches!(err, TyrannError::BadResponse { .. }));

    let ok = client.get("/brotli/{id}", brotli(1)).await.unwrap();
    assert_eq!(ok.get(200), Some(&json!({ "result": 1 })));
}

#[tokio::test]
async fn dynamic_config_is_evaluated_per_call() {
    let transport = ScriptedTransport::new(vec![]);
    let counter = Arc::new(Mutex::new(0u32));
    let tokens = counter.clone();
    let client = Tyrann::with_options(
        apis(),
        ClientOptions::new()
            .with_shared_transport(transport.clone())
            .with_dynamic_config(move || {
                let mut n = tokens.lock();
                *n += 1;
                RequestConfig::new().bearer(&format!("token-{}", *n))
            }),
    );

    client.get("/brotli/{id}", brotli(1)).await.unwrap();
    client.get("/brotli/{id}", brotli(2)).await.unwrap();

    let seen = transport.seen.lock();
    assert_eq!(seen[0].config.headers["authorization"], "Bearer token-1");
    assert_eq!(seen[1].config.headers["authorization"], "Bearer token-2");
    assert_eq!(*counter.lock(), 2);
}
