//! Backend facade behaviour against an in-memory transport.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, StatusCode};
use futures_util::future::BoxFuture;
use tokio::runtime::Handle;

use http_backend::config::RuntimeConfig;
use http_backend::decorator::{DecoratorChain, DecoratorFactory, HeaderLayer};
use http_backend::execute::{Execute, ExecuteMode};
use http_backend::http::Exchange;
use http_backend::session::{Session, SessionKind};
use http_backend::{
    Backend, BackendError, EventLoop, Reply, Request, ServerBindError, StreamEvent, TransportError,
};

mod common;

use common::{StubFactory, StubTransport};

const TIMEOUT: Duration = Duration::from_secs(5);

fn event_loop() -> EventLoop {
    EventLoop::new(&RuntimeConfig { worker_threads: 2 }).unwrap()
}

fn stub(body: &'static str) -> StubFactory {
    StubFactory::new(StubTransport::ok(body))
}

fn get(path: &str) -> Request {
    Request::get(&format!("http://origin.test{}", path)).build().unwrap()
}

/// Records its name on every send, then forwards.
struct Label {
    inner: Box<dyn Execute>,
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Execute for Label {
    fn mode(&self) -> ExecuteMode {
        self.inner.mode()
    }

    fn request(&self) -> &Arc<Request> {
        self.inner.request()
    }

    fn session(&self) -> &Arc<Session> {
        self.inner.session()
    }

    fn send(&self, request: Arc<Request>) -> BoxFuture<'static, Result<Exchange, TransportError>> {
        self.log.lock().unwrap().push(self.name);
        self.inner.send(request)
    }
}

fn label(name: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> impl DecoratorFactory {
    move |inner: Box<dyn Execute>| -> Box<dyn Execute> {
        Box::new(Label {
            inner,
            name,
            log: log.clone(),
        })
    }
}

#[test]
fn init_then_sync_request_returns_reply() {
    let event_loop = event_loop();
    let factory = stub("hello");
    let mut backend = Backend::with_factory(event_loop.handle(), factory.clone());

    backend.init("test-agent/1.0").unwrap();
    assert!(backend.is_initialized());
    assert_eq!(backend.user_agent(), Some("test-agent/1.0"));
    assert_eq!(
        factory.created(),
        vec![
            (SessionKind::Async, "test-agent/1.0".to_string()),
            (SessionKind::Sync, "test-agent/1.0".to_string()),
        ]
    );

    let reply = backend.request(get("/")).unwrap();
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, Bytes::from("hello"));
}

#[test]
fn second_init_is_rejected_and_keeps_sessions() {
    let event_loop = event_loop();
    let factory = stub("still here");
    let mut backend = Backend::with_factory(event_loop.handle(), factory.clone());

    backend.init("first").unwrap();
    let err = backend.init("second").unwrap_err();
    assert!(matches!(err, BackendError::AlreadyInitialized));

    assert_eq!(backend.user_agent(), Some("first"));
    assert_eq!(factory.created().len(), 2);
    assert_eq!(backend.request(get("/")).unwrap().text(), "still here");
}

#[test]
fn failed_init_keeps_nothing() {
    let event_loop = event_loop();
    let factory = stub("unused").failing_on(SessionKind::Sync);
    let mut backend = Backend::with_factory(event_loop.handle(), factory);

    match backend.init("agent") {
        Err(BackendError::Session { kind, .. }) => assert_eq!(kind, SessionKind::Sync),
        other => panic!("expected session error, got {:?}", other),
    }
    assert!(!backend.is_initialized());
    assert_eq!(backend.request(get("/")), Err(TransportError::NotInitialized));
}

#[test]
fn requests_before_init_are_refused() {
    let event_loop = event_loop();
    let backend = Backend::with_factory(event_loop.handle(), stub("x"));

    assert_eq!(backend.request(get("/")), Err(TransportError::NotInitialized));
    assert!(matches!(
        backend.request_async(get("/"), |_| panic!("callback must not run")),
        Err(TransportError::NotInitialized)
    ));
    assert!(matches!(
        backend.request_streaming(get("/"), |_| panic!("callback must not run")),
        Err(TransportError::NotInitialized)
    ));
    assert!(matches!(
        backend.listen("/hook", 0, |_| Reply::ok("")),
        Err(ServerBindError::NotInitialized)
    ));
}

#[test]
fn close_releases_sessions_for_good() {
    let event_loop = event_loop();
    let mut backend = Backend::with_factory(event_loop.handle(), stub("x"));

    // Closing an uninitialized backend is fine.
    let mut never_initialized = Backend::with_factory(event_loop.handle(), stub("x"));
    never_initialized.close();

    backend.init("agent").unwrap();
    backend.close();
    backend.close();

    assert!(!backend.is_initialized());
    assert_eq!(backend.request(get("/")), Err(TransportError::NotInitialized));
    assert!(matches!(backend.init("agent"), Err(BackendError::Closed)));
}

#[test]
fn pass_through_decorator_is_transparent() {
    let event_loop = event_loop();
    let mut backend = Backend::with_factory(event_loop.handle(), stub("same"));
    backend.init("agent").unwrap();

    let plain = backend.request(get("/")).unwrap();
    backend.set_decorator_factory(|inner: Box<dyn Execute>| inner);
    let decorated = backend.request(get("/")).unwrap();

    assert_eq!(plain, decorated);
}

#[test]
fn every_execution_is_wrapped_once() {
    let event_loop = event_loop();
    let mut backend = Backend::with_factory(event_loop.handle(), stub("x"));
    backend.init("agent").unwrap();

    let wraps = Arc::new(AtomicUsize::new(0));
    let counter = wraps.clone();
    backend.set_decorator_factory(move |inner: Box<dyn Execute>| -> Box<dyn Execute> {
        counter.fetch_add(1, Ordering::SeqCst);
        inner
    });

    backend.request(get("/")).unwrap();
    let (tx, rx) = mpsc::channel();
    let handle = backend.request_async(get("/"), move |r| tx.send(r).unwrap()).unwrap();
    rx.recv_timeout(TIMEOUT).unwrap().unwrap();
    event_loop.block_on(handle.finished());
    let handle = backend.request_streaming(get("/"), |_| {}).unwrap();
    event_loop.block_on(handle.finished());

    assert_eq!(wraps.load(Ordering::SeqCst), 3);

    backend.clear_decorator_factory();
    backend.request(get("/")).unwrap();
    assert_eq!(wraps.load(Ordering::SeqCst), 3);
}

#[test]
fn chained_decorators_apply_in_order() {
    let event_loop = event_loop();
    let mut backend = Backend::with_factory(event_loop.handle(), stub("x"));
    backend.init("agent").unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    backend.set_decorator_factory(
        DecoratorChain::new()
            .with(label("inner", log.clone()))
            .with(label("outer", log.clone())),
    );
    backend.request(get("/")).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
}

#[test]
fn header_decorator_leaves_caller_request_alone() {
    let event_loop = event_loop();
    let factory = stub("x");
    let mut backend = Backend::with_factory(event_loop.handle(), factory.clone());
    backend.init("agent").unwrap();
    backend.set_decorator_factory(HeaderLayer::new().bearer("t0k3n").unwrap().with_request_id());

    let request = Arc::new(get("/private"));
    backend.request(request.clone()).unwrap();

    let seen = factory.transport.seen();
    let sent = seen.last().unwrap();
    assert_eq!(sent.headers()[header::AUTHORIZATION], "Bearer t0k3n");
    assert!(sent.request_id().is_some());
    assert!(request.headers().get(header::AUTHORIZATION).is_none());
    assert!(request.request_id().is_none());
}

#[test]
fn async_callback_runs_once_off_the_caller_thread() {
    let event_loop = event_loop();
    let mut backend = Backend::with_factory(event_loop.handle(), stub("async"));
    backend.init("agent").unwrap();

    let caller = std::thread::current().id();
    let (tx, rx) = mpsc::channel();
    let handle = backend
        .request_async(get("/"), move |result| {
            tx.send((std::thread::current().id(), result)).unwrap();
        })
        .unwrap();

    let (thread, result) = rx.recv_timeout(TIMEOUT).unwrap();
    assert_ne!(thread, caller);
    assert_eq!(result.unwrap().text(), "async");

    event_loop.block_on(handle.finished());
    assert!(rx.try_recv().is_err());
}

#[test]
fn async_error_reaches_the_callback() {
    let event_loop = event_loop();
    let transport = StubTransport::failing(TransportError::Connect("refused".into()));
    let mut backend = Backend::with_factory(event_loop.handle(), StubFactory::new(transport));
    backend.init("agent").unwrap();

    let (tx, rx) = mpsc::channel();
    backend.request_async(get("/"), move |r| tx.send(r).unwrap()).unwrap();

    assert_eq!(
        rx.recv_timeout(TIMEOUT).unwrap(),
        Err(TransportError::Connect("refused".into()))
    );
}

#[test]
fn aborted_request_is_cancelled_exactly_once() {
    let event_loop = event_loop();
    let transport = StubTransport::ok("late").with_delay(Duration::from_secs(30));
    let mut backend = Backend::with_factory(event_loop.handle(), StubFactory::new(transport));
    backend.init("agent").unwrap();

    let (tx, rx) = mpsc::channel();
    let handle = backend.request_async(get("/"), move |r| tx.send(r).unwrap()).unwrap();
    handle.abort();

    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), Err(TransportError::Cancelled));
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn aborted_stream_ends_with_cancelled() {
    let event_loop = event_loop();
    let transport = StubTransport::ok("late").with_delay(Duration::from_secs(30));
    let mut backend = Backend::with_factory(event_loop.handle(), StubFactory::new(transport));
    backend.init("agent").unwrap();

    let (tx, rx) = mpsc::channel();
    let handle = backend
        .request_streaming(get("/"), move |event| tx.send(event).unwrap())
        .unwrap();
    handle.abort();

    assert_eq!(
        rx.recv_timeout(TIMEOUT).unwrap(),
        StreamEvent::Failed(TransportError::Cancelled)
    );
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn callbacks_never_fire_before_the_call_returns() {
    let event_loop = event_loop();
    let mut backend = Backend::with_factory(event_loop.handle(), stub("fast"));
    backend.init("agent").unwrap();

    let early = Arc::new(AtomicUsize::new(0));
    for _ in 0..500 {
        let returned = Arc::new(AtomicBool::new(false));
        let (seen, early_calls) = (returned.clone(), early.clone());
        let (tx, rx) = mpsc::channel();
        backend
            .request_async(get("/"), move |_| {
                if !seen.load(Ordering::SeqCst) {
                    early_calls.fetch_add(1, Ordering::SeqCst);
                }
                tx.send(()).unwrap();
            })
            .unwrap();
        returned.store(true, Ordering::SeqCst);
        rx.recv_timeout(TIMEOUT).unwrap();

        let returned = Arc::new(AtomicBool::new(false));
        let (seen, early_calls) = (returned.clone(), early.clone());
        let (tx, rx) = mpsc::channel();
        backend
            .request_streaming(get("/"), move |event| {
                if !seen.load(Ordering::SeqCst) {
                    early_calls.fetch_add(1, Ordering::SeqCst);
                }
                if event.is_terminal() {
                    tx.send(()).unwrap();
                }
            })
            .unwrap();
        returned.store(true, Ordering::SeqCst);
        rx.recv_timeout(TIMEOUT).unwrap();
    }

    assert_eq!(early.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn streaming_delivers_chunks_then_finishes() {
    let transport = StubTransport::new(200, vec!["a", "b", "c"]);
    let mut backend = Backend::with_factory(Handle::current(), StubFactory::new(transport));
    backend.init("agent").unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let handle = backend
        .request_streaming(get("/stream"), move |event| sink.lock().unwrap().push(event))
        .unwrap();
    tokio::time::timeout(TIMEOUT, handle.finished()).await.unwrap();

    let events = events.lock().unwrap();
    assert!(matches!(&events[0], StreamEvent::Started(head) if head.status == StatusCode::OK));
    assert_eq!(
        events[1..].to_vec(),
        vec![
            StreamEvent::Data(Bytes::from("a")),
            StreamEvent::Data(Bytes::from("b")),
            StreamEvent::Data(Bytes::from("c")),
            StreamEvent::Finished,
        ]
    );
}

#[tokio::test]
async fn streaming_failure_is_the_last_event() {
    let transport = StubTransport::new(200, vec!["partial"])
        .with_body_error(TransportError::Body("reset".into()));
    let mut backend = Backend::with_factory(Handle::current(), StubFactory::new(transport));
    backend.init("agent").unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let handle = backend
        .request_streaming(get("/"), move |event| sink.lock().unwrap().push(event))
        .unwrap();
    tokio::time::timeout(TIMEOUT, handle.finished()).await.unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[1], StreamEvent::Data(Bytes::from("partial")));
    assert_eq!(events[2], StreamEvent::Failed(TransportError::Body("reset".into())));
}

#[tokio::test]
async fn streaming_without_head_only_fails() {
    let transport = StubTransport::failing(TransportError::Timeout("slow".into()));
    let mut backend = Backend::with_factory(Handle::current(), StubFactory::new(transport));
    backend.init("agent").unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let handle = backend
        .request_streaming(get("/"), move |event| sink.lock().unwrap().push(event))
        .unwrap();
    tokio::time::timeout(TIMEOUT, handle.finished()).await.unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec![StreamEvent::Failed(TransportError::Timeout("slow".into()))]
    );
}

#[tokio::test]
async fn sync_request_inside_the_loop_is_refused() {
    let mut backend = Backend::with_factory(Handle::current(), stub("x"));
    backend.init("agent").unwrap();

    assert_eq!(backend.request(get("/")), Err(TransportError::BlockingInEventLoop));
}
