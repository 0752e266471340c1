mod common;

use common::{network, ok, status, timed_out, RecordingPause, ScriptedTransport};
use std::time::Duration;
use wordle_sieve::{
    AttemptScope, Disposition, Error, HttpRequest, HttpResponse, ResilientFetcher, RetryPolicy,
    Transport, TransportError,
};

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_secs(1),
        attempt_timeout: Duration::from_secs(20),
    }
}

fn short_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempt_timeout: Duration::from_millis(20),
        ..policy(max_attempts)
    }
}

fn request() -> HttpRequest {
    HttpRequest::get("https://svc.test/a")
}

fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().map(|&s| Duration::from_secs(s)).collect()
}

/// Transport that abandons every attempt by cancelling its scope, then
/// answers anyway.
struct CancellingTransport;

impl Transport for CancellingTransport {
    fn execute(
        &self,
        _request: &HttpRequest,
        scope: &AttemptScope,
    ) -> Result<HttpResponse, TransportError> {
        scope.cancel();
        Ok(HttpResponse::new(200, "too late"))
    }
}

#[test]
fn test_success_on_first_attempt() {
    let transport = ScriptedTransport::new([ok("hello")]);
    let pause = RecordingPause::new();
    let fetcher = ResilientFetcher::new(transport.clone(), pause.clone(), policy(5));

    let response = fetcher.fetch(&request()).unwrap();

    assert_eq!(response.body, "hello");
    assert_eq!(transport.requests().len(), 1);
    assert!(pause.pauses().is_empty());
}

#[test]
fn test_rate_limit_is_retried_after_initial_backoff() {
    let transport = ScriptedTransport::new([status(429, ""), ok("page")]);
    let pause = RecordingPause::new();
    let fetcher = ResilientFetcher::new(transport.clone(), pause.clone(), policy(5));

    let response = fetcher.fetch(&request()).unwrap();

    assert_eq!(response.body, "page");
    assert_eq!(transport.requests().len(), 2);
    assert_eq!(pause.pauses(), secs(&[1]));
}

#[test]
fn test_backoff_doubles_each_retry() {
    let transport = ScriptedTransport::new([
        status(429, ""),
        timed_out(),
        network("reset"),
        ok("done"),
    ]);
    let pause = RecordingPause::new();
    let fetcher = ResilientFetcher::new(transport.clone(), pause.clone(), policy(5));

    fetcher.fetch(&request()).unwrap();

    assert_eq!(pause.pauses(), secs(&[1, 2, 4]));
}

#[test]
fn test_timeout_on_final_attempt_is_fatal() {
    let transport = ScriptedTransport::new([timed_out(), timed_out(), timed_out()]);
    let pause = RecordingPause::new();
    let fetcher = ResilientFetcher::new(transport.clone(), pause.clone(), policy(3));

    let err = fetcher.fetch(&request()).unwrap_err();

    assert!(matches!(err, Error::Timeout { attempts: 3, .. }), "{err:?}");
    assert!(err.to_string().contains("(20s per attempt)"), "{err}");
    assert_eq!(transport.requests().len(), 3);
    assert_eq!(pause.pauses(), secs(&[1, 2]));
}

#[test]
fn test_late_success_counts_as_timeout_and_is_retried() {
    let transport = ScriptedTransport::with_delay(
        [ok("late"), ok("late again")],
        Duration::from_millis(120),
    );
    let pause = RecordingPause::new();
    let fetcher = ResilientFetcher::new(transport.clone(), pause.clone(), short_policy(2));

    let err = fetcher.fetch(&request()).unwrap_err();

    assert!(matches!(err, Error::Timeout { attempts: 2, .. }), "{err:?}");
    assert_eq!(transport.requests().len(), 2);
    assert_eq!(pause.pauses(), secs(&[1]));
}

#[test]
fn test_network_failure_after_deadline_is_timeout() {
    let transport = ScriptedTransport::with_delay(
        [network("connection reset")],
        Duration::from_millis(120),
    );
    let fetcher = ResilientFetcher::new(transport, RecordingPause::new(), short_policy(1));

    let err = fetcher.fetch(&request()).unwrap_err();

    assert!(matches!(err, Error::Timeout { attempts: 1, .. }), "{err:?}");
    assert!(err.to_string().contains("(20ms per attempt)"), "{err}");
}

#[test]
fn test_cancelled_scope_is_timeout() {
    let pause = RecordingPause::new();
    let fetcher = ResilientFetcher::new(
        std::sync::Arc::new(CancellingTransport),
        pause.clone(),
        policy(2),
    );

    let err = fetcher.fetch(&request()).unwrap_err();

    assert!(matches!(err, Error::Timeout { attempts: 2, .. }), "{err:?}");
    assert_eq!(pause.pauses(), secs(&[1]));
}

#[test]
fn test_other_failure_status_is_fatal_immediately() {
    let transport = ScriptedTransport::new([
        status(500, r#"{"error": {"message": "model overloaded"}}"#),
        ok("never reached"),
    ]);
    let pause = RecordingPause::new();
    let fetcher = ResilientFetcher::new(transport.clone(), pause.clone(), policy(5));

    let err = fetcher.fetch(&request()).unwrap_err();

    assert_eq!(err.status(), Some(500));
    let message = err.to_string();
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("model overloaded"), "{message}");
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(transport.remaining(), 1);
    assert!(pause.pauses().is_empty());
}

#[test]
fn test_not_found_is_fatal() {
    let transport = ScriptedTransport::new([status(404, "missing")]);
    let fetcher = ResilientFetcher::new(transport, RecordingPause::new(), policy(5));

    let err = fetcher.fetch(&request()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_rate_limit_exhaustion_reports_status_and_message() {
    let transport = ScriptedTransport::new([
        status(429, r#"{"message": "slow down"}"#),
        status(429, r#"{"message": "slow down"}"#),
    ]);
    let fetcher = ResilientFetcher::new(transport, RecordingPause::new(), policy(2));

    let err = fetcher.fetch(&request()).unwrap_err();

    let Error::RateLimited { message, .. } = &err else {
        panic!("expected rate limit, got {err:?}");
    };
    assert_eq!(message.as_deref(), Some("slow down"));
    assert_eq!(err.status(), Some(429));

    let text = err.to_string();
    assert!(text.contains("after 2 attempt(s)"), "{text}");
    assert!(text.contains("slow down"), "{text}");
}

#[test]
fn test_network_failure_exhaustion() {
    let transport = ScriptedTransport::new([network("refused"), network("refused")]);
    let fetcher = ResilientFetcher::new(transport, RecordingPause::new(), policy(2));

    let err = fetcher.fetch(&request()).unwrap_err();

    let Error::Network { reason, .. } = &err else {
        panic!("expected network failure, got {err:?}");
    };
    assert_eq!(reason, "refused");
    assert!(err.to_string().contains("after 2 attempt(s)"), "{err}");
}

#[test]
fn test_zero_attempts_still_tries_once() {
    let transport = ScriptedTransport::new([status(429, "")]);
    let pause = RecordingPause::new();
    let fetcher = ResilientFetcher::new(transport.clone(), pause.clone(), policy(0));

    assert!(fetcher.fetch(&request()).is_err());
    assert_eq!(transport.requests().len(), 1);
    assert!(pause.pauses().is_empty());
}

#[test]
fn test_custom_classification() {
    let transport = ScriptedTransport::new([status(503, ""), ok("{}")]);
    let pause = RecordingPause::new();
    let fetcher = ResilientFetcher::new(transport.clone(), pause.clone(), policy(5));

    let classify = |response: &HttpResponse| match response.status {
        503 => Disposition::RateLimited,
        _ => Disposition::from_status(response),
    };
    fetcher.fetch_with(&request(), classify).unwrap();

    assert_eq!(transport.requests().len(), 2);
    assert_eq!(pause.pauses(), secs(&[1]));
}

#[test]
fn test_server_message_extraction() {
    let nested = HttpResponse::new(400, r#"{"error": {"message": "bad key"}}"#);
    let flat = HttpResponse::new(400, r#"{"error": "nope"}"#);
    let html = HttpResponse::new(400, "<html>oops</html>");

    assert_eq!(nested.server_message().as_deref(), Some("bad key"));
    assert_eq!(flat.server_message().as_deref(), Some("nope"));
    assert_eq!(html.server_message(), None);
}

#[test]
fn test_attempt_scope_cancellation() {
    let scope = AttemptScope::new(1, Duration::from_secs(60));
    assert_eq!(scope.attempt(), 1);
    assert!(!scope.is_cancelled());
    assert!(scope.remaining() > Duration::from_secs(50));

    scope.cancel();
    assert!(scope.is_cancelled());

    let expired = AttemptScope::new(2, Duration::ZERO);
    assert!(expired.is_cancelled());
    assert_eq!(expired.remaining(), Duration::ZERO);
}
