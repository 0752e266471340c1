#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wordle_sieve::{AttemptScope, HttpRequest, HttpResponse, Pause, Transport, TransportError};

pub type Reply = Result<HttpResponse, TransportError>;

/// Transport answering requests from a fixed script, in order.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Duration,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Self::with_delay(replies, Duration::ZERO)
    }

    /// Like [`ScriptedTransport::new`], but every reply arrives after `delay`.
    pub fn with_delay(replies: impl IntoIterator<Item = Reply>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::default(),
            delay,
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

impl Transport for ScriptedTransport {
    fn execute(
        &self,
        request: &HttpRequest,
        _scope: &AttemptScope,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let reply = self.replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| {
            let reason = format!("unscripted request to {}", request.url);
            Err(TransportError::Network(reason))
        })
    }
}

/// Pause that records durations instead of sleeping.
#[derive(Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

impl Pause for RecordingPause {
    fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}

pub fn ok(body: impl Into<String>) -> Reply {
    Ok(HttpResponse::new(200, body))
}

pub fn status(code: u16, body: impl Into<String>) -> Reply {
    Ok(HttpResponse::new(code, body))
}

pub fn timed_out() -> Reply {
    Err(TransportError::TimedOut)
}

pub fn network(reason: &str) -> Reply {
    Err(TransportError::Network(reason.to_string()))
}

/// A word-source page listing `words`, optionally linking to `next`.
///
/// The third letter of each word is emphasized the way the source highlights
/// the seed letter.
pub fn word_page(words: &[&str], next: Option<u32>) -> String {
    let mut html = String::from("<html><body><div class=\"list\">");
    for word in words {
        let (head, tail) = word.split_at(2.min(word.len()));
        let (mid, rest) = tail.split_at(1.min(tail.len()));
        html.push_str(&format!("{}<b>{}</b>{} ", head, mid, rest));
    }
    html.push_str("</div>");
    if let Some(n) = next {
        let link = format!("<a href=\"/5letterwordspage{}.htm\">Next page</a>", n);
        html.push_str(&link);
    }
    html.push_str("</body></html>");
    html
}
