use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use salvo::http::header::{CONTENT_TYPE, HeaderValue};
use salvo::prelude::*;

static ACTIONS_RECEIVED: AtomicU64 = AtomicU64::new(0);
static ACTIONS_APPLIED: AtomicU64 = AtomicU64::new(0);
static ACTIONS_DENIED: AtomicU64 = AtomicU64::new(0);
static LINK_PROMPTS: AtomicU64 = AtomicU64::new(0);
static SOFT_FAILURES: AtomicU64 = AtomicU64::new(0);
static REQUESTS_REJECTED: AtomicU64 = AtomicU64::new(0);
static DIALOGS_OPENED: AtomicU64 = AtomicU64::new(0);
static RESPONSE_URL_FAILURES: AtomicU64 = AtomicU64::new(0);

static STARTED_AT: OnceLock<Instant> = OnceLock::new();

pub struct Metrics;

impl Metrics {
    pub fn mark_started() {
        STARTED_AT.get_or_init(Instant::now);
    }

    pub fn action_received() {
        ACTIONS_RECEIVED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn action_applied() {
        ACTIONS_APPLIED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn action_denied() {
        ACTIONS_DENIED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn link_prompted() {
        LINK_PROMPTS.fetch_add(1, Ordering::Relaxed);
    }

    pub fn soft_failure() {
        SOFT_FAILURES.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_rejected() {
        REQUESTS_REJECTED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dialog_opened() {
        DIALOGS_OPENED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn response_url_failed() {
        RESPONSE_URL_FAILURES.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds() -> u64 {
        STARTED_AT
            .get()
            .map(|started| started.elapsed().as_secs())
            .unwrap_or(0)
    }
}

pub fn format_prometheus() -> String {
    let counters = [
        (
            "slack_actions_received_total",
            "Interactive payloads received",
            &ACTIONS_RECEIVED,
        ),
        (
            "slack_actions_applied_total",
            "Issue mutations applied from chat",
            &ACTIONS_APPLIED,
        ),
        (
            "slack_actions_denied_total",
            "Payloads refused for lack of permission",
            &ACTIONS_DENIED,
        ),
        (
            "slack_link_prompts_total",
            "Link-your-identity prompts sent",
            &LINK_PROMPTS,
        ),
        (
            "slack_action_soft_failures_total",
            "Payloads answered with a failure message",
            &SOFT_FAILURES,
        ),
        (
            "slack_requests_rejected_total",
            "Requests answered with 400, 401 or 403",
            &REQUESTS_REJECTED,
        ),
        (
            "slack_dialogs_opened_total",
            "Resolve dialogs opened",
            &DIALOGS_OPENED,
        ),
        (
            "slack_response_url_failures_total",
            "Failed posts to response urls",
            &RESPONSE_URL_FAILURES,
        ),
    ];

    let mut output = format!(
        "# HELP slack_actions_uptime_seconds Number of seconds the service has been running\n\
         # TYPE slack_actions_uptime_seconds gauge\n\
         slack_actions_uptime_seconds {}\n",
        Metrics::uptime_seconds()
    );
    for (name, help, counter) in counters {
        output.push_str(&format!(
            "\n# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n",
            counter.load(Ordering::Relaxed)
        ));
    }
    output
}

#[handler]
pub async fn metrics_endpoint(res: &mut Response) {
    res.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    res.body(format_prometheus());
}
