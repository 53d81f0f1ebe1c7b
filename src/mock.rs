use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use sonic_rs::to_vec;

use super::adapter::{
    RestBytes, RestError, RestErrorKind, RestFuture, RestRequest, RestResponse, RestResult,
    RestTransport, RestTransportState,
};

/// What the mock does with the next request.
#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    #[default]
    Pass,
    ConnectError {
        reason: String,
    },
    SendError {
        reason: String,
    },
    ReceiveError {
        status: Option<u16>,
        reason: String,
    },
    TimeoutError {
        reason: String,
    },
    InternalError {
        reason: String,
    },
}

impl MockBehavior {
    pub fn connect_error(reason: impl Into<String>) -> Self {
        Self::ConnectError {
            reason: reason.into(),
        }
    }

    pub fn send_error(reason: impl Into<String>) -> Self {
        Self::SendError {
            reason: reason.into(),
        }
    }

    pub fn receive_error(reason: impl Into<String>, status: Option<u16>) -> Self {
        Self::ReceiveError {
            status,
            reason: reason.into(),
        }
    }

    pub fn timeout_error(reason: impl Into<String>) -> Self {
        Self::TimeoutError {
            reason: reason.into(),
        }
    }

    pub fn internal_error(reason: impl Into<String>) -> Self {
        Self::InternalError {
            reason: reason.into(),
        }
    }

    fn into_error(self) -> Option<RestError> {
        match self {
            Self::Pass => None,
            Self::ConnectError { reason } => Some(RestError::connect(reason)),
            Self::SendError { reason } => Some(RestError::new(RestErrorKind::Send, None, reason)),
            Self::ReceiveError { status, reason } => {
                Some(RestError::new(RestErrorKind::Receive, status, reason))
            }
            Self::TimeoutError { reason } => {
                Some(RestError::new(RestErrorKind::Timeout, None, reason))
            }
            Self::InternalError { reason } => Some(RestError::internal(reason)),
        }
    }
}

/// Ordered behaviors, one consumed per request. An exhausted plan passes.
#[derive(Clone, Debug, Default)]
pub struct MockBehaviorPlan {
    request: VecDeque<MockBehavior>,
}

impl MockBehaviorPlan {
    pub fn push(&mut self, behavior: MockBehavior) -> &mut Self {
        self.request.push_back(behavior);
        self
    }

    pub fn pop(&mut self) -> MockBehavior {
        self.request.pop_front().unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.request.len()
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, RestBytes)>,
    pub body: RestBytes,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<RestBytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into())
    }

    pub fn json<T: Serialize>(status: u16, payload: &T) -> RestResult<Self> {
        let body = to_vec(payload)?;
        Ok(Self::new(status, body))
    }
}

#[derive(Clone, Debug)]
pub struct MockRestStateSnapshot {
    pub state: RestTransportState,
    pub request_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub behavior_remaining: usize,
    pub response_queue_len: usize,
    pub elapsed_total: Duration,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct MockRestAdapterState {
    state: RestTransportState,
    request_count: usize,
    last_url: Option<String>,
    last_status: Option<u16>,
    behavior_plan: MockBehaviorPlan,
    default_response_queue: VecDeque<MockResponse>,
    route_response_queues: HashMap<(Method, String), VecDeque<MockResponse>>,
    outbound_log: Vec<RestRequest>,
    last_error: Option<String>,
    elapsed_total: Duration,
}

impl MockRestAdapterState {
    fn snapshot(&self) -> MockRestStateSnapshot {
        MockRestStateSnapshot {
            state: self.state,
            request_count: self.request_count,
            last_url: self.last_url.clone(),
            last_status: self.last_status,
            behavior_remaining: self.behavior_plan.remaining(),
            response_queue_len: self.default_response_queue.len()
                + self
                    .route_response_queues
                    .values()
                    .map(VecDeque::len)
                    .sum::<usize>(),
            elapsed_total: self.elapsed_total,
            last_error: self.last_error.clone(),
        }
    }

    fn next_response(&mut self, request: &RestRequest) -> Option<MockResponse> {
        let route_key = (request.method.clone(), request.url.clone());
        if let Some(response) = self
            .route_response_queues
            .get_mut(&route_key)
            .and_then(VecDeque::pop_front)
        {
            return Some(response);
        }
        self.default_response_queue.pop_front()
    }
}

impl Default for MockRestAdapterState {
    fn default() -> Self {
        Self {
            state: RestTransportState::Idle,
            request_count: 0,
            last_url: None,
            last_status: None,
            behavior_plan: MockBehaviorPlan::default(),
            default_response_queue: VecDeque::new(),
            route_response_queues: HashMap::new(),
            outbound_log: Vec::new(),
            last_error: None,
            elapsed_total: Duration::ZERO,
        }
    }
}

/// In-memory [`RestTransport`] that records requests and replays queued responses.
///
/// Responses are taken from the `(method, url)` queue first, then the default
/// queue; with both empty the mock answers `200` with an empty body.
#[derive(Clone, Debug, Default)]
pub struct MockRestAdapter {
    state: Arc<Mutex<MockRestAdapterState>>,
}

impl MockRestAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior_plan(behavior_plan: MockBehaviorPlan) -> Self {
        let state = MockRestAdapterState {
            behavior_plan,
            ..MockRestAdapterState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self, operation: &str) -> MutexGuard<'_, MockRestAdapterState> {
        self.state
            .lock()
            .unwrap_or_else(|_| panic!("sms-smoke mock mutex poisoned while {operation}"))
    }

    pub fn snapshot(&self) -> MockRestStateSnapshot {
        self.lock("taking snapshot").snapshot()
    }

    pub fn queue_response(&self, response: MockResponse) {
        self.lock("queueing response").default_response_queue.push_back(response);
    }

    pub fn queue_response_for(
        &self,
        method: Method,
        url: impl Into<String>,
        response: MockResponse,
    ) {
        self.lock("queueing response by route")
            .route_response_queues
            .entry((method, url.into()))
            .or_default()
            .push_back(response);
    }

    pub fn queue_post_response(&self, url: impl Into<String>, response: MockResponse) {
        self.queue_response_for(Method::POST, url, response);
    }

    /// Every request seen so far, oldest first.
    pub fn outbound_requests(&self) -> Vec<RestRequest> {
        self.lock("reading outbound log").outbound_log.clone()
    }

    pub fn outbound_count(&self) -> usize {
        self.lock("reading outbound count").outbound_log.len()
    }
}

impl RestTransport for MockRestAdapter {
    fn execute(&self, request: RestRequest) -> RestFuture<RestResult<RestResponse>> {
        let adapter = self.clone();
        Box::pin(async move {
            let start = Instant::now();
            let mut state = adapter.lock("executing request");
            state.request_count += 1;
            state.last_url = Some(request.url.clone());
            state.state = RestTransportState::Busy;
            state.last_error = None;
            state.outbound_log.push(request.clone());

            if let Some(error) = state.behavior_plan.pop().into_error() {
                state.state = RestTransportState::Error;
                state.last_status = error.status;
                state.last_error = Some(error.message.clone());
                return Err(error);
            }

            let queued = state
                .next_response(&request)
                .unwrap_or_else(|| MockResponse::new(200, Bytes::new()));
            let elapsed = start.elapsed();
            state.last_status = Some(queued.status);
            state.state = RestTransportState::Idle;
            state.elapsed_total += elapsed;

            Ok(RestResponse {
                status: queued.status,
                headers: queued.headers,
                body: queued.body,
                elapsed,
            })
        })
    }
}
