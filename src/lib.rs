//! Smoke test for an SMS-send endpoint: one JSON POST over a pluggable REST
//! transport, with an in-memory mock transport for deterministic tests.

pub mod adapter;
pub mod driver;
pub mod mock;
pub mod payload;

pub use reqwest::Method;

pub use adapter::{
    APPLICATION_JSON, Client, ReqwestTransport, RestBytes, RestError, RestErrorKind, RestFuture,
    RestRequest, RestResponse, RestResult, RestTransport, RestTransportState,
};
pub use driver::{SmokeConfig, SmokeError, render, run, send};
pub use mock::{
    MockBehavior, MockBehaviorPlan, MockResponse, MockRestAdapter, MockRestStateSnapshot,
};
pub use payload::{DEFAULT_PHONE, DEFAULT_SCENE, DEFAULT_URL, SmsScene, SmsSendRequest};
