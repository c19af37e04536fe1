//! Scripted transport for crawler tests

use crate::crawler::fetcher::{QueryOptions, Transport, TransportError};
use crate::state::Endpoint;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Scripted response to one request
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// A page with this many generated items
    Items(usize),
    /// A page with exactly these items
    Raw(Vec<Value>),
    RateLimited,
    ValidationFailed,
    Fail(String),
    /// Fires the token while the request is in flight, then returns a full page
    CancelDuring(CancellationToken),
}

/// A request the transport received
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub endpoint: Endpoint,
    pub token: String,
    pub options: QueryOptions,
}

/// Transport replaying per-query scripts; unscripted requests return an empty page
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, q: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(q.to_string(), steps.into());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, q: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.options.q == q)
            .collect()
    }
}

/// Subject named in a query (`location:x` or `user:x ...`)
fn subject_of(q: &str) -> &str {
    let head = q.split_whitespace().next().unwrap_or_default();
    head.split_once(':').map(|(_, s)| s).unwrap_or(head)
}

/// Generated items, unique per subject, sort mode and page
pub(crate) fn generate_items(endpoint: Endpoint, options: &QueryOptions, count: usize) -> Vec<Value> {
    let subject = subject_of(&options.q);
    let sort = options.sort.unwrap_or("best");

    (0..count)
        .map(|i| match endpoint {
            Endpoint::Users => json!({
                "login": format!("{}-{}-p{}-{}", subject, sort, options.page, i)
            }),
            Endpoint::Repositories => {
                let name = format!("repo-p{}-{}", options.page, i);
                json!({
                    "name": name,
                    "full_name": format!("{}/{}", subject, name),
                    "owner": {
                        "login": subject,
                        "html_url": format!("https://github.com/{}", subject)
                    },
                    "language": "Rust",
                    "description": null,
                    "html_url": format!("https://github.com/{}/{}", subject, name),
                    "stargazers_count": 3 + i,
                    "homepage": null
                })
            }
        })
        .collect()
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch_page(
        &self,
        endpoint: Endpoint,
        token: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Value>, TransportError> {
        self.calls.lock().unwrap().push(Call {
            endpoint,
            token: token.to_string(),
            options: options.clone(),
        });

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&options.q)
            .and_then(VecDeque::pop_front);

        match step {
            None => Ok(Vec::new()),
            Some(Step::Items(count)) => Ok(generate_items(endpoint, options, count)),
            Some(Step::Raw(items)) => Ok(items),
            Some(Step::RateLimited) => Err(TransportError::classify(
                "API rate limit exceeded for user ID 1.",
            )),
            Some(Step::ValidationFailed) => Err(TransportError::classify("Validation Failed")),
            Some(Step::Fail(message)) => Err(TransportError::Other(message)),
            Some(Step::CancelDuring(cancel)) => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                cancel.cancel();
                Ok(generate_items(endpoint, options, 30))
            }
        }
    }
}
