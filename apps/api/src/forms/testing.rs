//! In-memory remote operations and schemas for controller tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::forms::errors::{FieldErrorSet, SubmissionResult};
use crate::forms::normalize::FormData;
use crate::forms::remote::{RemoteError, RemoteOperation};
use crate::forms::schema::FormSchema;

type Responder<T> = Box<dyn Fn(&FormData) -> Result<SubmissionResult<T>, RemoteError> + Send + Sync>;

/// Remote operation answering from a closure, optionally held until released.
pub struct FakeRemote<T> {
    calls: AtomicUsize,
    received: Mutex<Vec<FormData>>,
    gate: Option<Arc<Notify>>,
    respond: Responder<T>,
}

impl<T> FakeRemote<T> {
    pub fn new(
        respond: impl Fn(&FormData) -> Result<SubmissionResult<T>, RemoteError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            gate: None,
            respond: Box::new(respond),
        }
    }

    /// Every call waits for a `notify_one` on `gate` before answering.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<FormData> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T: Send + 'static> RemoteOperation<T> for FakeRemote<T> {
    async fn call(&self, form: &FormData) -> Result<SubmissionResult<T>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push(form.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        (self.respond)(form)
    }
}

/// Rejects candidates missing any of the listed top-level fields.
pub struct RequireFields(pub &'static [&'static str]);

impl FormSchema for RequireFields {
    type Output = ();

    fn parse(&self, candidate: &Value) -> Result<(), FieldErrorSet> {
        let mut errors = FieldErrorSet::new();
        for name in self.0 {
            if candidate.get(*name).is_none() {
                errors.add_field(*name, "Required");
            }
        }
        errors.into_result(())
    }
}
