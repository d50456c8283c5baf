//! Form Submission Controller.
//!
//! Owns the lifecycle of one form's submissions:
//!
//! ```text
//! idle -> validating -> idle (local failure, errors stored)
//!                    -> submitting -> idle (success, errors cleared)
//!                                  -> idle (remote error, errors stored)
//! ```
//!
//! At most one submission is in flight per controller; `submit` calls made
//! while one is pending return [`SubmitOutcome::Ignored`] without touching
//! the remote operation. There is no retry on any failure path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::forms::errors::{FieldErrorSet, SubmissionResult};
use crate::forms::normalize::FormData;
use crate::forms::remote::{RemoteError, RemoteOperation};
use crate::forms::schema::{check_form, FormValidator};

/// Shared flag marking whether the UI that owns a controller still exists.
///
/// Results that arrive after [`MountHandle::unmount`] are discarded.
#[derive(Debug, Clone)]
pub struct MountHandle(Arc<AtomicBool>);

impl MountHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for MountHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Validating,
    Submitting,
}

/// What a single `submit` call ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    /// The remote operation persisted the submission.
    Succeeded(T),
    /// The schema rejected the form; no remote call was made.
    Invalid(FieldErrorSet),
    /// The remote operation reported a business or transport failure.
    Rejected(FieldErrorSet),
    /// Another submission was already pending.
    Ignored,
    /// The owner unmounted before the result arrived.
    Discarded,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

type SuccessCallback<T> = Box<dyn Fn(&T) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&FieldErrorSet) + Send + Sync>;

#[derive(Debug)]
struct SubmissionState {
    phase: SubmissionPhase,
    errors: Option<FieldErrorSet>,
}

pub struct FormSubmissionController<T> {
    remote: Arc<dyn RemoteOperation<T>>,
    schema: Option<Arc<dyn FormValidator>>,
    on_success: Option<SuccessCallback<T>>,
    on_error: Option<ErrorCallback>,
    timeout: Option<Duration>,
    mount: MountHandle,
    state: Mutex<SubmissionState>,
}

/// Returns the controller to idle however `submit` exits, including when
/// its future is dropped mid-flight.
struct PhaseGuard<'a> {
    state: &'a Mutex<SubmissionState>,
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .phase = SubmissionPhase::Idle;
    }
}

impl<T: Send + 'static> FormSubmissionController<T> {
    pub fn new(remote: Arc<dyn RemoteOperation<T>>) -> Self {
        Self {
            remote,
            schema: None,
            on_success: None,
            on_error: None,
            timeout: None,
            mount: MountHandle::new(),
            state: Mutex::new(SubmissionState {
                phase: SubmissionPhase::Idle,
                errors: None,
            }),
        }
    }

    /// Validate locally before calling the remote operation.
    pub fn with_schema(mut self, schema: Arc<dyn FormValidator>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&FieldErrorSet) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Bound the remote call. Without one the controller stays pending for
    /// as long as the remote operation does.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_mount(mut self, mount: MountHandle) -> Self {
        self.mount = mount;
        self
    }

    pub fn mount_handle(&self) -> MountHandle {
        self.mount.clone()
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.lock().phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase() != SubmissionPhase::Idle
    }

    /// Errors from the most recent failed submission, if any.
    pub fn errors(&self) -> Option<FieldErrorSet> {
        self.lock().errors.clone()
    }

    /// Clears error state. Pending status is untouched.
    pub fn reset(&self) {
        self.lock().errors = None;
    }

    /// Validates `form` and, when it passes, hands the original raw form to
    /// the remote operation.
    ///
    /// Only a contract violation by the remote side is returned as `Err`;
    /// every other failure is stored and reported through `on_error`.
    pub async fn submit(&self, form: FormData) -> Result<SubmitOutcome<T>, SubmitError> {
        {
            let mut state = self.lock();
            if state.phase != SubmissionPhase::Idle {
                debug!("Submission ignored: another is pending");
                return Ok(SubmitOutcome::Ignored);
            }
            state.phase = SubmissionPhase::Validating;
        }
        let guard = PhaseGuard { state: &self.state };

        if let Some(schema) = &self.schema {
            if let Err(errors) = check_form(schema.as_ref(), &form) {
                debug!(
                    "Local validation failed ({} field(s))",
                    errors.field_errors.len()
                );
                self.lock().errors = Some(errors.clone());
                drop(guard);
                self.notify_error(&errors);
                return Ok(SubmitOutcome::Invalid(errors));
            }
        }

        self.lock().phase = SubmissionPhase::Submitting;
        let result = self.call_remote(&form).await;

        if !self.mount.is_mounted() {
            debug!("Submission settled after unmount; result discarded");
            return Ok(SubmitOutcome::Discarded);
        }

        let result = match result {
            Ok(result) => result,
            Err(e) => match e.user_message() {
                Some(errors) => {
                    warn!("Remote operation failed: {e}");
                    SubmissionResult::error(errors)
                }
                None => {
                    error!("Remote operation violated its contract: {e}");
                    return Err(e.into());
                }
            },
        };

        match result {
            SubmissionResult::Success { data } => {
                self.lock().errors = None;
                drop(guard);
                if let Some(callback) = &self.on_success {
                    callback(&data);
                }
                Ok(SubmitOutcome::Succeeded(data))
            }
            SubmissionResult::Error { errors } => {
                self.lock().errors = Some(errors.clone());
                drop(guard);
                self.notify_error(&errors);
                Ok(SubmitOutcome::Rejected(errors))
            }
        }
    }

    async fn call_remote(&self, form: &FormData) -> Result<SubmissionResult<T>, RemoteError> {
        let call = self.remote.call(form);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(RemoteError::Timeout)),
            None => call.await,
        }
    }

    fn notify_error(&self, errors: &FieldErrorSet) {
        if let Some(callback) = &self.on_error {
            callback(errors);
        }
    }

    fn lock(&self) -> MutexGuard<'_, SubmissionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
