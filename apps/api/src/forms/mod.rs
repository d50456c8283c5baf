// Form handling shared by the browser-facing controllers and the server.
// Raw submissions are normalized, validated against a schema, then handed to
// a remote operation whose result folds back into controller state.

pub mod errors;
pub mod normalize;
pub mod remote;
pub mod schema;
pub mod submission;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{FieldErrorSet, SubmissionResult};
pub use normalize::{normalize, FileBlob, FormData, FormValue, NormalizedForm};
pub use remote::{RemoteError, RemoteOperation};
pub use schema::{FormSchema, FormValidator, JsonFormSchema, Refine};
pub use submission::{
    FormSubmissionController, MountHandle, SubmissionPhase, SubmitError, SubmitOutcome,
};
