//! A single unit of work: one remote call, one extracted value
//!
//! A [`Step`] is configured with a request builder (prior values → request)
//! and an extractor (successful body → value). Running it performs exactly
//! one call through the [`RemoteClient`] and classifies what came back.

use std::any::type_name;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{ErrorKind, StepError};
use super::value::{StepValue, Values};
use crate::remote::{FailureReason, RemoteClient, RemoteRequest, RemoteResult};

type BuildFn = Box<dyn Fn(&StepInput<'_>) -> Result<RemoteRequest, StepError> + Send + Sync>;
type ExtractFn = Box<dyn Fn(serde_json::Value) -> Result<StepValue, String> + Send + Sync>;

/// Result of running one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StepOutcome {
    /// The call succeeded and the value was extracted
    Ok {
        /// Extracted value carried to later steps
        value: StepValue,
    },
    /// The step failed
    Err {
        /// What went wrong
        error: StepError,
    },
}

impl StepOutcome {
    /// Whether the step succeeded
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The failure, if any
    #[must_use]
    pub const fn error(&self) -> Option<&StepError> {
        match self {
            Self::Ok { .. } => None,
            Self::Err { error } => Some(error),
        }
    }

    /// The extracted value, if the step succeeded
    #[must_use]
    pub const fn value(&self) -> Option<&StepValue> {
        match self {
            Self::Ok { value } => Some(value),
            Self::Err { .. } => None,
        }
    }
}

impl From<StepError> for StepOutcome {
    fn from(error: StepError) -> Self {
        Self::Err { error }
    }
}

/// What a request builder sees: the step's own name and the values
/// produced by earlier steps.
pub struct StepInput<'a> {
    step: &'a str,
    values: &'a Values,
}

impl<'a> StepInput<'a> {
    /// Wrap the accumulated values for the named step
    #[must_use]
    pub const fn new(step: &'a str, values: &'a Values) -> Self {
        Self { step, values }
    }

    /// All values produced so far
    #[must_use]
    pub const fn values(&self) -> &'a Values {
        self.values
    }

    /// A required text value from a predecessor
    pub fn text(&self, key: &str) -> Result<&'a str, StepError> {
        self.values
            .text(key)
            .ok_or_else(|| self.missing(key, "text"))
    }

    /// A required numeric value from a predecessor
    pub fn number(&self, key: &str) -> Result<u64, StepError> {
        self.values
            .number(key)
            .ok_or_else(|| self.missing(key, "number"))
    }

    /// Build a `POST` request, reporting serialization failure as
    /// [`ErrorKind::InvalidRequest`]
    pub fn post<T: Serialize>(&self, path: String, body: &T) -> Result<RemoteRequest, StepError> {
        RemoteRequest::post(path, body).map_err(|e| {
            StepError::new(
                self.step,
                ErrorKind::InvalidRequest,
                format!("failed to serialize request body: {e}"),
            )
        })
    }

    fn missing(&self, key: &str, expected: &str) -> StepError {
        StepError::new(
            self.step,
            ErrorKind::SkippedDependency,
            format!("required {expected} value '{key}' was not produced by an earlier step"),
        )
    }
}

/// One named remote call with its request builder and extractor
pub struct Step {
    name: String,
    depends_on: Vec<String>,
    output_key: Option<String>,
    build: BuildFn,
    extract: ExtractFn,
}

impl Step {
    /// Create a step whose success is just a 2xx response.
    ///
    /// Use [`Step::extract`] to pull a value out of the response body.
    pub fn new<F>(name: &str, build: F) -> Self
    where
        F: Fn(&StepInput<'_>) -> Result<RemoteRequest, StepError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            depends_on: Vec::new(),
            output_key: None,
            build: Box::new(build),
            extract: Box::new(|_| Ok(StepValue::Unit)),
        }
    }

    /// Declare a predecessor that must have succeeded before this step runs
    #[must_use]
    pub fn after(mut self, predecessor: &str) -> Self {
        self.depends_on.push(predecessor.to_string());
        self
    }

    /// Deserialize the response body as `T` and map it to the value stored
    /// under `key`.
    ///
    /// A body that does not match `T` becomes
    /// [`ErrorKind::MalformedResponse`].
    #[must_use]
    pub fn extract<T, F>(mut self, key: &str, map: F) -> Self
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) -> StepValue + Send + Sync + 'static,
    {
        self.output_key = Some(key.to_string());
        self.extract = Box::new(move |body| {
            serde_json::from_value::<T>(body)
                .map(&map)
                .map_err(|e| format!("unexpected {} response: {e}", short_type_name::<T>()))
        });
        self
    }

    /// Step name, as shown in reports
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the steps that must succeed first
    #[must_use]
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Key the extracted value is stored under, if any
    #[must_use]
    pub fn output_key(&self) -> Option<&str> {
        self.output_key.as_deref()
    }

    /// Build the request for the current values without sending it
    pub fn request(&self, values: &Values) -> Result<RemoteRequest, StepError> {
        (self.build)(&StepInput::new(&self.name, values))
    }

    /// Run the step: build the request, make exactly one call, and extract
    /// the value only if the call succeeded.
    pub async fn run(&self, values: &Values, client: &dyn RemoteClient) -> StepOutcome {
        let request = match self.request(values) {
            Ok(request) => request,
            Err(error) => return error.into(),
        };

        match client.send(request).await {
            RemoteResult::Success { status, body } => match (self.extract)(body) {
                Ok(value) => StepOutcome::Ok { value },
                Err(detail) => {
                    StepError::new(&self.name, ErrorKind::MalformedResponse, detail)
                        .with_status(status)
                        .into()
                }
            },
            RemoteResult::Failure(failure) => {
                let kind = match failure.reason {
                    FailureReason::Transport => ErrorKind::Transport,
                    FailureReason::HttpStatus => ErrorKind::HttpError,
                    FailureReason::InvalidBody => ErrorKind::MalformedResponse,
                };
                let error = StepError::new(&self.name, kind, failure.raw_body);
                match failure.status {
                    Some(status) => error.with_status(status).into(),
                    None => error.into(),
                }
            }
        }
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("output_key", &self.output_key)
            .finish_non_exhaustive()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
