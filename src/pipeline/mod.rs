//! Dependent step pipeline
//!
//! Steps run strictly in order; each step's extracted value feeds later
//! steps, and the first failure halts the run. Every outcome, including
//! failure, ends up in the returned [`RunReport`].

pub mod cancel;
pub mod error;
pub mod executor;
pub mod report;
pub mod step;
pub mod value;

pub use cancel::CancelToken;
pub use error::{ErrorKind, StepError};
pub use executor::{Executor, NoopObserver, Observers, RunObserver};
pub use report::{RunReport, RunState, StepRecord};
pub use step::{Step, StepInput, StepOutcome};
pub use value::{StepValue, Values};
