//! Cross-runtime call boundary.
//!
//! Interpreted callables run in the caller. Compiled callables cross into a
//! [`Runtime`], which must be ready and must export the callable.

pub mod callable;
pub mod mock;
pub mod payload;
pub mod runtime;

use tracing::debug;

pub use callable::Callable;
pub use mock::{MockConfig, MockRuntime};
pub use payload::{Output, Payload};
pub use runtime::{Invocation, Runtime, RuntimeHandle, RuntimeOptions, RuntimeState};

use crate::core::WorkloadSpec;
use crate::{BenchError, BenchResult, interp};

/// Dispatches callables to the interpreter or a runtime.
pub struct Boundary;

impl Boundary {
    /// Call by external name with a JSON payload.
    pub fn call_json(runtime: &dyn Runtime, name: &str, payload: &str) -> BenchResult<Invocation> {
        let callable: Callable = name.parse()?;
        let payload = Payload::decode_json(payload)?;
        Self::call(runtime, callable, payload)
    }

    pub fn call(runtime: &dyn Runtime, callable: Callable, payload: Payload) -> BenchResult<Invocation> {
        if payload.algorithm() != callable.algorithm {
            return Err(BenchError::InvalidPayload(format!(
                "{callable} expects a {} payload, got {}",
                callable.algorithm,
                payload.algorithm()
            )));
        }
        let workload = payload.into_workload()?;
        Self::call_workload(runtime, callable, &workload)
    }

    pub fn call_workload(
        runtime: &dyn Runtime,
        callable: Callable,
        workload: &WorkloadSpec,
    ) -> BenchResult<Invocation> {
        if workload.algorithm() != callable.algorithm {
            return Err(BenchError::InvalidPayload(format!(
                "{callable} cannot run a {} workload",
                workload.algorithm()
            )));
        }
        workload.validate()?;

        if !callable.variant.requires_runtime() {
            debug!(%callable, "running in interpreter");
            return Ok(Invocation {
                output: interp::run(workload)?,
                failures: Vec::new(),
            });
        }

        let state = runtime.state();
        if state != RuntimeState::Ready {
            return Err(BenchError::NotReady(format!("{} is {state}", runtime.name())));
        }
        if !runtime.has_export(callable) {
            return Err(BenchError::MissingVariant(format!(
                "{} does not export {callable}",
                runtime.name()
            )));
        }
        runtime.invoke(callable, workload)
    }
}
