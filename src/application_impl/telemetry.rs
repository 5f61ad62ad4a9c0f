use crate::application_port::*;
use crate::domain_port::*;
use std::future::Future;
use tracing::{debug, error, info, warn};

/// Default telemetry sink: turns boundaries into `tracing` events. Only store
/// failures are logged at error level.
#[derive(Debug, Default)]
pub struct TracingTelemetry;

impl TokenTelemetry for TracingTelemetry {
    fn record(&self, event: TelemetryEvent) {
        let operation = event.operation.as_str();
        match event.phase {
            Phase::Start => debug!(operation, "token operation started"),
            Phase::Success => debug!(operation, "token operation succeeded"),
            Phase::Failure(kind @ "store_failure") => {
                error!(operation, kind, "token operation failed")
            }
            Phase::Failure(kind @ "lock_timeout") => {
                warn!(operation, kind, "token operation timed out")
            }
            Phase::Failure(kind) => info!(operation, kind, "token operation rejected"),
        }
    }
}

pub(crate) async fn instrumented<T, F>(
    telemetry: &dyn TokenTelemetry,
    operation: Operation,
    fut: F,
) -> Result<T, TokenError>
where
    F: Future<Output = Result<T, TokenError>>,
{
    telemetry.record(TelemetryEvent {
        operation,
        phase: Phase::Start,
    });
    let result = fut.await;
    let phase = match &result {
        Ok(_) => Phase::Success,
        Err(e) => Phase::Failure(e.kind()),
    };
    telemetry.record(TelemetryEvent { operation, phase });
    result
}
