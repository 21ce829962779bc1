//! Liveness / correctness probe
//!
//! Two submissions: a clean payload with threshold-clearing signals must be
//! admitted, the same signals carrying the filter's first disallowed marker
//! must be rejected for admissibility.

use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::Result;
use crate::pipeline::{AdmissionPipeline, RejectReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub admission_ok: bool,
    pub admissibility_ok: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.admission_ok && self.admissibility_ok
    }
}

/// Run both health submissions. Contract violations (wrong dimension) are
/// returned as errors; a failed expectation only marks the report.
pub fn run_health_check(pipeline: &AdmissionPipeline, signals: &[f64]) -> Result<HealthReport> {
    info!("[1/2] Checking admission path");
    let admitted = pipeline.submit(signals, &json!({"test": "HEALTH_CHECK"}), None)?;
    let admission_ok = admitted.is_admitted();
    match admitted.record() {
        Some(record) => info!(epoch = %record.epoch_id, "Admission path OK"),
        None => error!(
            reason = ?admitted.reject_reason(),
            potential = admitted.potential(),
            "Admission path FAILED: expected commit"
        ),
    }

    info!("[2/2] Checking admissibility filter");
    let admissibility_ok = match pipeline.filter().markers().first() {
        Some(marker) => {
            let mut payload = json!({"event": "UNAUTHORIZED_ACCESS"});
            payload[marker.as_str()] = json!("redacted");

            let blocked = pipeline.submit(signals, &payload, None)?;
            let ok = blocked.reject_reason() == Some(RejectReason::ExposedCredentials);
            if ok {
                info!(marker = %marker, "Admissibility filter blocked exposed credentials");
            } else {
                error!(
                    marker = %marker,
                    admitted = blocked.is_admitted(),
                    "Admissibility filter bypass detected"
                );
            }
            ok
        }
        None => {
            error!("Admissibility filter has no disallowed markers");
            false
        }
    };

    Ok(HealthReport {
        admission_ok,
        admissibility_ok,
    })
}
