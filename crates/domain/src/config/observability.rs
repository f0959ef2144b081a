use serde::{Deserialize, Serialize};

/// Span export for the `serve` command.
///
/// JSON logs are always written. Spans additionally go to an OTLP/gRPC
/// collector once `otlp_endpoint` is set, e.g.
///
/// ```toml
/// [observability]
/// otlp_endpoint = "http://collector:4317"
/// sample_rate = 0.25
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    /// Reported as `service.name`.
    #[serde(default = "d_service_name")]
    pub service_name: String,
    /// Fraction of session traces kept, `0.0..=1.0`.
    #[serde(default = "d_sample_rate")]
    pub sample_rate: f64,
}

impl ObservabilityConfig {
    /// The collector to export to. A blank endpoint counts as unset.
    pub fn export_endpoint(&self) -> Option<&str> {
        self.otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// `sample_rate` forced into `0.0..=1.0`; NaN keeps nothing.
    pub fn sample_ratio(&self) -> f64 {
        if self.sample_rate.is_nan() {
            0.0
        } else {
            self.sample_rate.clamp(0.0, 1.0)
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: d_service_name(),
            sample_rate: d_sample_rate(),
        }
    }
}

fn d_service_name() -> String {
    "studybuddy".into()
}

fn d_sample_rate() -> f64 {
    1.0
}
