use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

pub const TRACING_FLAG_ENV: &str = "TRANSIT_TRACING";
pub const TRACING_PROJECT_ENV: &str = "TRANSIT_TRACING_PROJECT";

/// Session counters kept by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Turns,
    CannedReplies,
    ModelCalls,
    ToolCalls,
    Bookings,
}

impl Counter {
    pub const ALL: [Counter; 5] = [
        Self::Turns,
        Self::CannedReplies,
        Self::ModelCalls,
        Self::ToolCalls,
        Self::Bookings,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Turns => "turns",
            Self::CannedReplies => "canned_replies",
            Self::ModelCalls => "model_calls",
            Self::ToolCalls => "tool_calls",
            Self::Bookings => "bookings",
        }
    }
}

#[derive(Debug, Default)]
pub struct AppMetrics {
    counts: [AtomicU64; Counter::ALL.len()],
    latency_millis: AtomicU64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add(&self, counter: Counter, amount: u64) {
        self.counts[counter as usize].fetch_add(amount, Ordering::Relaxed);
    }

    pub fn incr(&self, counter: Counter) {
        self.add(counter, 1);
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.counts[counter as usize].load(Ordering::Relaxed)
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn avg_latency_millis(&self) -> f64 {
        match self.get(Counter::Turns) {
            0 => 0.0,
            turns => self.latency_millis.load(Ordering::Relaxed) as f64 / turns as f64,
        }
    }

    /// `name=value` pairs for every counter, then the average turn latency.
    pub fn summary(&self) -> String {
        let mut parts = Counter::ALL
            .iter()
            .map(|counter| format!("{}={}", counter.name(), self.get(*counter)))
            .collect::<Vec<_>>();
        parts.push(format!("avg_latency_ms={:.1}", self.avg_latency_millis()));
        parts.join(" ")
    }
}

/// Operator toggle for verbose tracing of a named project. Never changes routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingFlag {
    pub enabled: bool,
    pub project: Option<String>,
}

impl TracingFlag {
    pub fn from_env() -> Self {
        Self::from_values(
            env::var(TRACING_FLAG_ENV).ok().as_deref(),
            env::var(TRACING_PROJECT_ENV).ok(),
        )
    }

    pub fn from_values(flag: Option<&str>, project: Option<String>) -> Self {
        let enabled = matches!(
            flag.map(|v| v.trim().to_lowercase()).as_deref(),
            Some("true" | "1" | "yes" | "on")
        );

        Self {
            enabled,
            project: project.filter(|p| !p.trim().is_empty()),
        }
    }

    pub fn banner(&self) -> String {
        if self.enabled {
            format!(
                "Tracing is ENABLED for project: {}",
                self.project.as_deref().unwrap_or("default")
            )
        } else {
            format!("Tracing is NOT enabled. Set {TRACING_FLAG_ENV}=true to turn it on.")
        }
    }
}

/// JSON logs on stderr so stdout stays a clean transcript. `RUST_LOG` overrides the
/// default filter; `verbose` lowers the default to debug for the workspace crates.
pub fn init_tracing(service_name: &str, verbose: bool) {
    TRACING_INIT.get_or_init(|| {
        let level = if verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "warn,{service_name}={level},transit_agents={level},transit_retrieval={level},transit_llm={level}"
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
