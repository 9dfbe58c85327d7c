//! Application Layer - Orchestration over the domain and ports
//!
//! The trade orchestrator owns the per-mint lifecycle; the exit monitor
//! watches held positions for threshold crossings.

pub mod exit_monitor;
pub mod orchestrator;

pub use exit_monitor::{ExitMonitor, ExitMonitorSettings, MonitorOutcome};
pub use orchestrator::{
    OrchestratorServices, OrchestratorSettings, OrchestratorStatus, TradeOrchestrator,
};
