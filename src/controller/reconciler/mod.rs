//! # Reconciler
//!
//! Status reconciliation for ManagedClusters and their dependent records.
//!
//! Each cycle probes every ManagedCluster, folds the probes into a phase and
//! conditions, publishes them as metrics and merges them into the resource's
//! status. Dependent Applications are classified afterwards.

pub mod api;
pub mod conditions;
pub mod dependents;
pub mod health;
pub mod phase;
pub mod probes;
pub mod reconcile;
pub mod status;
pub mod types;

pub use api::{AppRecord, KubePlatformApi, PlatformApi, WorkloadInstance};
pub use dependents::{DependentKind, DependentPhase, DependentRecord};
pub use health::{AppHealth, HealthSnapshot, SyncStatus};
pub use phase::{compute_phase, Phase};
pub use reconcile::{reconcile_cluster, run_cycle, CycleSummary};
pub use types::{Probe, ReconcileOutcome, Reconciler, ReconcilerError};
