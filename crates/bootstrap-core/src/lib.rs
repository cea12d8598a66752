//! # Bootstrap Core
//!
//! Boot-time membership reconciliation for etcd clusters running on instances whose
//! addresses are not known in advance.
//!
//! - **[`discovery`]**: provider-specific identity and inventory lookup (`static`, `gce`).
//!
//! - **[`membership`]**: etcd v2 members API client, sequential cluster probe, and
//!   idempotent add/remove.
//!
//! - **[`reconcile`]**: the join-versus-bootstrap decision, evictions and final peer list.
//!
//! - **[`emitter`]**: the environment-style peers file consumed by the etcd unit.
//!
//! - **[`bootstrap`]**: one complete run, with bounded retry and dry-run support.
//!
//! - **[`config`]**: layered configuration (defaults, TOML file, environment).
//!
//! ## Run Flow
//!
//! ```text
//! ┌──────────────────┐
//! │ InstanceIdentity │  who am I, what is my address
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │  PeerDiscovery   │  who should be in the cluster
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │ MembershipQuery  │  probe candidates in order, first answer wins
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │    Reconciler    │ ─── self absent from live cluster ──► join (EXISTING)
//! └────────┬─────────┘ ─── otherwise ─────────────────────► bootstrap (NEW)
//!          ▼
//! ┌──────────────────┐
//! │MembershipMutator │  evict stale members, add self (join only, best effort)
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │  ConfigEmitter   │  write ETCD_* peers file
//! └──────────────────┘
//! ```

pub mod bootstrap;
pub mod config;
pub mod discovery;
pub mod emitter;
pub mod membership;
pub mod reconcile;
pub mod types;

pub use bootstrap::{BootstrapError, BootstrapReport, Bootstrapper, RetryPolicy, RunMode};
pub use reconcile::{ConfigurationError, Reconciler};
