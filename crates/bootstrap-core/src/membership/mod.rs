//! Client side of the etcd v2 members API.
//!
//! - [`MembersClient`]: raw `GET`/`POST`/`DELETE` against `/v2/members`
//! - [`MembershipQuery`]: sequential, first-success probe for a live cluster
//! - [`MembershipMutator`]: idempotent evict/add with best-effort semantics

pub mod client;
pub mod errors;
pub mod mutator;
pub mod query;

pub use client::{MembersClient, MembersClientConfig};
pub use errors::MembershipError;
pub use mutator::{MembershipMutator, MutationOutcome};
pub use query::{ClusterView, MembershipQuery};

/// Path of the members collection.
pub const MEMBERS_PATH: &str = "/v2/members";

/// `POST /v2/members` succeeded.
pub const STATUS_MEMBER_ADDED: u16 = 201;

/// `POST /v2/members` for a peer URL that is already registered.
pub const STATUS_MEMBER_ALREADY_PRESENT: u16 = 409;

/// `DELETE /v2/members/{id}` succeeded.
pub const STATUS_MEMBER_REMOVED: u16 = 204;

/// `DELETE /v2/members/{id}` for a member that no longer exists.
pub const STATUS_MEMBER_GONE: u16 = 410;
