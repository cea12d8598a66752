//! Mock Infrastructure for Testing the Bootstrapper
//!
//! ## Components
//!
//! - `EtcdMockBuilder`: Wraps mockito to serve the etcd v2 members API
//! - `GceMockBuilder`: Serves the Compute Engine metadata server and inventory API
//! - Test helpers for building members and bootstrappers
//!
//! ## Usage
//!
//! ```ignore
//! use tests::mock_infrastructure::{member, EtcdMockBuilder};
//!
//! let mut etcd = EtcdMockBuilder::new().await;
//! etcd.mock_members(&[member("a1", "i-1", "http://10.0.0.1:2380")]).await;
//!
//! // Use etcd.url() as the coordinator
//! ```

pub mod gce_mock;

pub use etcd_mock::EtcdMockBuilder;
pub use gce_mock::{gce_instance, GceMockBuilder};
pub use test_helpers::*;
