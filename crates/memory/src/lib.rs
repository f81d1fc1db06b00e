//! In-memory implementation of the Stateforge cloud capability traits.
//!
//! [`MemoryCloud`] models just enough of S3 and DynamoDB semantics for the
//! provisioning workflow to be exercised without live cloud access:
//! buckets carry a region and hardening flags, tables go through a
//! configurable number of "creating" polls before reporting active, and a
//! non-empty bucket refuses deletion the way S3 does.
//!
//! The fake also records a per-operation call count and supports one-shot
//! fault injection, which the workflow and API tests use to verify
//! ordering, abort, and validation-gating behavior.

mod cloud;

pub use cloud::{BucketRecord, MemoryCloud, MemoryConnector};
