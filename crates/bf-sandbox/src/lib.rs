// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sandbox deploy, synthetic endpoint testing, failure extraction, and
//! the bounded repair loop — the subsystem that turns a rendered file
//! map into a verified, working backend (§4.7).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod endpoint_tests;
mod extract_failure;
mod implementer;
mod patch;
mod port_pool;
mod repair_loop;
mod review_loop;
mod runner;

pub use endpoint_tests::{run_endpoint_tests, test_value, update_value, EndpointTestClient};
pub use extract_failure::{extract_failure, extract_named_failures, tail, ExtractedFailure, TracebackLocation};
pub use implementer::{Implementer, MockImplementer};
pub use patch::build_patch_requests;
pub use port_pool::{PortPool, PortPoolError};
pub use repair_loop::{run_repair_loop, RepairOutcome, MAX_REPAIR_ATTEMPTS};
pub use review_loop::{
    enforce_score_floor, is_approved, run_review_loop, CodeReviewer, ReviewLoopOutcome,
    ReviewOutcome, APPROVAL_SCORE_THRESHOLD, MAX_REVIEW_ATTEMPTS,
};
pub use runner::{wait_for_health, CodeNormalizer, ContainerRunner, DeployHandle, WhitespaceNormalizer, CONTAINER_COMMAND_DEADLINE, HEALTH_CHECK_DEADLINE, HEALTH_POLL_INTERVAL, TEARDOWN_DEADLINE};
