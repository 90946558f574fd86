//! # Service Orchestration
//!
//! Sequence storage reads and lifecycle-engine checks for each operation.
//! Handlers stay thin: they validate input, call one service function with
//! the current time, and wrap the result in the response envelope.
//!
//! Gates are evaluated in a fixed order and each lookup happens only after
//! the previous step passed, so the first failing precondition decides the
//! reported error. Uniqueness pre-checks are early exits only; the storage
//! constraint is the authority and reports the same error when it fires.

pub mod check_ins;
pub mod members;
pub mod memberships;
pub mod plans;
