//! # gym-core: Foundational Types for the Gym Membership Service
//!
//! Defines the primitives every other crate in the workspace builds on.
//! `gym-core` depends on nothing internal and performs no I/O.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `MemberId`, `PlanId`, `MembershipId` and
//!    `CheckInId` are distinct types. A `PlanId` cannot be passed where a
//!    `MemberId` is expected.
//!
//! 2. **Date-only arithmetic.** Membership windows are `CalendarDate`
//!    values with no time-of-day component. Adding a plan duration never
//!    crosses a timezone boundary.
//!
//! 3. **Validated contact fields.** `Email` is always trimmed and
//!    lowercased, so uniqueness on the stored form is case-insensitive.
//!
//! 4. **One error-code table.** `ErrorCode` is the single source of the
//!    machine-readable codes and their HTTP statuses.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `gym-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod contact;
pub mod error;
pub mod identity;
pub mod pagination;
pub mod temporal;

pub use contact::{Email, Phone};
pub use error::{CoreError, ErrorCategory, ErrorCode, FieldViolation, ValidationError};
pub use identity::{CheckInId, MemberId, MembershipId, PlanId};
pub use pagination::{PageMeta, PageRequest, SortOrder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use temporal::{parse_timestamp, CalendarDate};
