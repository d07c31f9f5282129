//! Core domain logic for the attendance tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Recurrence expansion: turning a rule into concrete occurrence dates
//! - Season windows: resolving org-defined date ranges for analytics
//! - Check-in state machine: the per-(participant, occurrence) ledger
//! - Scan resolution: mapping a tag scan to the right occurrence and action

pub mod checkin;
pub mod occurrence;
pub mod recurrence;
pub mod scan;
pub mod season;
pub mod timeofday;
pub mod types;

pub use checkin::{AttendanceRecord, CheckinError, TimestampPatch, apply_mark, check_in, check_out};
pub use occurrence::{Occurrence, Template};
pub use recurrence::{ExpanderConfig, Frequency, RecurrenceError, RecurrenceRule};
pub use scan::{ScanConfig, ScanError, ScanOutcome, resolve_scan};
pub use season::{SeasonAssignment, SeasonError, SeasonWindow, is_currently_active};
pub use timeofday::{TimeOfDay, TimeOfDayError};
pub use types::{
    AttendanceStatus, OccurrenceId, OrganizationId, ParticipantId, ScanAction, TagId, TeamId,
    TemplateId, ValidationError,
};
