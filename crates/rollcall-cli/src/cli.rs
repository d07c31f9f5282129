//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{adhoc, attendance, member, roster, scan, schedule, season, tag, template};

/// Attendance tracker for recurring team activities.
///
/// Expands recurrence templates into scheduled occurrences, drives the
/// per-participant check-in/check-out lifecycle, and resolves physical tag
/// scans to the right occurrence.
#[derive(Debug, Parser)]
#[command(name = "rollcall", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage recurrence templates.
    Template {
        #[command(subcommand)]
        action: template::TemplateAction,
    },

    /// Manage one-off scheduled occurrences.
    Schedule {
        #[command(subcommand)]
        action: schedule::ScheduleAction,
    },

    /// Check a participant in to an occurrence.
    Checkin(attendance::CheckinArgs),

    /// Check a participant out of an occurrence.
    Checkout(attendance::CheckoutArgs),

    /// Apply an administrative attendance mark or correction.
    Mark(attendance::MarkArgs),

    /// Process a physical tag scan.
    Scan(scan::ScanArgs),

    /// Manage impromptu (ad-hoc) attendance.
    Adhoc {
        #[command(subcommand)]
        action: adhoc::AdhocAction,
    },

    /// Manage seasons and team assignments.
    Season {
        #[command(subcommand)]
        action: season::SeasonAction,
    },

    /// Show the attendance roster for an occurrence.
    Roster(roster::RosterArgs),

    /// Manage organization and team memberships.
    Member {
        #[command(subcommand)]
        action: member::MemberAction,
    },

    /// Manage scan tags.
    Tag {
        #[command(subcommand)]
        action: tag::TagAction,
    },
}
