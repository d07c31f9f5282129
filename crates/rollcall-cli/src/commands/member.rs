//! Membership commands: organization and team membership, guardianship.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};

use rollcall_core::types::{OrganizationId, ParticipantId, TeamId};

use super::util;
use crate::Config;

#[derive(Debug, Subcommand)]
pub enum MemberAction {
    /// Add a participant to an organization.
    Add(AddArgs),
    /// Add a participant to a team.
    AddTeam(AddTeamArgs),
    /// Record a guardian relation within an organization.
    Guardian(GuardianArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Participant to add.
    pub participant: String,
    /// Organization to join.
    pub org: String,
}

#[derive(Debug, Args)]
pub struct AddTeamArgs {
    /// Participant to add.
    pub participant: String,
    /// Team to join.
    pub team: String,
    /// Organization the team belongs to.
    pub org: String,
}

#[derive(Debug, Args)]
pub struct GuardianArgs {
    /// Guardian participant.
    pub guardian: String,
    /// Ward participant.
    pub ward: String,
    /// Organization scope of the relation.
    pub org: String,
}

pub fn add<W: Write>(writer: &mut W, args: &AddArgs, config: &Config) -> Result<()> {
    let participant = ParticipantId::new(&args.participant)?;
    let organization = OrganizationId::new(&args.org)?;

    let db = util::open_database(config)?;
    db.add_org_member(&participant, &organization)?;

    writeln!(writer, "Added {participant} to {organization}")?;
    Ok(())
}

pub fn add_team<W: Write>(writer: &mut W, args: &AddTeamArgs, config: &Config) -> Result<()> {
    let participant = ParticipantId::new(&args.participant)?;
    let team = TeamId::new(&args.team)?;
    let organization = OrganizationId::new(&args.org)?;

    let db = util::open_database(config)?;
    db.require_org_member(&participant, &organization)?;
    db.add_team_member(&participant, &team, &organization)?;

    writeln!(writer, "Added {participant} to {team}")?;
    Ok(())
}

pub fn guardian<W: Write>(writer: &mut W, args: &GuardianArgs, config: &Config) -> Result<()> {
    let guardian = ParticipantId::new(&args.guardian)?;
    let ward = ParticipantId::new(&args.ward)?;
    let organization = OrganizationId::new(&args.org)?;

    let db = util::open_database(config)?;
    db.add_guardian(&guardian, &ward, &organization)?;

    writeln!(writer, "Recorded {guardian} as guardian of {ward}")?;
    Ok(())
}
