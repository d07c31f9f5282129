//! Tag commands: register scan tags and toggle their active flag.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};

use rollcall_core::types::{OrganizationId, TagId};
use rollcall_db::TagRecord;

use super::util;
use crate::Config;

#[derive(Debug, Subcommand)]
pub enum TagAction {
    /// Register a tag with an organization.
    Register(RegisterArgs),
    /// Reactivate a tag.
    Activate(ToggleArgs),
    /// Deactivate a tag (e.g. reported lost).
    Deactivate(ToggleArgs),
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Tag ID as printed on the physical tag.
    pub tag: String,
    /// Organization the tag belongs to.
    pub org: String,
}

#[derive(Debug, Args)]
pub struct ToggleArgs {
    /// Tag ID.
    pub tag: String,
}

pub fn register<W: Write>(writer: &mut W, args: &RegisterArgs, config: &Config) -> Result<()> {
    let tag = TagRecord {
        id: TagId::new(&args.tag)?,
        organization_id: OrganizationId::new(&args.org)?,
        active: true,
    };

    let db = util::open_database(config)?;
    db.insert_tag(&tag)?;

    writeln!(writer, "Registered tag {} with {}", tag.id, tag.organization_id)?;
    Ok(())
}

pub fn set_active<W: Write>(
    writer: &mut W,
    args: &ToggleArgs,
    active: bool,
    config: &Config,
) -> Result<()> {
    let id = TagId::new(&args.tag)?;

    let db = util::open_database(config)?;
    db.set_tag_active(&id, active)?;

    let state = if active { "active" } else { "inactive" };
    writeln!(writer, "Tag {id} is now {state}")?;
    Ok(())
}
