//! CLI command implementations.

pub mod adhoc;
pub mod attendance;
pub mod member;
pub mod roster;
pub mod scan;
pub mod schedule;
pub mod season;
pub mod tag;
pub mod template;
mod util;
