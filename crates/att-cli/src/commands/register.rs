//! Register command for adding or renaming registrants.

use std::io::Write;

use anyhow::{Result, bail};
use att_core::{BadgeId, Registrant};
use att_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &mut Database, badge: &str, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("registrant name must not be empty");
    }
    let registrant = Registrant {
        badge: BadgeId::new(badge)?,
        name: name.to_string(),
    };
    db.upsert_registrant(&registrant)?;
    writeln!(writer, "Registered {} ({})", registrant.badge, registrant.name)?;
    Ok(())
}
