//! Reset command: clear history and start a new session.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::session::Session;
use crate::{Config, FocusArgs};

/// Replaces the stored record with a new one seeded from `focus`.
///
/// Works even when the stored state no longer decodes; the old file is kept
/// as the backup.
pub fn run<W: Write>(writer: &mut W, config: &Config, focus: &FocusArgs, at: DateTime<Utc>) -> Result<()> {
    let session = Session::start(config, focus.observation(), false, at)?;
    session.close(at)?;

    writeln!(writer, "History cleared.")?;
    Ok(())
}
