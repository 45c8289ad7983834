//! Rules commands: validate the rule document and reclassify history.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use arya_core::{Observation, RuleSet};
use chrono::{DateTime, Utc};

use crate::Config;
use crate::session::{Session, read_rules};

fn required_rules(path: &Path) -> Result<Vec<u8>> {
    read_rules(path)?.with_context(|| format!("no rule document at {}", path.display()))
}

/// Compiles the rule document at `path` and prints its evaluation order.
pub fn check<W: Write>(writer: &mut W, path: &Path) -> Result<()> {
    let bytes = required_rules(path)?;
    let rules = RuleSet::from_slice(&bytes).with_context(|| format!("invalid rule document {}", path.display()))?;

    writeln!(writer, "Rules: {}", path.display())?;
    writeln!(writer, "Projects (in evaluation order):")?;
    for (index, name) in rules.project_order().enumerate() {
        writeln!(writer, "  {}. {name}", index + 1)?;
    }
    writeln!(writer, "Ignore patterns: {}", rules.ignore_count())?;
    Ok(())
}

/// Reloads the configured rules and reclassifies the recorded window history.
pub fn recompute<W: Write>(writer: &mut W, config: &Config, now: DateTime<Utc>) -> Result<()> {
    if !config.state_path.exists() {
        anyhow::bail!("no activity recorded at {}", config.state_path.display());
    }
    let bytes = required_rules(&config.rules_path)?;

    let mut session = Session::open(config, Observation::default(), false, now)?;
    if !session.recorder.reload_rules(&bytes, true, now)? {
        anyhow::bail!(
            "rule document {} was rejected; project history left unchanged",
            config.rules_path.display()
        );
    }
    let projects = session.recorder.stats(now).projects.len();
    session.close(now)?;

    writeln!(writer, "Project history recomputed ({projects} projects).")?;
    Ok(())
}
