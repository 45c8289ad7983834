//! Stats command for showing accumulated usage.

use std::io::Write;

use anyhow::{Context, Result};
use arya_core::{Observation, Summary, UsageLine};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Config;
use crate::session::Session;

#[derive(Serialize)]
struct StatsReport<'a> {
    created: DateTime<Utc>,
    #[serde(flatten)]
    summary: &'a Summary,
}

pub fn run<W: Write>(writer: &mut W, config: &Config, json: bool, at: DateTime<Utc>) -> Result<()> {
    if !config.state_path.exists() {
        writeln!(writer, "No activity recorded.")?;
        return Ok(());
    }

    // Read-only: the session is dropped without saving.
    let session = Session::open(config, Observation::default(), false, at)?;
    let created = session.recorder.record().created();
    let summary = session.recorder.summary(at);

    if json {
        let report = StatsReport {
            created,
            summary: &summary,
        };
        serde_json::to_writer_pretty(&mut *writer, &report).context("failed to serialize stats")?;
        writeln!(writer)?;
        return Ok(());
    }

    render(writer, created, &summary)
}

fn render<W: Write>(writer: &mut W, created: DateTime<Utc>, summary: &Summary) -> Result<()> {
    writeln!(writer, "Activity since {}", created.format("%Y-%m-%d %H:%M UTC"))?;
    if summary.paused {
        writeln!(writer, "Recording is paused.")?;
    }

    let sections: [(&str, &[UsageLine]); 3] = [
        ("Applications", summary.apps.as_slice()),
        ("Workspaces", summary.workspaces.as_slice()),
        ("Projects", summary.projects.as_slice()),
    ];
    for (title, lines) in sections {
        if lines.is_empty() {
            continue;
        }
        writeln!(writer)?;
        writeln!(writer, "{title}")?;
        for line in lines {
            writeln!(writer, "  {:<30} {}", line.name, line.label)?;
        }
    }

    writeln!(writer)?;
    writeln!(writer, "{:<32} {}", "Total", summary.total_label)?;
    Ok(())
}
