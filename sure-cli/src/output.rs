//! Output sink: envelopes go to stdout as pretty JSON, or as a table when the
//! payload supports it. Failures also go to stderr and set a non-zero exit.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;
use sure_core::{CliError, Envelope, ProposeResult};

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

/// Payloads that may render as a table.
pub trait TableView {
    /// Whether this payload has a tabular rendering at all
    fn supports_table(&self) -> bool {
        false
    }

    fn render_table(&self) -> String {
        String::new()
    }
}

impl TableView for Value {}

impl TableView for ProposeResult {
    fn supports_table(&self) -> bool {
        true
    }

    fn render_table(&self) -> String {
        let summary = format!(
            "{} proposals from {} transactions ({} uncategorized)",
            self.proposals.len(),
            self.total_tx,
            self.uncategorized
        );
        if self.proposals.is_empty() {
            return format!("No rule proposals.\n{summary}");
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["pattern", "category", "confidence", "affected", "samples"]);

        for p in &self.proposals {
            table.add_row(vec![
                Cell::new(&p.pattern),
                Cell::new(&p.value),
                Cell::new(format!("{:.3}", p.confidence)).set_alignment(CellAlignment::Right),
                Cell::new(p.affected_count).set_alignment(CellAlignment::Right),
                Cell::new(p.sample_tx_ids.join(", ")),
            ]);
        }

        format!("{table}\n{summary}")
    }
}

/// True when `env` should be drawn as a table rather than JSON.
pub fn renders_as_table<T: TableView>(format: OutputFormat, env: &Envelope<T>) -> bool {
    format == OutputFormat::Table
        && !env.is_error()
        && env.data.as_ref().is_some_and(|d| d.supports_table())
}

pub fn render<T: Serialize + TableView>(format: OutputFormat, env: &Envelope<T>) -> Result<String> {
    if renders_as_table(format, env) {
        if let Some(data) = &env.data {
            return Ok(data.render_table());
        }
    }
    Ok(serde_json::to_string_pretty(env)?)
}

pub fn print<T: Serialize + TableView>(format: OutputFormat, env: &Envelope<T>) -> Result<()> {
    let out = render(format, env)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{out}")?;
    stdout.flush()?;
    Ok(())
}

/// Report a failure: error envelope on stdout, message on stderr, exit 1.
pub fn fail(err: &CliError) -> ExitCode {
    let env = Envelope::failure(err);
    if let Err(e) = print(OutputFormat::Json, &env) {
        eprintln!("failed to write error output: {e:#}");
    }
    eprintln!("{}", err.message());
    ExitCode::FAILURE
}
