//! Colored terminal reporting for indexing runs

use crate::index::range::RangePatch;
use crate::index::IndexOutcome;
use crate::utils::LogRecord;
use log::Level;
use std::io::{self, Write};
use std::path::Path;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn color_choice(color: bool) -> ColorChoice {
    if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        _ => Color::Cyan,
    }
}

/// Print per-call log records to stderr.
///
/// Errors and warnings are always shown; info records only when `verbose`.
pub fn print_records(records: &[LogRecord], verbose: bool, color: bool) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(color_choice(color));

    for record in records {
        if record.level > Level::Warn && !verbose {
            continue;
        }
        stderr.set_color(ColorSpec::new().set_fg(Some(level_color(record.level))).set_bold(true))?;
        write!(stderr, "{:5}", record.level)?;
        stderr.reset()?;
        writeln!(stderr, " {}", record.message)?;
    }

    Ok(())
}

/// Print one line per indexed source: `<status> <source> -> <artifact>`
pub fn print_outcome(source: &Path, outcome: &IndexOutcome, color: bool) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(color));

    let (label, fg) = match outcome {
        IndexOutcome::Reused(_) => ("reused ", Color::Green),
        IndexOutcome::Created(_) => ("created", Color::Green),
        IndexOutcome::Failed => ("failed ", Color::Red),
    };

    stdout.set_color(ColorSpec::new().set_fg(Some(fg)).set_bold(true))?;
    write!(stdout, "{}", label)?;
    stdout.reset()?;

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
    write!(stdout, " {}", source.display())?;
    stdout.reset()?;

    match outcome.path() {
        Some(path) => writeln!(stdout, " -> {}", path.display())?,
        None => writeln!(stdout)?,
    }

    Ok(())
}

/// Print a source that was rejected before indexing started
pub fn print_rejected(source: &Path, reason: &str, color: bool) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(color));

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(stdout, "error  ")?;
    stdout.reset()?;
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
    write!(stdout, " {}", source.display())?;
    stdout.reset()?;
    writeln!(stdout, ": {}", reason)?;

    Ok(())
}

/// Describe the result of a range correction
pub fn describe_patch(patch: RangePatch) -> &'static str {
    match patch {
        RangePatch::Unchanged => "range flag already correct",
        RangePatch::Patched => "range flag updated",
        RangePatch::Skipped => "range flag not patched, see log",
    }
}
