//! Telemetry formatting and tracing setup.
//!
//! [`TelemetryFormatter`] renders [`Event`]s and branch failures for sinks;
//! [`PlainFormatter`] is the stock implementation with optional ANSI color.
//! [`init`] installs a `tracing_subscriber` fmt layer driven by
//! `RUST_LOG`-style env filtering.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::event_bus::Event;
use crate::schedulers::BranchFailure;

pub const CONTEXT_COLOR: &str = "\x1b[32m"; // green
pub const LINE_COLOR: &str = "\x1b[35m"; // magenta / dark pink
pub const RESET_COLOR: &str = "\x1b[0m";

/// Install a global tracing subscriber with env-filter support.
///
/// Reads the `RUST_LOG` environment variable (default `info`). Safe to call
/// more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(FormatterMode::auto_detect().is_colored())
        .try_init();
}

/// Formatter color mode for telemetry output.
///
/// Controls whether ANSI color codes are included in formatted output:
/// - [`FormatterMode::Auto`]: Automatically detects TTY capability via `stderr.is_terminal()`
/// - [`FormatterMode::Colored`]: Always include color codes (for forced color output)
/// - [`FormatterMode::Plain`]: Never include color codes (for logs/files)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatterMode {
    /// Auto-detect TTY capability (checks `stderr.is_terminal()`)
    #[default]
    Auto,
    /// Always include ANSI color codes
    Colored,
    /// Never include ANSI color codes
    Plain,
}

impl FormatterMode {
    /// Auto-detect formatter mode based on stderr TTY capability.
    pub fn auto_detect() -> Self {
        if std::io::stderr().is_terminal() {
            FormatterMode::Colored
        } else {
            FormatterMode::Plain
        }
    }

    /// Returns true if this mode should use colored output.
    ///
    /// For `Auto` mode, performs TTY detection on each call.
    pub fn is_colored(&self) -> bool {
        match self {
            FormatterMode::Auto => std::io::stderr().is_terminal(),
            FormatterMode::Colored => true,
            FormatterMode::Plain => false,
        }
    }
}

/// Rendered output for a telemetry item that can be consumed by sinks.
#[derive(Clone, Debug, Default)]
pub struct EventRender {
    pub context: Option<String>,
    pub lines: Vec<String>,
}

impl EventRender {
    pub fn join_lines(&self) -> String {
        self.lines.join("")
    }
}

pub trait TelemetryFormatter: Send + Sync {
    fn render_event(&self, event: &Event) -> EventRender;
    fn render_failures(&self, failures: &[BranchFailure]) -> Vec<EventRender>;
}

/// Plain text formatter with optional ANSI color codes.
///
/// # Examples
/// ```
/// use stategraph::telemetry::{FormatterMode, PlainFormatter};
///
/// // Auto-detect TTY
/// let formatter = PlainFormatter::new();
///
/// // Force plain output (no colors)
/// let formatter = PlainFormatter::with_mode(FormatterMode::Plain);
/// ```
pub struct PlainFormatter {
    mode: FormatterMode,
}

impl PlainFormatter {
    /// Create a new formatter with auto-detected color mode.
    pub fn new() -> Self {
        Self {
            mode: FormatterMode::Auto,
        }
    }

    /// Create a new formatter with explicit color mode.
    pub fn with_mode(mode: FormatterMode) -> Self {
        Self { mode }
    }

    fn color<'a>(&self, ansi_code: &'a str) -> &'a str {
        if self.mode.is_colored() { ansi_code } else { "" }
    }

    fn reset(&self) -> &str {
        if self.mode.is_colored() {
            RESET_COLOR
        } else {
            ""
        }
    }
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryFormatter for PlainFormatter {
    fn render_event(&self, event: &Event) -> EventRender {
        let line = if self.mode.is_colored() {
            format!("{LINE_COLOR}{}{RESET_COLOR}\n", event)
        } else {
            format!("{}\n", event)
        };
        EventRender {
            context: event.scope_label().map(|s| s.to_string()),
            lines: vec![line],
        }
    }

    fn render_failures(&self, failures: &[BranchFailure]) -> Vec<EventRender> {
        failures
            .iter()
            .enumerate()
            .map(|(i, failure)| {
                let mut lines = Vec::new();
                let context = format!("{}#{}", failure.node, failure.branch);
                let header = format!(
                    "[{i}] {} | {}{}{} @ step {}\n",
                    failure.when,
                    self.color(CONTEXT_COLOR),
                    context,
                    self.reset(),
                    failure.step,
                );
                lines.push(header);
                lines.push(format!(
                    "{}  error: {}{}\n",
                    self.color(LINE_COLOR),
                    failure.error,
                    self.reset()
                ));
                EventRender {
                    context: Some(context),
                    lines,
                }
            })
            .collect()
    }
}
