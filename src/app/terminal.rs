//! Decides how the prompt renders: log colors and the busy spinner.

use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// Facts about the attached terminal, read once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TerminalProbe {
    pub(crate) stderr_is_terminal: bool,
    pub(crate) dumb_terminal: bool,
    pub(crate) no_color_env: bool,
}

impl TerminalProbe {
    pub(crate) fn from_env() -> Self {
        Self {
            stderr_is_terminal: io::stderr().is_terminal(),
            dumb_terminal: std::env::var("TERM").is_ok_and(|term| term.eq_ignore_ascii_case("dumb")),
            no_color_env: std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty()),
        }
    }
}

/// Output style for one run of the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Presentation {
    /// ANSI colors in log lines.
    pub(crate) color: bool,
    /// Spinner on stderr while an operation is in flight.
    pub(crate) spinner: bool,
}

impl Presentation {
    /// Combines the CLI flags with what the terminal supports.
    ///
    /// Piped stderr, `--quiet` and `TERM=dumb` all suppress the spinner so
    /// scripted runs get plain line output.
    pub(crate) fn for_cli(cli: &Cli, probe: TerminalProbe) -> Self {
        Self {
            color: !(cli.no_color || probe.no_color_env || probe.dumb_terminal),
            spinner: probe.stderr_is_terminal && !cli.quiet && !probe.dumb_terminal,
        }
    }

    /// Installs the stderr log subscriber; `RUST_LOG` overrides `default_level`.
    pub(crate) fn init_tracing(self, default_level: &str) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let _ = tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_ansi(self.color)
            .with_env_filter(filter)
            .try_init();
    }
}
