//! Operator-facing progress output.

use crossterm::style::Stylize;
use serde::Serialize;
use std::io::{IsTerminal, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Plain,
    Success,
    Error,
    Warning,
    Info,
    Accent,
    Heading,
}

/// Render `text` in `tone`, or plain when color is off.
pub fn paint(text: &str, tone: Tone, color: bool) -> String {
    if !color {
        return text.to_string();
    }

    match tone {
        Tone::Plain => text.to_string(),
        Tone::Success => format!("{}", text.green()),
        Tone::Error => format!("{}", text.red()),
        Tone::Warning => format!("{}", text.yellow()),
        Tone::Info => format!("{}", text.cyan()),
        Tone::Accent => format!("{}", text.magenta()),
        Tone::Heading => format!("{}", text.blue()),
    }
}

/// Color is on for a terminal unless `NO_COLOR` is set.
pub fn color_enabled(is_terminal: bool) -> bool {
    is_terminal && std::env::var_os("NO_COLOR").is_none()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub tone: Tone,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Stdout,
    Stderr,
    Silent,
}

/// Echoes progress lines to the terminal.
///
/// A captured reporter prints nothing and keeps every line in memory instead.
#[derive(Debug)]
pub struct Reporter {
    sink: Sink,
    color: bool,
    lines: Vec<ReportLine>,
}

impl Reporter {
    pub fn stdout() -> Self {
        Self {
            sink: Sink::Stdout,
            color: color_enabled(std::io::stdout().is_terminal()),
            lines: Vec::new(),
        }
    }

    /// For `--json`, where stdout carries the response envelope.
    pub fn stderr() -> Self {
        Self {
            sink: Sink::Stderr,
            color: color_enabled(std::io::stderr().is_terminal()),
            lines: Vec::new(),
        }
    }

    pub fn captured() -> Self {
        Self {
            sink: Sink::Silent,
            color: false,
            lines: Vec::new(),
        }
    }

    fn emit(&self, rendered: &str) {
        match self.sink {
            Sink::Stdout => {
                let _ = writeln!(std::io::stdout(), "{}", rendered);
            }
            Sink::Stderr => {
                let _ = writeln!(std::io::stderr(), "{}", rendered);
            }
            Sink::Silent => {}
        }
    }

    fn keep(&mut self, line: ReportLine) {
        if self.sink == Sink::Silent {
            self.lines.push(line);
        }
    }

    pub fn line(&mut self, tone: Tone, text: impl Into<String>) {
        let text = text.into();
        let rendered = paint(&text, tone, self.color);
        self.emit(&rendered);
        self.keep(ReportLine { tone, text });
    }

    pub fn plain(&mut self, text: impl Into<String>) {
        self.line(Tone::Plain, text);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.line(Tone::Success, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.line(Tone::Error, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.line(Tone::Warning, text);
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.line(Tone::Info, text);
    }

    pub fn accent(&mut self, text: impl Into<String>) {
        self.line(Tone::Accent, text);
    }

    pub fn heading(&mut self, text: impl Into<String>) {
        self.line(Tone::Heading, text);
    }

    pub fn blank(&mut self) {
        self.line(Tone::Plain, "");
    }

    /// Several differently colored fragments on one line.
    pub fn segments(&mut self, parts: &[(Tone, &str)]) {
        let text = parts.iter().map(|(_, t)| *t).collect::<Vec<_>>().join(" ");
        let rendered = parts
            .iter()
            .map(|(tone, t)| paint(t, *tone, self.color))
            .collect::<Vec<_>>()
            .join(" ");
        self.emit(&rendered);
        self.keep(ReportLine {
            tone: Tone::Plain,
            text,
        });
    }

    /// Lines seen by a captured reporter; empty for terminal sinks.
    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.text.contains(needle))
    }
}
