//! ui::output
//!
//! What commands print for the user.
//!
//! stdout carries progress and results, stderr carries warnings and errors.
//! Diagnostics do not belong here; they go through `tracing`.

use std::fmt::Display;

/// How much a command prints, from `--quiet` and `--debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Debug,
}

impl Verbosity {
    /// `--quiet` wins when both flags are given.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        match (quiet, debug) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Debug,
            (false, false) => Verbosity::Normal,
        }
    }

    fn is_quiet(self) -> bool {
        self == Verbosity::Quiet
    }
}

/// Progress and detail lines; suppressed by `--quiet`.
pub fn print(message: impl Display, verbosity: Verbosity) {
    if !verbosity.is_quiet() {
        println!("{message}");
    }
}

/// A line scripts parse (snapshot version, listings); never suppressed.
pub fn result(message: impl Display) {
    println!("{message}");
}

pub fn error(message: impl Display) {
    eprintln!("error: {message}");
}

/// To stderr; suppressed by `--quiet`.
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if !verbosity.is_quiet() {
        eprintln!("warning: {message}");
    }
}

/// Confirmation that a command did what was asked; suppressed by `--quiet`.
pub fn success(message: impl Display, verbosity: Verbosity) {
    print(message, verbosity);
}

/// One item per line, each behind `prefix`.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    let lines: Vec<String> = items.iter().map(|item| format!("{prefix}{item}")).collect();
    lines.join("\n")
}
