use std::fmt::Display;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

static JSON_MODE: AtomicBool = AtomicBool::new(false);

pub fn init(json: bool) {
    JSON_MODE.store(json, Ordering::Relaxed);
}

pub fn is_json() -> bool {
    JSON_MODE.load(Ordering::Relaxed)
}

/// Print a command result: pretty JSON in `--json` mode, text otherwise.
pub fn print<T: Serialize + Display>(value: &T) -> anyhow::Result<()> {
    if is_json() {
        let s = serde_json::to_string_pretty(value)?;
        println!("{s}");
        return Ok(());
    }
    print!("{value}");
    io::stdout().flush()?;
    Ok(())
}

/// Colored status line on stderr.
pub fn status(label: &str, msg: &str) {
    if is_json() {
        return;
    }
    let mut err = stderr();
    let _ = err.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    let _ = write!(err, "{label:>10}");
    let _ = err.reset();
    let _ = writeln!(err, " {msg}");
}

pub fn error(msg: &str) {
    let mut err = stderr();
    let _ = err.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(err, "error");
    let _ = err.reset();
    let _ = writeln!(err, ": {msg}");
}

fn stderr() -> StandardStream {
    StandardStream::stderr(ColorChoice::Auto)
}
