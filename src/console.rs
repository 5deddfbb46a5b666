//! Console status output for pipeline runs.
//!
//! Small leveled helpers so the audit loops and commands print uniformly.
//! Status lines go to stderr; result tables and exports own stdout.

/// Log level for console display.
#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn prefix(self) -> &'static str {
        match self {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        }
    }
}

fn emit(level: LogLevel, message: &str) {
    eprintln!("{} {}", level.prefix(), message);
}

pub fn info(msg: impl AsRef<str>) {
    emit(LogLevel::Info, msg.as_ref());
}

pub fn success(msg: impl AsRef<str>) {
    emit(LogLevel::Success, msg.as_ref());
}

pub fn warning(msg: impl AsRef<str>) {
    emit(LogLevel::Warning, msg.as_ref());
}

pub fn error(msg: impl AsRef<str>) {
    emit(LogLevel::Error, msg.as_ref());
}
