use std::sync::LazyLock;

use regex::Regex;

static WRITE_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(insert|update|delete|merge|replace|create|alter|drop|truncate)\b")
        .expect("static regex compiles")
});

/// Consulted before every statement; `true` means "show it, don't run it".
pub trait WritePreview {
    fn preview_only(&self, sql: &str) -> bool;
}

/// Runs everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreview;

impl WritePreview for NoPreview {
    fn preview_only(&self, _sql: &str) -> bool {
        false
    }
}

impl<F> WritePreview for F
where
    F: Fn(&str) -> bool,
{
    fn preview_only(&self, sql: &str) -> bool {
        self(sql)
    }
}

/// Reports data-modifying statements through `tracing` instead of running them.
/// Reads still execute.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewWrites;

impl WritePreview for PreviewWrites {
    fn preview_only(&self, sql: &str) -> bool {
        if is_write_statement(sql) {
            tracing::info!(sql = %sql, "previewing write, not executed");
            true
        } else {
            false
        }
    }
}

#[must_use]
pub fn is_write_statement(sql: &str) -> bool {
    WRITE_STATEMENT.is_match(sql)
}
