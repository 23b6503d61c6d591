use std::sync::LazyLock;

use regex::Regex;

use crate::error::MssqlMiddlewareError;
use crate::select::LimitSpec;

static LIMIT_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([0-9]+)\s+offset\s+([0-9]+)$").expect("static regex compiles")
});

/// Limit and offset after parsing, offset defaulting to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Paging {
    pub limit: Option<u64>,
    pub offset: u64,
}

impl Paging {
    /// Windowing is only needed for a real page past the first row.
    ///
    /// An offset of zero counts as absent: the first page goes through `TOP`.
    #[must_use]
    pub fn is_windowed(&self) -> bool {
        self.limit.is_some() && self.offset > 0
    }
}

/// Parse any accepted limit shape.
///
/// # Errors
///
/// Returns `MssqlMiddlewareError::InvalidLimit` when a textual limit or offset is not a
/// non-negative integer.
pub fn parse_limit(spec: Option<&LimitSpec>) -> Result<Paging, MssqlMiddlewareError> {
    match spec {
        None => Ok(Paging::default()),
        Some(LimitSpec::Structured { limit, offset }) => Ok(Paging {
            limit: *limit,
            offset: *offset,
        }),
        Some(LimitSpec::Text(text)) => parse_text(text),
    }
}

fn parse_text(text: &str) -> Result<Paging, MssqlMiddlewareError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Paging::default());
    }

    if let Some(caps) = LIMIT_OFFSET.captures(trimmed) {
        return Ok(Paging {
            limit: Some(parse_number(&caps[1], text)?),
            offset: parse_number(&caps[2], text)?,
        });
    }

    let bits: Vec<&str> = trimmed.split(',').collect();
    match bits.as_slice() {
        [limit] => Ok(Paging {
            limit: Some(parse_number(limit, text)?),
            offset: 0,
        }),
        [offset, limit] => Ok(Paging {
            limit: Some(parse_number(limit, text)?),
            offset: parse_number(offset, text)?,
        }),
        _ => Err(MssqlMiddlewareError::InvalidLimit(format!(
            "expected \"offset,limit\", got {text:?}"
        ))),
    }
}

fn parse_number(raw: &str, whole: &str) -> Result<u64, MssqlMiddlewareError> {
    raw.trim().parse::<u64>().map_err(|e| {
        MssqlMiddlewareError::InvalidLimit(format!("{raw:?} in {whole:?} is not a count: {e}"))
    })
}
