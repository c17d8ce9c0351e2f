//! HTTP Range request module
//!
//! Single `bytes` ranges for static assets (RFC 7233), validated against `If-Range`.

/// Inclusive byte range resolved against a known length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn length(self) -> usize {
        self.end - self.start + 1
    }
}

/// Range header evaluation outcome
#[derive(Debug, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable Range header, serve the whole representation
    Full,
    /// Serve the given slice with 206
    Partial(ByteRange),
    /// Range cannot be satisfied, answer 416
    NotSatisfiable,
}

/// Evaluate a Range header against a representation of `len` bytes
///
/// Supported forms are `bytes=start-end`, `bytes=start-` and `bytes=-suffix`.
/// Multi-range requests, other units and malformed values fall back to `Full`.
/// When `if_range` is present and differs from `etag`, the range is ignored.
pub fn parse_range_header(
    range: Option<&str>,
    if_range: Option<&str>,
    etag: &str,
    len: usize,
) -> RangeOutcome {
    let Some(spec) = range.and_then(|r| r.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };

    if if_range.is_some_and(|v| v.trim() != etag) {
        return RangeOutcome::Full;
    }

    if spec.contains(',') {
        return RangeOutcome::Full;
    }

    let Some((first, last)) = spec.split_once('-') else {
        return RangeOutcome::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        return suffix_range(last, len);
    }

    let Ok(start) = first.parse::<usize>() else {
        return RangeOutcome::Full;
    };
    if start >= len {
        return RangeOutcome::NotSatisfiable;
    }

    let end = if last.is_empty() {
        len - 1
    } else {
        match last.parse::<usize>() {
            Ok(end) if end < start => return RangeOutcome::NotSatisfiable,
            Ok(end) => end.min(len - 1),
            Err(_) => return RangeOutcome::Full,
        }
    };

    RangeOutcome::Partial(ByteRange { start, end })
}

/// `bytes=-N`: the last N bytes
fn suffix_range(last: &str, len: usize) -> RangeOutcome {
    match last.parse::<usize>() {
        Ok(0) => RangeOutcome::NotSatisfiable,
        Ok(_) if len == 0 => RangeOutcome::NotSatisfiable,
        Ok(n) => RangeOutcome::Partial(ByteRange {
            start: len.saturating_sub(n),
            end: len - 1,
        }),
        Err(_) => RangeOutcome::Full,
    }
}
