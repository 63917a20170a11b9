//! `Range` header handling for the media endpoint, so the player can scrub
//! without downloading whole recordings.

use crate::error::ReelError;

/// An inclusive byte range resolved against a known body length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Parses a single-range `bytes=` header: `a-b`, `a-` or `-suffix`.
    /// An end past the body is clamped. Multi-range requests are rejected.
    pub fn parse(header: &str, total_len: u64) -> Result<Self, ReelError> {
        let malformed = || ReelError::MalformedRange(header.to_string());

        let range = header.trim().strip_prefix("bytes=").ok_or_else(malformed)?;
        if range.contains(',') {
            return Err(malformed());
        }
        let (first, last) = range.trim().split_once('-').ok_or_else(malformed)?;
        let parse = |value: &str| value.trim().parse::<u64>().map_err(|_| malformed());

        let range = match (first.trim().is_empty(), last.trim().is_empty()) {
            (true, true) => return Err(malformed()),
            (true, false) => {
                let suffix = parse(last)?;
                if suffix == 0 || total_len == 0 {
                    return Err(ReelError::RangeNotSatisfiable { total_len });
                }
                Self {
                    start: total_len.saturating_sub(suffix),
                    end: total_len - 1,
                }
            }
            (false, open_ended) => {
                let start = parse(first)?;
                if start >= total_len {
                    return Err(ReelError::RangeNotSatisfiable { total_len });
                }
                let end = if open_ended {
                    total_len - 1
                } else {
                    parse(last)?.min(total_len - 1)
                };
                if end < start {
                    return Err(malformed());
                }
                Self { start, end }
            }
        };
        Ok(range)
    }

    /// Number of bytes covered; value for `Content-Length`.
    pub fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the response's `Content-Range` header.
    pub fn content_range(&self, total_len: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closed_open_and_suffix_ranges() {
        assert_eq!(
            ByteRange::parse("bytes=0-99", 1000).unwrap(),
            ByteRange { start: 0, end: 99 }
        );
        assert_eq!(
            ByteRange::parse("bytes=500-", 1000).unwrap(),
            ByteRange { start: 500, end: 999 }
        );
        assert_eq!(
            ByteRange::parse("bytes=-200", 1000).unwrap(),
            ByteRange { start: 800, end: 999 }
        );
    }

    #[test]
    fn clamps_end_to_body() {
        let range = ByteRange::parse("bytes=900-5000", 1000).unwrap();
        assert_eq!(range.end, 999);
        assert_eq!(range.byte_count(), 100);
        assert_eq!(range.content_range(1000), "bytes 900-999/1000");
    }

    #[test]
    fn oversized_suffix_covers_whole_body() {
        assert_eq!(
            ByteRange::parse("bytes=-5000", 1000).unwrap(),
            ByteRange { start: 0, end: 999 }
        );
    }

    #[test]
    fn rejects_bad_headers() {
        for header in ["items=0-1", "bytes=", "bytes=-", "bytes=5-2", "bytes=0-1,4-5", "bytes=a-b"] {
            assert!(
                matches!(ByteRange::parse(header, 1000), Err(ReelError::MalformedRange(_))),
                "{header} should be malformed"
            );
        }
    }

    #[test]
    fn rejects_ranges_past_the_end() {
        assert!(matches!(
            ByteRange::parse("bytes=1000-", 1000),
            Err(ReelError::RangeNotSatisfiable { total_len: 1000 })
        ));
        assert!(matches!(
            ByteRange::parse("bytes=-0", 1000),
            Err(ReelError::RangeNotSatisfiable { .. })
        ));
    }
}
