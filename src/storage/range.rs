use crate::error::StorageError;

/// An inclusive byte span within a file of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset served
    pub start: u64,
    /// Last byte offset served (inclusive)
    pub end: u64,
}

impl ByteRange {
    /// Parse a `Range` header value of the form `bytes=<start>-[<end>]`.
    ///
    /// A missing `end` defaults to the last byte; an `end` past the last byte
    /// is clamped to it. Suffix ranges (`bytes=-N`), multiple ranges, and
    /// ranges starting at or beyond `size` are not satisfiable.
    pub fn parse(header: &str, size: u64) -> Result<Self, StorageError> {
        let unsatisfiable = || StorageError::RangeNotSatisfiable { size };

        let spec = header
            .trim()
            .strip_prefix("bytes=")
            .ok_or_else(unsatisfiable)?;
        let (start, end) = spec.split_once('-').ok_or_else(unsatisfiable)?;

        let start: u64 = start.trim().parse().map_err(|_| unsatisfiable())?;
        if start >= size {
            return Err(unsatisfiable());
        }

        let last = size - 1;
        let end = match end.trim() {
            "" => last,
            value => value.parse::<u64>().map_err(|_| unsatisfiable())?.min(last),
        };

        if end < start {
            return Err(unsatisfiable());
        }

        Ok(Self { start, end })
    }

    /// Number of bytes in the span.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always `false`; a parsed range spans at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `Content-Range` header value for this span.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}
