//! `Range` request header resolution

use crate::GatewayError;
use axum::http::HeaderValue;
use ufs_store::ByteRange;

fn parse_position(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Resolve a `Range` header against the declared file size.
///
/// Only the single-range form `bytes=<start>-[<end>]` is accepted; a missing
/// end means "to the last byte" and an end past the declared size is clamped
/// to it. Anything else yields 416.
pub fn resolve_range(
    header: Option<&HeaderValue>,
    size: u64,
) -> Result<Option<ByteRange>, GatewayError> {
    let Some(header) = header else {
        return Ok(None);
    };

    let unsatisfiable = |reason: &str| {
        GatewayError::RangeNotSatisfiable(format!(
            "{} ({:?}, size {})",
            reason, header, size
        ))
    };

    let spec = header
        .to_str()
        .map_err(|_| unsatisfiable("non-ascii range"))?
        .trim();
    if spec.is_empty() {
        return Err(unsatisfiable("empty range"));
    }

    let (start, end) = spec
        .strip_prefix("bytes=")
        .and_then(|positions| positions.split_once('-'))
        .ok_or_else(|| unsatisfiable("malformed range"))?;

    let start = parse_position(start).ok_or_else(|| unsatisfiable("malformed range start"))?;
    let end = if end.trim().is_empty() {
        None
    } else {
        Some(parse_position(end).ok_or_else(|| unsatisfiable("malformed range end"))?)
    };

    if start >= size {
        return Err(unsatisfiable("range starts past the end"));
    }
    let last = size - 1;
    let end = end.map_or(last, |end| end.min(last));
    if start > end {
        return Err(unsatisfiable("range start after end"));
    }

    Ok(Some(ByteRange::new(start, end, size)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn resolve(value: &str, size: u64) -> Result<Option<ByteRange>, GatewayError> {
        resolve_range(Some(&HeaderValue::from_str(value).unwrap()), size)
    }

    #[test]
    fn test_no_header() {
        assert_eq!(resolve_range(None, 100).unwrap(), None);
    }

    #[rstest]
    #[case("bytes=10-19", 10, 19)]
    #[case("bytes=0-0", 0, 0)]
    #[case("bytes=0-99", 0, 99)]
    #[case("bytes=99-99", 99, 99)]
    fn test_explicit_range(#[case] value: &str, #[case] start: u64, #[case] end: u64) {
        let range = resolve(value, 100).unwrap().unwrap();
        assert_eq!((range.start, range.end, range.total), (start, end, 100));
        assert_eq!(range.len(), end - start + 1);
    }

    #[test]
    fn test_every_valid_range_has_exact_length() {
        let size = 17;
        for start in 0..size {
            for end in start..size {
                let range = resolve(&format!("bytes={}-{}", start, end), size)
                    .unwrap()
                    .unwrap();
                assert_eq!(range.len(), end - start + 1);
                assert_eq!(range.content_range(), format!("bytes {}-{}/{}", start, end, size));
            }
        }
    }

    #[test]
    fn test_open_ended_range() {
        let range = resolve("bytes=40-", 100).unwrap().unwrap();
        assert_eq!((range.start, range.end), (40, 99));
        assert_eq!(range.len(), 60);
    }

    #[test]
    fn test_end_clamped_to_size() {
        let range = resolve("bytes=90-500", 100).unwrap().unwrap();
        assert_eq!((range.start, range.end), (90, 99));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("bytes=")]
    #[case("bytes=-")]
    #[case("bytes=-500")]
    #[case("bytes=abc-10")]
    #[case("bytes=5-x")]
    #[case("bytes=0-1,4-5")]
    #[case("items=0-10")]
    #[case("0-10")]
    #[case("bytes=20-10")]
    #[case("bytes=100-")]
    #[case("bytes=18446744073709551616-")]
    fn test_unsatisfiable(#[case] value: &str) {
        let err = resolve(value, 100).unwrap_err();
        assert!(matches!(err, GatewayError::RangeNotSatisfiable(_)), "{value}: {err}");
    }

    #[test]
    fn test_empty_file_has_no_satisfiable_range() {
        assert!(resolve("bytes=0-", 0).is_err());
    }
}
