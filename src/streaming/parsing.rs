//! Zero-allocation parsing utilities for tab-separated coordinate files.

use memchr::memchr;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty or contains non-digit characters.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.wrapping_mul(10).wrapping_add(d as u64);
    }
    Some(n)
}

/// Slice out the start/end coordinate fields (columns 2 and 3) of a BED
/// line using memchr. Returns None when fewer than three columns exist.
///
/// Column 1 (the chromosome) is skipped outright: mask files are supplied
/// per-chromosome and the engine never inspects the name.
#[inline(always)]
pub fn split_bed_fields(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let tab1 = memchr(b'\t', line)?;

    let rest1 = &line[tab1 + 1..];
    let tab2 = memchr(b'\t', rest1)?;
    let start = &rest1[..tab2];

    let rest2 = &rest1[tab2 + 1..];
    let end_len = memchr(b'\t', rest2).unwrap_or(rest2.len());
    let end_len = memchr(b'\n', &rest2[..end_len]).unwrap_or(end_len);
    let end = &rest2[..end_len];

    Some((start, end))
}

/// Check if a line should be skipped (empty, comment, or header).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#' || line.starts_with(b"track") || line.starts_with(b"browser")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_fast() {
        assert_eq!(parse_u64_fast(b"12345"), Some(12345));
        assert_eq!(parse_u64_fast(b"0"), Some(0));
        assert_eq!(parse_u64_fast(b""), None);
        assert_eq!(parse_u64_fast(b"abc"), None);
        assert_eq!(parse_u64_fast(b"123abc"), None);
        assert_eq!(parse_u64_fast(b"18446744073709551615"), Some(u64::MAX));
    }

    #[test]
    fn test_split_bed_fields() {
        assert_eq!(
            split_bed_fields(b"chr1\t100\t200"),
            Some((&b"100"[..], &b"200"[..]))
        );
        assert_eq!(
            split_bed_fields(b"chr1\t100\t200\tname\t0\t+"),
            Some((&b"100"[..], &b"200"[..]))
        );
        assert_eq!(split_bed_fields(b"chr1\t100"), None);
        assert_eq!(split_bed_fields(b""), None);
    }

    #[test]
    fn test_should_skip_line() {
        assert!(should_skip_line(b""));
        assert!(should_skip_line(b"#comment"));
        assert!(should_skip_line(b"track name=mask"));
        assert!(should_skip_line(b"browser position chr1:1-100"));
        assert!(!should_skip_line(b"chr1\t100\t200"));
    }
}
