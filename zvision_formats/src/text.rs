/// Script files are single-byte Latin-1; every byte maps to the code point
/// of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// Drops everything after a `#` and trims the remainder.
pub fn trim_comments_and_whitespace(line: &str) -> &str {
    let without_comment = match line.find('#') {
        Some(index) => &line[..index],
        None => line,
    };
    without_comment.trim()
}

/// Parses the leading integer of `token` the way C's `atoi` does: optional
/// sign, then digits, stopping at the first non-digit. Returns `None` when no
/// digits are present.
pub fn parse_leading_int(token: &str) -> Option<i64> {
    let token = token.trim_start();
    let (negative, digits) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };

    let end = digits
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map(|(index, _)| index)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Splits an argument list on commas and whitespace, dropping empty tokens.
pub fn split_arguments(args: &str) -> Vec<&str> {
    args.split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Case-insensitive prefix check used by the block matchers.
pub(crate) fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.len() >= prefix.len()
        && line.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_bytes_keep_their_code_points() {
        assert_eq!(decode_latin1(b"caf\xe9.raw"), "café.raw");
        assert_eq!(decode_latin1(b"\xff"), "\u{ff}");
    }

    #[test]
    fn comments_are_stripped_before_trimming() {
        assert_eq!(trim_comments_and_whitespace("  [10] = 1   # door"), "[10] = 1");
        assert_eq!(trim_comments_and_whitespace("# whole line"), "");
        assert_eq!(trim_comments_and_whitespace("\tresults {\r"), "results {");
    }

    #[test]
    fn leading_int_behaves_like_atoi() {
        assert_eq!(parse_leading_int("42)"), Some(42));
        assert_eq!(parse_leading_int("-7,"), Some(-7));
        assert_eq!(parse_leading_int("  13000(0"), Some(13000));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn arguments_split_on_commas_and_spaces() {
        assert_eq!(split_arguments("g, a, ry,0"), vec!["g", "a", "ry", "0"]);
        assert_eq!(split_arguments("0 a000h2tc.raw 1 100"), vec!["0", "a000h2tc.raw", "1", "100"]);
        assert!(split_arguments("  ").is_empty());
    }
}
