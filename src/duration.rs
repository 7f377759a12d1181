use nom::bytes::complete::{tag, take_while};
use nom::combinator::{all_consuming, map_res};
use nom::multi::separated_list1;
use nom::IResult;
use once_cell::sync::Lazy;
use regex::Regex;

static UNIT_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)([hms])").unwrap());

/// Parses a duration such as `1:35:00`, `5:30`, `90`, `1h35m` or `45s` into seconds.
///
/// Colon-separated fields are tried first and summed positionally without range checks.
/// Anything else is scanned for `<digits><h|m|s>` tokens; text in between is ignored and
/// no tokens at all yields zero. Empty input is not a duration and yields `None`.
pub fn parse(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    match colon_separated(text) {
        Ok((_, fields)) if fields.len() <= 3 => Some(sum_positional(&fields)),
        _ => Some(sum_unit_tokens(text)),
    }
}

fn colon_field(input: &str) -> IResult<&str, u64> {
    map_res(take_while(|c: char| c.is_ascii_digit()), |s: &str| {
        if s.is_empty() {
            Ok(0)
        } else {
            s.parse()
        }
    })(input)
}

fn colon_separated(input: &str) -> IResult<&str, Vec<u64>> {
    all_consuming(separated_list1(tag(":"), colon_field))(input)
}

fn sum_positional(fields: &[u64]) -> u64 {
    fields
        .iter()
        .rev()
        .zip([1u64, 60, 3600].iter())
        .fold(0u64, |acc, (value, unit)| {
            acc.saturating_add(value.saturating_mul(*unit))
        })
}

fn sum_unit_tokens(text: &str) -> u64 {
    UNIT_TOKEN
        .captures_iter(text)
        .filter_map(|caps| {
            // Tokens too large for u64 contribute nothing.
            let value: u64 = caps[1].parse().ok()?;
            let unit = match &caps[2] {
                "h" => 3600,
                "m" => 60,
                _ => 1,
            };
            Some(value.saturating_mul(unit))
        })
        .fold(0u64, u64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_parse_duration {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                assert_eq!(parse(input), expected);
            }
        )*
        }
    }

    test_parse_duration! {
        test_parse_duration_hms: ("1:35:00", Some(5700)),
        test_parse_duration_ms: ("5:30", Some(330)),
        test_parse_duration_s: ("90", Some(90)),
        test_parse_duration_unbounded_fields: ("0:90:90", Some(5490)),
        test_parse_duration_empty_field: ("1::5", Some(3605)),
        test_parse_duration_minutes: ("10m", Some(600)),
        test_parse_duration_seconds: ("45s", Some(45)),
        test_parse_duration_composite: ("1h35m", Some(5700)),
        test_parse_duration_any_order: ("5s2h", Some(7205)),
        test_parse_duration_noise: ("about 2m and 3s", Some(123)),
        test_parse_duration_no_tokens: ("soon", Some(0)),
        test_parse_duration_too_many_fields: ("1:2:3:4", Some(0)),
        test_parse_duration_empty: ("", None),
    }
}
