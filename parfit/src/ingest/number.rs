use winnow::{
    Result as WResult,
    ascii::{digit0, digit1},
    combinator::{alt, opt},
    prelude::*,
    token::one_of,
};

/// Sign, mantissa with optional leading-dot form, optional exponent.
/// Unlike `winnow::ascii::float`, never accepts `nan` or `inf`.
fn number(i: &mut &str) -> WResult<f64> {
    (
        opt(one_of(['+', '-'])),
        alt(((digit1, opt(('.', digit0))).void(), ('.', digit1).void())),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .verify_map(|s: &str| s.parse::<f64>().ok())
        .parse_next(i)
}

/// Value of the longest numeric prefix of `token`, ignoring leading
/// whitespace. `"12.5kg"` is 12.5, `"-.5"` is −0.5, `"1e"` is 1. Words such
/// as `nan` or `inf` are not numbers.
pub fn parse_number(token: &str) -> Option<f64> {
    number.parse_next(&mut token.trim_start()).ok()
}

/// Comma-separated fields, each trimmed.
pub fn split_csv(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

/// Every number on a line, treating `, = : ( ) [ ] *` as whitespace.
/// Tokens without a numeric prefix are skipped.
pub fn parse_floats(line: &str) -> Vec<f64> {
    line.split(|c: char| c.is_whitespace() || ",=:()[]*".contains(c))
        .filter(|token| !token.is_empty())
        .filter_map(parse_number)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_prefixes() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("  -3.25"), Some(-3.25));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("-.5"), Some(-0.5));
        assert_eq!(parse_number("+7."), Some(7.0));
        assert_eq!(parse_number("2.3894212918E+02"), Some(238.94212918));
        assert_eq!(parse_number("1e-3xyz"), Some(1e-3));
        assert_eq!(parse_number("12.5kg"), Some(12.5));
        assert_eq!(parse_number("1e"), Some(1.0));
        assert_eq!(parse_number("3E+"), Some(3.0));
    }

    #[test]
    fn non_numbers() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("e5"), None);
    }

    #[test]
    fn csv_fields_are_trimmed() {
        assert_eq!(split_csv(" a , b,c "), vec!["a", "b", "c"]);
        assert_eq!(split_csv(""), vec![""]);
    }

    #[test]
    fn floats_between_separators() {
        assert_eq!(
            parse_floats("b1 =   5.0000000000E+02   2.5000000000E+02"),
            vec![500.0, 250.0]
        );
        assert_eq!(parse_floats("f(x)=[1,2]*3: 4"), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(parse_floats("Data:   y          x"), Vec::<f64>::new());
    }
}
