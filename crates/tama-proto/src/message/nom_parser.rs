//! Nom-based IRC line parser.
//!
//! Splits one decoded line into borrowed pieces. Verb validation happens in
//! [`super::parse`]; this layer only knows the grammar:
//!
//! ```text
//! [':' <prefix> SPACE] <verb> *(SPACE <middle>) [SPACE ':' <trailing>]
//! ```

use nom::{
    bytes::complete::{take_till, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

/// Parse message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Parse the verb token. May be empty; the caller rejects that.
fn parse_verb(input: &str) -> IResult<&str, &str> {
    take_till(|c| c == ' ' || c == '\r' || c == '\n')(input)
}

/// Parse parameters after the verb.
///
/// Runs of spaces count as one separator. The first token starting with `:`
/// swallows the rest of the line as the trailing parameter, which may be
/// empty.
fn parse_params(input: &str) -> (&str, SmallVec<[&str; 15]>, Option<&str>) {
    let mut middle: SmallVec<[&str; 15]> = SmallVec::new();
    let mut rest = input;

    while rest.starts_with(' ') {
        rest = rest.trim_start_matches(' ');

        if rest.is_empty() || rest.starts_with('\r') || rest.starts_with('\n') {
            break;
        }

        if let Some(after_colon) = rest.strip_prefix(':') {
            let end = after_colon.find(['\r', '\n']).unwrap_or(after_colon.len());
            return (&after_colon[end..], middle, Some(&after_colon[..end]));
        }

        let end = rest.find([' ', '\r', '\n']).unwrap_or(rest.len());
        middle.push(&rest[..end]);
        rest = &rest[end..];
    }

    (rest, middle, None)
}

/// Parse a complete line into its borrowed components.
pub(crate) fn parse_line(input: &str) -> IResult<&str, ParsedLine<'_>> {
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;
    let (input, verb) = parse_verb(input)?;
    let (rest, middle, trailing) = parse_params(input);

    Ok((
        rest,
        ParsedLine {
            prefix,
            verb,
            middle,
            trailing,
        },
    ))
}

/// A parsed line holding slices into the decoded input.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedLine<'a> {
    /// Prefix without the leading `:`.
    pub prefix: Option<&'a str>,
    /// Verb exactly as received.
    pub verb: &'a str,
    /// Space-separated middle parameters.
    pub middle: SmallVec<[&'a str; 15]>,
    /// Trailing parameter without its `:`, if a colon was present.
    pub trailing: Option<&'a str>,
}
