//! Parser for standard gas-mix notation.
//!
//! Accepts the notations divers actually type: "air", "oxygen"/"o2",
//! nitrox as "EAN32"/"NX32", and O2/He pairs like "21/35", optionally
//! prefixed with "TX"/"TMX"/"trimix". Case-insensitive, surrounding
//! whitespace ignored.

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map_res, opt, value},
    sequence::{preceded, separated_pair},
    IResult, Parser,
};

use super::GasMix;
use crate::error::PlanError;

pub(super) fn parse_label(input: &str) -> Result<GasMix, PlanError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PlanError::InvalidGasLabel {
            label: input.to_string(),
        });
    }
    match all_consuming(mix).parse(trimmed) {
        Ok((_, (o2, he))) => {
            if o2 > 100 || he > 100 || o2 + he > 100 {
                return Err(PlanError::InvalidGasLabel {
                    label: trimmed.to_string(),
                });
            }
            GasMix::new(f64::from(o2) / 100.0, f64::from(he) / 100.0)
        }
        Err(_) => Err(PlanError::InvalidGasLabel {
            label: trimmed.to_string(),
        }),
    }
}

/// Any supported notation, as (O2 percent, He percent).
fn mix(input: &str) -> IResult<&str, (u32, u32)> {
    alt((trimix, nitrox, named)).parse(input)
}

fn named(input: &str) -> IResult<&str, (u32, u32)> {
    alt((
        value((21, 0), tag_no_case("air")),
        value((100, 0), tag_no_case("oxygen")),
        value((100, 0), tag_no_case("o2")),
    ))
    .parse(input)
}

fn percent(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>()).parse(input)
}

fn nitrox(input: &str) -> IResult<&str, (u32, u32)> {
    let (rest, o2) =
        preceded(alt((tag_no_case("ean"), tag_no_case("nx"))), percent).parse(input)?;
    Ok((rest, (o2, 0)))
}

fn trimix(input: &str) -> IResult<&str, (u32, u32)> {
    preceded(
        opt(alt((
            tag_no_case("trimix"),
            tag_no_case("tmx"),
            tag_no_case("tx"),
        ))),
        preceded(multispace0, separated_pair(percent, char('/'), percent)),
    )
    .parse(input)
}
