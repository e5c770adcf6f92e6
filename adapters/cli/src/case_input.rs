use std::num::ParseIntError;

use rabbit_house_core::{GridError, HeightGrid};
use thiserror::Error;

/// Single test case decoded from the text input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CaseInput {
    /// One-based position of the case within the input.
    pub index: usize,
    /// Terrain heights supplied for the case.
    pub grid: HeightGrid,
}

/// Errors that can occur while decoding the test case text format.
#[derive(Debug, Error)]
pub(crate) enum CaseInputError {
    /// The input contained no records at all.
    #[error("input is empty; expected the number of cases on the first line")]
    MissingCaseCount,
    /// The input ended before every announced case was read.
    #[error("expected {expected} cases but input ended before case {case}")]
    MissingCase {
        /// One-based index of the case that could not be found.
        case: usize,
        /// Number of cases announced on the first line.
        expected: usize,
    },
    /// A grid ended before all of its rows were read.
    #[error("case {case}: input ended after {found} of {expected} rows")]
    TruncatedGrid {
        /// One-based index of the truncated case.
        case: usize,
        /// Number of rows declared by the dimension line.
        expected: u32,
        /// Number of rows actually present.
        found: u32,
    },
    /// A line held the wrong number of integer fields.
    #[error("line {line}: expected {expected} integers but found {found}")]
    FieldCount {
        /// One-based line number within the input.
        line: usize,
        /// Number of fields required on the line.
        expected: usize,
        /// Number of fields present on the line.
        found: usize,
    },
    /// A field could not be parsed as a non-negative integer.
    #[error("line {line}: '{field}' is not a non-negative integer")]
    InvalidNumber {
        /// One-based line number within the input.
        line: usize,
        /// Raw text of the rejected field.
        field: String,
        /// Underlying parse failure.
        #[source]
        source: ParseIntError,
    },
    /// A dimension line declared zero rows or zero columns.
    #[error("line {line}: grid dimensions must both be at least one")]
    ZeroDimensions {
        /// One-based line number within the input.
        line: usize,
    },
    /// Content remained after the final announced case.
    #[error("line {line}: unexpected content after the final case")]
    TrailingContent {
        /// One-based line number of the first extra record.
        line: usize,
    },
    /// The decoded heights could not form a grid.
    #[error("case {case}: {source}")]
    Grid {
        /// One-based index of the rejected case.
        case: usize,
        /// Grid construction failure.
        #[source]
        source: GridError,
    },
}

/// Decodes every test case from the provided text.
///
/// The first record holds the case count. Each case starts with a `rows columns`
/// record followed by `rows` records of `columns` heights. Blank lines between
/// records are ignored.
pub(crate) fn parse_cases(text: &str) -> Result<Vec<CaseInput>, CaseInputError> {
    let mut records = Records::new(text);

    let (line, count) = records.next().ok_or(CaseInputError::MissingCaseCount)?;
    let expected = parse_fields::<usize>(line, count, 1)?[0];

    let mut cases = Vec::with_capacity(expected.min(1024));
    for index in 1..=expected {
        let (line, dimensions) = records.next().ok_or(CaseInputError::MissingCase {
            case: index,
            expected,
        })?;
        let dimensions = parse_fields::<u32>(line, dimensions, 2)?;
        let (rows, columns) = (dimensions[0], dimensions[1]);
        if rows == 0 || columns == 0 {
            return Err(CaseInputError::ZeroDimensions { line });
        }

        let width = usize::try_from(columns).map_err(|_| CaseInputError::Grid {
            case: index,
            source: GridError::TooLarge,
        })?;
        let mut heights = Vec::new();
        for found in 0..rows {
            let (line, row) = records.next().ok_or(CaseInputError::TruncatedGrid {
                case: index,
                expected: rows,
                found,
            })?;
            heights.extend(parse_fields::<u32>(line, row, width)?);
        }

        let grid = HeightGrid::from_cells(rows, columns, heights)
            .map_err(|source| CaseInputError::Grid { case: index, source })?;
        cases.push(CaseInput { index, grid });
    }

    if let Some((line, _)) = records.next() {
        return Err(CaseInputError::TrailingContent { line });
    }

    Ok(cases)
}

/// Non-blank lines paired with their one-based line numbers.
struct Records<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Records<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.lines
            .by_ref()
            .find(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| (index + 1, line))
    }
}

fn parse_fields<T>(line: usize, text: &str, expected: usize) -> Result<Vec<T>, CaseInputError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    let values = text
        .split_whitespace()
        .map(|field| {
            field
                .parse::<T>()
                .map_err(|source| CaseInputError::InvalidNumber {
                    line,
                    field: field.to_owned(),
                    source,
                })
        })
        .collect::<Result<Vec<T>, _>>()?;

    if values.len() != expected {
        return Err(CaseInputError::FieldCount {
            line,
            expected,
            found: values.len(),
        });
    }

    Ok(values)
}
