use rabbit_house_core::{HeightGrid, Location};
use rabbit_house_system_leveling::Leveling;
use serde::Serialize;
use thiserror::Error;

use crate::case_input::CaseInput;

/// Result of leveling a single test case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct CaseReport {
    /// One-based position of the case within the input.
    pub case: usize,
    /// Total height added to make the grid safe.
    pub total_added: u64,
    /// Number of cells secured during the run.
    pub secured: usize,
    /// Number of individual neighbour raises applied.
    pub raises: usize,
    /// Grid after leveling.
    pub leveled: HeightGrid,
}

/// Options applied to every case in a batch.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SolveOptions {
    /// Re-check the leveled grid against the original before reporting.
    pub verify: bool,
}

/// Reasons a leveled grid failed post-run verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum VerificationError {
    /// Two adjacent cells still differ by more than one.
    #[error("case {case}: cells {first:?} and {second:?} still differ by more than one")]
    Unsafe {
        /// One-based case index.
        case: usize,
        /// First cell of the offending pair.
        first: Location,
        /// Second cell of the offending pair.
        second: Location,
    },
    /// A cell ended lower than it started.
    #[error("case {case}: cell {location:?} was lowered")]
    Lowered {
        /// One-based case index.
        case: usize,
        /// Cell whose height decreased.
        location: Location,
    },
    /// The reported total disagrees with the observed height change.
    #[error("case {case}: reported {reported} added but grid grew by {observed}")]
    Accounting {
        /// One-based case index.
        case: usize,
        /// Total reported by the leveling run.
        reported: u64,
        /// Difference between final and initial grid totals.
        observed: u64,
    },
}

/// Levels a copy of the case grid and summarises the run.
pub(crate) fn solve_case(
    input: &CaseInput,
    options: SolveOptions,
) -> Result<CaseReport, VerificationError> {
    let mut leveled = input.grid.clone();
    let outcome = Leveling::new().run(&mut leveled);

    if log::log_enabled!(log::Level::Debug) {
        log::debug!(
            "case {} before:\n{}after:\n{}",
            input.index,
            format_grid(&input.grid),
            format_grid(&leveled),
        );
    }

    if options.verify {
        verify(input.index, &input.grid, &leveled, outcome.total_added())?;
    }

    Ok(CaseReport {
        case: input.index,
        total_added: outcome.total_added(),
        secured: outcome.secured(),
        raises: outcome.raises(),
        leveled,
    })
}

fn verify(
    case: usize,
    initial: &HeightGrid,
    leveled: &HeightGrid,
    reported: u64,
) -> Result<(), VerificationError> {
    if let Some((first, second)) = leveled.first_unsafe_pair() {
        return Err(VerificationError::Unsafe {
            case,
            first,
            second,
        });
    }

    let lowered = initial
        .locations()
        .find(|&location| leveled.get(location) < initial.get(location));
    if let Some(location) = lowered {
        return Err(VerificationError::Lowered { case, location });
    }

    let observed = leveled.total_height() - initial.total_height();
    if observed != reported {
        return Err(VerificationError::Accounting {
            case,
            reported,
            observed,
        });
    }

    Ok(())
}

/// Renders one `Case #i: total` line per report, optionally followed by the leveled grid.
pub(crate) fn render_text(reports: &[CaseReport], show_grids: bool) -> String {
    let mut out = String::new();
    for report in reports {
        out.push_str(&format!("Case #{}: {}\n", report.case, report.total_added));
        if show_grids {
            out.push_str(&format_grid(&report.leveled));
        }
    }
    out
}

/// Serialises every report into a single pretty-printed JSON document.
pub(crate) fn render_json(reports: &[CaseReport]) -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct BatchReport<'a> {
        cases: &'a [CaseReport],
        total_added: u64,
    }

    let batch = BatchReport {
        cases: reports,
        total_added: reports.iter().map(|report| report.total_added).sum(),
    };
    let mut json = serde_json::to_string_pretty(&batch)?;
    json.push('\n');
    Ok(json)
}

fn format_grid(grid: &HeightGrid) -> String {
    let mut out = String::new();
    for row in grid.iter_rows() {
        let cells: Vec<String> = row.iter().map(u32::to_string).collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(index: usize, rows: &[&[u32]]) -> CaseInput {
        CaseInput {
            index,
            grid: HeightGrid::from_rows(rows.iter().map(|row| row.to_vec()).collect())
                .expect("valid grid"),
        }
    }

    #[test]
    fn solve_case_reports_total_and_final_grid() {
        let report = solve_case(&case(3, &[&[0], &[5], &[0]]), SolveOptions { verify: true })
            .expect("leveling verifies");

        assert_eq!(report.case, 3);
        assert_eq!(report.total_added, 8);
        assert_eq!(report.raises, 2);
        assert_eq!(report.leveled.cells(), &[4, 5, 4]);
    }

    #[test]
    fn solve_case_leaves_input_untouched() {
        let input = case(1, &[&[5, 1]]);

        let _ = solve_case(&input, SolveOptions::default()).expect("leveling succeeds");

        assert_eq!(input.grid.cells(), &[5, 1]);
    }

    #[test]
    fn verify_flags_unsafe_grid() {
        let initial = HeightGrid::from_rows(vec![vec![5, 1]]).expect("valid grid");

        assert_eq!(
            verify(2, &initial, &initial, 0),
            Err(VerificationError::Unsafe {
                case: 2,
                first: Location::new(0, 0),
                second: Location::new(0, 1),
            })
        );
    }

    #[test]
    fn verify_flags_lowered_cell() {
        let initial = HeightGrid::from_rows(vec![vec![3, 3]]).expect("valid grid");
        let leveled = HeightGrid::from_rows(vec![vec![3, 2]]).expect("valid grid");

        assert_eq!(
            verify(1, &initial, &leveled, 0),
            Err(VerificationError::Lowered {
                case: 1,
                location: Location::new(0, 1),
            })
        );
    }

    #[test]
    fn verify_flags_accounting_mismatch() {
        let initial = HeightGrid::from_rows(vec![vec![5, 1]]).expect("valid grid");
        let leveled = HeightGrid::from_rows(vec![vec![5, 4]]).expect("valid grid");

        assert_eq!(
            verify(1, &initial, &leveled, 2),
            Err(VerificationError::Accounting {
                case: 1,
                reported: 2,
                observed: 3,
            })
        );
    }

    #[test]
    fn render_text_prints_one_line_per_case() {
        let reports = vec![
            solve_case(&case(1, &[&[5, 1]]), SolveOptions::default()).expect("solves"),
            solve_case(&case(2, &[&[7]]), SolveOptions::default()).expect("solves"),
        ];

        assert_eq!(render_text(&reports, false), "Case #1: 3\nCase #2: 0\n");
        assert_eq!(
            render_text(&reports, true),
            "Case #1: 3\n5 4\nCase #2: 0\n7\n"
        );
    }

    #[test]
    fn render_json_includes_batch_total() {
        let reports = vec![
            solve_case(&case(1, &[&[5, 1, 1]]), SolveOptions::default()).expect("solves"),
            solve_case(&case(2, &[&[5, 1]]), SolveOptions::default()).expect("solves"),
        ];

        let json = render_json(&reports).expect("reports serialise");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["total_added"], 8);
        assert_eq!(value["cases"][0]["case"], 1);
        assert_eq!(value["cases"][0]["total_added"], 5);
        assert_eq!(value["cases"][1]["leveled"]["heights"], serde_json::json!([5, 4]));
    }
}
