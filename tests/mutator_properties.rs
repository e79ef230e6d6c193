//! Property-based tests for the batch field mutator.
//!
//! These tests use proptest to verify pass invariants hold across
//! randomly generated row populations and failure injection points.

use proptest::prelude::*;

use fieldwork::core::types::{FieldName, FieldType, RowId, Value};
use fieldwork::mutator::{update_field, CollectingProgress, MutatePlan, ProgressEvent};
use fieldwork::source::memory::FailOn;
use fieldwork::source::{CursorError, FieldDef, MemoryTable};

/// A table with `n` rows and one empty date field.
fn table_with_rows(n: u64) -> MemoryTable {
    let field = FieldName::new("datestamp").unwrap();
    let table = MemoryTable::new("prop_table", vec![FieldDef::new(field, FieldType::Date)]);
    for _ in 0..n {
        table.insert_row(vec![]);
    }
    table
}

fn datestamp() -> FieldName {
    FieldName::new("datestamp").unwrap()
}

fn stamp_value() -> Value {
    FieldType::Date.parse_value("2021-07-08").unwrap()
}

proptest! {
    /// With no injected failure, every row is attempted and committed.
    #[test]
    fn clean_pass_commits_every_row(n in 0u64..40) {
        let table = table_with_rows(n);
        let mut sink = CollectingProgress::new();

        let outcome = update_field(
            &table,
            &datestamp(),
            &MutatePlan::constant(stamp_value()),
            &mut sink,
        )
        .unwrap();

        prop_assert_eq!(outcome.rows_attempted, n);
        prop_assert_eq!(outcome.rows_succeeded, n);
        prop_assert!(outcome.first_error.is_none());

        for id in table.row_ids() {
            prop_assert_eq!(
                table.value(id, &datestamp()).unwrap(),
                stamp_value()
            );
        }
    }

    /// Progress notifications are monotonically increasing, `1..N`
    /// exactly once each, with the captured total on every event.
    #[test]
    fn progress_is_monotone_and_complete(n in 0u64..40) {
        let table = table_with_rows(n);
        let mut sink = CollectingProgress::new();

        update_field(
            &table,
            &datestamp(),
            &MutatePlan::constant(stamp_value()),
            &mut sink,
        )
        .unwrap();

        let steps = sink.steps();
        let expected: Vec<u64> = (1..=n).collect();
        prop_assert_eq!(steps, expected);
        for event in &sink.events {
            if let ProgressEvent::Progress { total, .. } = event {
                prop_assert_eq!(*total, n);
            }
        }
    }

    /// A failure injected at row `k` leaves rows `1..k-1` committed and
    /// rows `k..N` untouched, and the outcome names row `k`.
    #[test]
    fn injected_failure_preserves_the_frontier(n in 1u64..40, k_seed in 0u64..40) {
        let k = (k_seed % n) + 1;
        let table = table_with_rows(n).fail_on(FailOn::WriteStep {
            step: k,
            error: CursorError::WriteFailed("injected".into()),
        });
        let mut sink = CollectingProgress::new();

        let outcome = update_field(
            &table,
            &datestamp(),
            &MutatePlan::constant(stamp_value()),
            &mut sink,
        )
        .unwrap();

        prop_assert_eq!(outcome.rows_attempted, n);
        prop_assert_eq!(outcome.rows_succeeded, k - 1);
        let failure = outcome.first_error.unwrap();
        prop_assert_eq!(failure.row_id, Some(RowId(k as i64)));

        let ids = table.row_ids();
        for (i, id) in ids.iter().enumerate() {
            let value = table.value(*id, &datestamp()).unwrap();
            if (i as u64) < k - 1 {
                prop_assert_eq!(value, stamp_value());
            } else {
                prop_assert!(value.is_null());
            }
        }

        // Progress covers exactly the committed rows.
        let steps = sink.steps();
        let expected: Vec<u64> = (1..k).collect();
        prop_assert_eq!(steps, expected);
    }

    /// The outcome invariant holds under any failure point:
    /// rows_succeeded <= rows_attempted <= row count at start.
    #[test]
    fn outcome_counts_are_ordered(n in 1u64..40, k_seed in 0u64..80) {
        let table = table_with_rows(n);
        // Inject only half the time, anywhere including past the end.
        let table = if k_seed % 2 == 0 {
            table.fail_on(FailOn::WriteStep {
                step: (k_seed / 2) + 1,
                error: CursorError::WriteFailed("injected".into()),
            })
        } else {
            table
        };

        let outcome = update_field(
            &table,
            &datestamp(),
            &MutatePlan::constant(stamp_value()),
            &mut CollectingProgress::new(),
        )
        .unwrap();

        prop_assert!(outcome.rows_succeeded <= outcome.rows_attempted);
        prop_assert!(outcome.rows_attempted <= n);
    }

    /// The cursor is released on every exit path, failed or clean.
    #[test]
    fn cursor_released_under_any_outcome(n in 1u64..20, k_seed in 0u64..40) {
        let table = if k_seed % 2 == 0 {
            table_with_rows(n).fail_on(FailOn::WriteStep {
                step: (k_seed % n) + 1,
                error: CursorError::WriteFailed("injected".into()),
            })
        } else {
            table_with_rows(n)
        };

        update_field(
            &table,
            &datestamp(),
            &MutatePlan::constant(stamp_value()),
            &mut CollectingProgress::new(),
        )
        .unwrap();

        prop_assert_eq!(table.open_cursor_count(), 0);
    }

    /// A failing sink never changes what gets written.
    #[test]
    fn failing_sink_is_outcome_neutral(n in 0u64..20) {
        let reference = {
            let table = table_with_rows(n);
            update_field(
                &table,
                &datestamp(),
                &MutatePlan::constant(stamp_value()),
                &mut CollectingProgress::new(),
            )
            .unwrap()
        };

        let table = table_with_rows(n);
        let mut sink = CollectingProgress::failing();
        let outcome = update_field(
            &table,
            &datestamp(),
            &MutatePlan::constant(stamp_value()),
            &mut sink,
        )
        .unwrap();

        prop_assert_eq!(outcome.rows_succeeded, reference.rows_succeeded);
        prop_assert_eq!(outcome.rows_attempted, reference.rows_attempted);
        prop_assert_eq!(outcome.reporting_failures, n);

        for id in table.row_ids() {
            prop_assert_eq!(table.value(id, &datestamp()).unwrap(), stamp_value());
        }
    }
}

#[test]
fn count_is_captured_before_iteration() {
    // The mutator asks for the count exactly once, before opening the
    // cursor, and never re-validates it mid-pass.
    let table = table_with_rows(3);
    update_field(
        &table,
        &datestamp(),
        &MutatePlan::constant(stamp_value()),
        &mut CollectingProgress::new(),
    )
    .unwrap();

    let counts = table
        .operations()
        .iter()
        .filter(|op| {
            matches!(
                op,
                fieldwork::source::memory::SourceOperation::CountRecords
            )
        })
        .count();
    assert_eq!(counts, 1);
}
