//! Test utilities and shared fixtures for the survey report workspace.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for the tests of every downstream crate.

use crate::types::{export_header, SurveyRow, QUESTION_COUNT};
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging for tests; safe to call from every test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Create a temporary directory for tests that automatically cleans up.
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Row fixtures.
pub mod row_fixtures {
    use super::*;

    /// A row where every question is answered with `code`.
    pub fn uniform_row(patient: &str, created_at: &str, code: &str) -> SurveyRow {
        SurveyRow {
            floor: "3".to_string(),
            patient_name: patient.to_string(),
            answers: std::array::from_fn(|_| code.to_string()),
            created_at: created_at.to_string(),
            recorder: "5".to_string(),
        }
    }

    /// A row with explicit answers; unlisted slots are empty.
    pub fn row_with_answers(patient: &str, created_at: &str, answers: &[&str]) -> SurveyRow {
        let mut row = uniform_row(patient, created_at, "");
        for (cell, answer) in row.answers.iter_mut().zip(answers) {
            *cell = (*answer).to_string();
        }
        row
    }
}

/// Export text fixtures.
pub mod export_fixtures {
    use super::*;

    /// Renders rows as export text with the standard header.
    pub fn export_text(rows: &[SurveyRow], delimiter: char, bom: bool) -> String {
        let mut text = String::new();
        if bom {
            text.push('\u{feff}');
        }
        let sep = delimiter.to_string();
        text.push_str(&export_header().join(&sep));
        text.push_str("\r\n");
        for row in rows {
            text.push_str(&row.to_record().join(&sep));
            text.push_str("\r\n");
        }
        text
    }
}

/// Property-based testing strategies.
pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    /// Answer cells as stored upstream: codes, decimal codes, padded codes, free text.
    pub fn answer_cell() -> impl Strategy<Value = String> {
        prop_oneof![
            (1u8..=7).prop_map(|code| code.to_string()),
            (1u8..=7, 0u8..=9).prop_map(|(code, frac)| format!("{code}.{frac}")),
            (1u8..=7).prop_map(|code| format!(" {code} ")),
            prop_oneof![Just("0"), Just("8"), Just("9")].prop_map(str::to_string),
            "[a-zA-Z ]{0,12}",
        ]
    }

    /// Arbitrary survey rows.
    pub fn survey_row() -> impl Strategy<Value = SurveyRow> {
        (
            "[0-9]{1,2}",
            "[A-Za-z ]{1,16}",
            proptest::collection::vec(answer_cell(), QUESTION_COUNT as usize),
            (0u32..60, 0u32..60),
            (1u8..=5).prop_map(|code| code.to_string()),
        )
            .prop_map(|(floor, patient_name, answers, (min, sec), recorder)| {
                let mut row = SurveyRow {
                    floor,
                    patient_name,
                    created_at: format!("2024-03-15 10:{min:02}:{sec:02}"),
                    recorder,
                    ..SurveyRow::default()
                };
                for (cell, answer) in row.answers.iter_mut().zip(answers) {
                    *cell = answer;
                }
                row
            })
    }
}
