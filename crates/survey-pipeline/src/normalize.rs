//! Code-to-label mapping for answer and recorder cells

use std::borrow::Cow;
use survey_common::{QuestionSlot, SurveyRow};

/// One entry of a static lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeLabel {
    pub code: &'static str,
    pub label: &'static str,
}

/// Answer codes shared by every coded question
pub static ANSWER_LABELS: &[CodeLabel] = &[
    CodeLabel { code: "1", label: "Poor" },
    CodeLabel { code: "2", label: "Good" },
    CodeLabel { code: "3", label: "Fair" },
    CodeLabel { code: "4", label: "Excellent" },
    CodeLabel { code: "5", label: "Not used" },
    CodeLabel { code: "6", label: "Yes" },
    CodeLabel { code: "7", label: "No" },
];

/// Recorder identities stored as codes
pub static RECORDER_LABELS: &[CodeLabel] = &[CodeLabel {
    code: "5",
    label: "Edna das Graças Prates Cruz",
}];

/// Lookup key of a raw cell: trimmed, cut at the first `.`
fn code_key(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.split_once('.').map_or(trimmed, |(whole, _)| whole))
}

fn lookup(table: &'static [CodeLabel], raw: &str) -> Option<&'static str> {
    let key = code_key(raw)?;
    table.iter().find(|entry| entry.code == key).map(|entry| entry.label)
}

/// Maps an answer code to its label; anything else comes back untouched.
pub fn normalize_answer(raw: &str) -> Cow<'_, str> {
    match lookup(ANSWER_LABELS, raw) {
        Some(label) => Cow::Borrowed(label),
        None => Cow::Borrowed(raw),
    }
}

/// Maps a recorder code to its full name; anything else comes back untouched.
pub fn normalize_recorder(raw: &str) -> Cow<'_, str> {
    match lookup(RECORDER_LABELS, raw) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Borrowed(raw),
    }
}

/// Row-level normalization applied before export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalizer {
    /// Replace answer codes in coded question cells
    pub replace_codes: bool,
}

impl Normalizer {
    pub fn new(replace_codes: bool) -> Self {
        Self { replace_codes }
    }

    /// Normalizes a row in place. The recorder cell is always mapped.
    pub fn apply(&self, row: &mut SurveyRow) {
        if self.replace_codes {
            for slot in QuestionSlot::all().filter(|slot| !slot.is_free_text()) {
                let cell = row.answer_mut(slot);
                if let Some(label) = lookup(ANSWER_LABELS, cell) {
                    *cell = label.to_string();
                }
            }
        }
        if let Some(name) = lookup(RECORDER_LABELS, &row.recorder) {
            row.recorder = name.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use survey_common::test_utils::{row_fixtures, strategies};

    #[test]
    fn test_answer_table() {
        let cases = [
            ("1", "Poor"),
            ("2", "Good"),
            ("3", "Fair"),
            ("4", "Excellent"),
            ("5", "Not used"),
            ("6", "Yes"),
            ("7", "No"),
        ];
        for (code, label) in cases {
            assert_eq!(normalize_answer(code), label);
        }
    }

    #[test]
    fn test_fraction_is_truncated_not_rounded() {
        assert_eq!(normalize_answer("1.0"), "Poor");
        assert_eq!(normalize_answer("1.9"), "Poor");
        assert_eq!(normalize_answer(" 4.5 "), "Excellent");
    }

    #[test]
    fn test_unknown_values_pass_through_verbatim() {
        assert_eq!(normalize_answer("8"), "8");
        assert_eq!(normalize_answer("0"), "0");
        assert_eq!(normalize_answer("  "), "  ");
        assert_eq!(normalize_answer(""), "");
        assert_eq!(normalize_answer(" great "), " great ");
        assert_eq!(normalize_answer(".5"), ".5");
        assert!(matches!(normalize_answer("abc"), Cow::Borrowed("abc")));
    }

    #[test]
    fn test_recorder_mapping() {
        assert_eq!(normalize_recorder("5"), "Edna das Graças Prates Cruz");
        assert_eq!(normalize_recorder(" 5.0 "), "Edna das Graças Prates Cruz");
        assert_eq!(normalize_recorder("3"), "3");
        assert_eq!(normalize_recorder("Maria"), "Maria");
    }

    #[test]
    fn test_apply_skips_free_text_slots() {
        let mut row = row_fixtures::uniform_row("Ana", "2024-03-01 08:00:00", "2");
        Normalizer::new(true).apply(&mut row);

        for slot in QuestionSlot::all() {
            let expected = if slot.is_free_text() { "2" } else { "Good" };
            assert_eq!(row.answer(slot), expected, "{slot}");
        }
        assert_eq!(row.recorder, "Edna das Graças Prates Cruz");
    }

    #[test]
    fn test_apply_without_replace_maps_only_recorder() {
        let mut row = row_fixtures::uniform_row("Ana", "2024-03-01 08:00:00", "2");
        Normalizer::default().apply(&mut row);

        assert!(row.answers.iter().all(|a| a == "2"));
        assert_eq!(row.recorder, "Edna das Graças Prates Cruz");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in strategies::answer_cell()) {
            let once = normalize_answer(&raw).into_owned();
            let twice = normalize_answer(&once).into_owned();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_fraction_matches_whole(code in 1u32..=7, frac in 0u32..100) {
            let whole = code.to_string();
            let fractional = format!("{code}.{frac}");
            prop_assert_eq!(normalize_answer(&whole), normalize_answer(&fractional));
        }

        #[test]
        fn prop_row_normalization_is_idempotent(row in strategies::survey_row(), replace in any::<bool>()) {
            let normalizer = Normalizer::new(replace);
            let mut once = row.clone();
            normalizer.apply(&mut once);
            let mut twice = once.clone();
            normalizer.apply(&mut twice);
            prop_assert_eq!(once, twice);
        }
    }
}
