//! Canonicalization of quiz question payloads, one function per type.

use indexmap::IndexMap;
use serde_json::Value;

use super::blanks::{derive_blanks, BlankIdStyle};
use super::pairs::{detect_one_based, resolve_in_list, StringRefs};
use crate::coerce::{self, field, number_of, text_of, to_string_array, unique_strings};
use crate::model::{
    FillBlankAnswer, FillBlankConfig, MatchingAnswer, MatchingConfig, MultiSelectAnswer,
    MultiSelectConfig, MultipleChoiceAnswer, MultipleChoiceConfig, NumericRangeAnswer,
    NumericRangeConfig, PartialCreditRange, QuestionBody, QuestionTypeSlug, TextInputAnswer,
    TextInputConfig, ToleranceType, TrueFalseAnswer, TrueFalseConfig, YearRangeAnswer,
    YearRangeConfig,
};

/// Fields carried by pre-multi-type records.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LegacyFields<'a> {
    pub options: Option<&'a Value>,
    pub correct_answer: Option<&'a Value>,
}

/// Canonicalize a question's config and answer key for `slug`.
///
/// Never fails: missing or garbled fields fall back to conservative defaults.
pub fn normalize_question(slug: QuestionTypeSlug, config: &Value, answer_data: &Value) -> QuestionBody {
    normalize_with_legacy(slug, config, answer_data, LegacyFields::default())
}

pub(crate) fn normalize_with_legacy(
    slug: QuestionTypeSlug,
    config: &Value,
    answer: &Value,
    legacy: LegacyFields<'_>,
) -> QuestionBody {
    match slug {
        QuestionTypeSlug::MultipleChoice => multiple_choice(config, answer, legacy),
        QuestionTypeSlug::TrueFalse => true_false(config, answer, legacy),
        QuestionTypeSlug::TextInput => text_input(config, answer),
        QuestionTypeSlug::YearRange => year_range(config, answer, legacy),
        QuestionTypeSlug::NumericRange => numeric_range(config, answer, legacy),
        QuestionTypeSlug::Matching => matching(config, answer),
        QuestionTypeSlug::FillBlank => fill_blank(config, answer),
        QuestionTypeSlug::MultiSelect => multi_select(config, answer),
    }
}

fn round(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn non_negative_u32(value: f64) -> u32 {
    round(value).clamp(0, u32::MAX as i64) as u32
}

fn multiple_choice(config: &Value, answer: &Value, legacy: LegacyFields<'_>) -> QuestionBody {
    let raw_options: Vec<Option<String>> =
        match field(config, &["options", "choices"]).or(legacy.options) {
            Some(Value::Array(items)) => items.iter().map(coerce::text).collect(),
            Some(other) => vec![coerce::text(other)],
            None => Vec::new(),
        };
    let options = unique_strings(raw_options.iter().flatten().cloned().collect());

    // Authored indices point into the raw list; follow the option text
    // through blank and duplicate removal.
    let authored_index = number_of(
        field(answer, &["correctIndex", "correctAnswer", "answerIndex"]).or(legacy.correct_answer),
    )
    .map(round);
    let index = match authored_index {
        Some(raw) => usize::try_from(raw)
            .ok()
            .and_then(|i| raw_options.get(i))
            .and_then(Option::as_ref)
            .and_then(|text| options.iter().position(|o| o == text))
            .map(|i| i as i64)
            .or(Some(raw)),
        None => coerce::string_field(answer, "correctOption").and_then(|option| {
            options
                .iter()
                .position(|o| *o == option.trim())
                .map(|i| i as i64)
        }),
    };

    let correct_index = match options.len() {
        0 => 0,
        len => index.unwrap_or(0).clamp(0, len as i64 - 1) as usize,
    };

    QuestionBody::MultipleChoice {
        config: MultipleChoiceConfig {
            options,
            shuffle_options: coerce::bool_of(config.get("shuffleOptions")).unwrap_or(false),
        },
        answer: MultipleChoiceAnswer { correct_index },
    }
}

fn true_false(config: &Value, answer: &Value, legacy: LegacyFields<'_>) -> QuestionBody {
    let from_legacy_index = number_of(legacy.correct_answer).and_then(|i| match i {
        i if i == 1.0 => Some(true),
        i if i == 0.0 => Some(false),
        _ => None,
    });
    let correct_value = coerce::bool_of(field(answer, &["correctValue", "isTrue", "answer"]))
        .or(from_legacy_index)
        .unwrap_or(true);

    let defaults = TrueFalseConfig::default();
    QuestionBody::TrueFalse {
        config: TrueFalseConfig {
            true_label: coerce::string_field(config, "trueLabel").unwrap_or(defaults.true_label),
            false_label: coerce::string_field(config, "falseLabel").unwrap_or(defaults.false_label),
        },
        answer: TrueFalseAnswer { correct_value },
    }
}

fn text_input(config: &Value, answer: &Value) -> QuestionBody {
    let accepted_source = field(answer, &["acceptedAnswers", "answers", "correctAnswers"]).or_else(|| {
        answer
            .get("exactMatch")
            .filter(|v| v.is_string())
    });
    let accepted_answers = unique_strings(to_string_array(accepted_source));
    let keywords = unique_strings(to_string_array(
        field(answer, &["keywords"]).or_else(|| field(config, &["acceptedKeywords"])),
    ));
    let keyword_match_threshold = number_of(answer.get("keywordMatchThreshold"))
        .filter(|t| *t > 0.0)
        .map(non_negative_u32);

    QuestionBody::TextInput {
        config: TextInputConfig {
            case_sensitive: coerce::bool_of(config.get("caseSensitive")).unwrap_or(false),
            trim_whitespace: coerce::bool_of(config.get("trimWhitespace")).unwrap_or(true),
            placeholder: coerce::string_field(config, "placeholder"),
            max_length: number_of(config.get("maxLength"))
                .filter(|m| *m > 0.0)
                .map(non_negative_u32),
        },
        answer: TextInputAnswer {
            accepted_answers,
            keywords,
            keyword_match_threshold,
        },
    }
}

/// Credit tiers sorted by ascending tolerance, with credit clamped to 0..=100.
fn partial_credit_ranges(answer: &Value, with_tolerance_type: bool) -> Vec<PartialCreditRange> {
    let Some(items) = answer.get("partialCreditRanges").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut ranges: Vec<PartialCreditRange> = items
        .iter()
        .filter_map(|item| {
            let tolerance = number_of(item.get("tolerance"))?;
            let credit = number_of(item.get("creditPercent"))?;
            let tolerance_type = if with_tolerance_type {
                tolerance_type_of(item.get("toleranceType"))
            } else {
                None
            };
            Some(PartialCreditRange {
                tolerance: tolerance.max(0.0),
                tolerance_type,
                credit_percent: credit.clamp(0.0, 100.0),
            })
        })
        .collect();
    ranges.sort_by(|a, b| a.tolerance.total_cmp(&b.tolerance));
    ranges
}

fn tolerance_type_of(value: Option<&Value>) -> Option<ToleranceType> {
    match value.and_then(Value::as_str) {
        Some("absolute") => Some(ToleranceType::Absolute),
        Some("percentage") => Some(ToleranceType::Percentage),
        _ => None,
    }
}

fn year_range(config: &Value, answer: &Value, legacy: LegacyFields<'_>) -> QuestionBody {
    let correct_year = number_of(field(answer, &["correctYear", "exactYear", "year"]))
        .or_else(|| number_of(legacy.correct_answer))
        .map(round)
        .unwrap_or(0);

    // A percentage tolerance is fixed to whole years of the correct year.
    let tolerance = number_of(
        field(config, &["tolerance", "toleranceYears"]).or_else(|| field(answer, &["toleranceYears"])),
    )
    .or_else(|| {
        number_of(field(config, &["tolerancePercent"]).or_else(|| field(answer, &["tolerancePercent"])))
            .map(|percent| percent.max(0.0) / 100.0 * (correct_year as f64).abs())
    })
    .map(non_negative_u32);

    QuestionBody::YearRange {
        config: YearRangeConfig {
            tolerance,
            min_year: number_of(field(config, &["minYear", "min"])).map(round),
            max_year: number_of(field(config, &["maxYear", "max"])).map(round),
            placeholder: coerce::string_field(config, "placeholder"),
        },
        answer: YearRangeAnswer {
            correct_year,
            partial_credit_ranges: partial_credit_ranges(answer, false),
        },
    }
}

fn numeric_range(config: &Value, answer: &Value, legacy: LegacyFields<'_>) -> QuestionBody {
    let mut tolerance = number_of(config.get("tolerance"));
    let mut tolerance_type = tolerance_type_of(config.get("toleranceType"));

    let tolerance_percent = number_of(
        field(config, &["tolerancePercent"]).or_else(|| field(answer, &["tolerancePercent"])),
    );
    if tolerance.is_none() && tolerance_percent.is_some() {
        tolerance = tolerance_percent;
        tolerance_type = Some(ToleranceType::Percentage);
    }
    let (tolerance, tolerance_type) = match tolerance {
        Some(t) => (Some(t.max(0.0)), Some(tolerance_type.unwrap_or_default())),
        None => (None, None),
    };

    let correct_value = number_of(field(answer, &["correctValue", "exactValue", "value"]))
        .or_else(|| number_of(legacy.correct_answer))
        .unwrap_or(0.0);

    QuestionBody::NumericRange {
        config: NumericRangeConfig {
            tolerance,
            tolerance_type,
            min: number_of(field(config, &["min", "minValue"])),
            max: number_of(field(config, &["max", "maxValue"])),
            step: number_of(config.get("step")).filter(|s| *s > 0.0),
            unit: coerce::string_field(config, "unit"),
            placeholder: coerce::string_field(config, "placeholder"),
        },
        answer: NumericRangeAnswer {
            correct_value,
            partial_credit_ranges: partial_credit_ranges(answer, true),
        },
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

fn matching(config: &Value, answer: &Value) -> QuestionBody {
    let mut left = unique_strings(to_string_array(field(
        config,
        &["leftColumn", "leftItems", "left"],
    )));
    let mut right = unique_strings(to_string_array(field(
        config,
        &["rightColumn", "rightItems", "right"],
    )));

    if let Some(pairs) = config.get("pairs").and_then(Value::as_array) {
        for pair in pairs {
            if let Some(l) = text_of(field(pair, &["left", "term"])) {
                push_unique(&mut left, l);
            }
            if let Some(r) = text_of(field(pair, &["right", "match", "definition"])) {
                push_unique(&mut right, r);
            }
        }
    }

    let mut correct_pairs: IndexMap<String, String> = IndexMap::new();
    match field(answer, &["correctPairs", "pairs", "matches"]) {
        Some(Value::Array(entries)) => {
            let left_one_based = detect_one_based(entries, 0, left.len());
            let right_one_based = detect_one_based(entries, 1, right.len());
            for entry in entries {
                let (raw_left, raw_right) = match entry.as_array() {
                    Some(tuple) if tuple.len() >= 2 => (Some(&tuple[0]), Some(&tuple[1])),
                    _ => (
                        field(entry, &["left", "leftItem", "from"]),
                        field(entry, &["right", "rightItem", "to"]),
                    ),
                };
                let l = raw_left
                    .and_then(|v| resolve_in_list(v, &left, left_one_based, StringRefs::MayBeIndex));
                let r = raw_right
                    .and_then(|v| resolve_in_list(v, &right, right_one_based, StringRefs::MayBeIndex));
                if let (Some(l), Some(r)) = (l, r) {
                    correct_pairs.insert(l, r);
                }
            }
        }
        Some(Value::Object(map)) => {
            for (raw_left, raw_right) in map {
                let key = Value::String(raw_left.clone());
                let l = resolve_in_list(&key, &left, false, StringRefs::MayBeIndex);
                let r = resolve_in_list(raw_right, &right, false, StringRefs::TextOnly);
                if let (Some(l), Some(r)) = (l, r) {
                    correct_pairs.insert(l, r);
                }
            }
        }
        _ => {}
    }

    if correct_pairs.is_empty() && left.len() == right.len() {
        correct_pairs = left.iter().cloned().zip(right.iter().cloned()).collect();
    }
    for (l, r) in &correct_pairs {
        push_unique(&mut left, l.clone());
        push_unique(&mut right, r.clone());
    }

    QuestionBody::Matching {
        config: MatchingConfig {
            left_column: left,
            right_column: right,
            shuffle_right: coerce::bool_of(config.get("shuffleRight")).unwrap_or(true),
            left_column_label: coerce::string_field(config, "leftColumnLabel"),
            right_column_label: coerce::string_field(config, "rightColumnLabel"),
        },
        answer: MatchingAnswer {
            correct_pairs,
            partial_credit_per_pair: coerce::bool_of(answer.get("partialCreditPerPair"))
                .unwrap_or(true),
        },
    }
}

fn fill_blank(config: &Value, answer: &Value) -> QuestionBody {
    let raw_template = config
        .get("template")
        .and_then(coerce::scalar_text)
        .unwrap_or_default();
    let derived = derive_blanks(
        &raw_template,
        config.get("blanks"),
        field(answer, &["blanks", "correctBlanks"]),
        BlankIdStyle::Question,
    );
    let blanks = derived.answer_map();

    QuestionBody::FillBlank {
        config: FillBlankConfig {
            template: derived.template,
            blanks: derived.blanks,
            case_sensitive: coerce::bool_of(config.get("caseSensitive")).unwrap_or(false),
        },
        answer: FillBlankAnswer { blanks },
    }
}

fn multi_select(config: &Value, answer: &Value) -> QuestionBody {
    let options = unique_strings(to_string_array(field(config, &["options", "choices"])));

    let raw_indices = ["correctIndices", "indices"]
        .iter()
        .find_map(|key| answer.get(*key).and_then(Value::as_array));
    let mut correct_indices: Vec<usize> = Vec::new();
    for value in raw_indices.map(Vec::as_slice).unwrap_or_default() {
        let Some(index) = coerce::to_number(value).map(round) else {
            continue;
        };
        if index >= 0 && (index as usize) < options.len() && !correct_indices.contains(&(index as usize)) {
            correct_indices.push(index as usize);
        }
    }

    if correct_indices.is_empty() {
        if let Some(texts) = answer.get("correctAnswers").filter(|v| v.is_array()) {
            for text in to_string_array(Some(texts)) {
                if let Some(index) = options.iter().position(|o| *o == text) {
                    if !correct_indices.contains(&index) {
                        correct_indices.push(index);
                    }
                }
            }
        }
    }

    QuestionBody::MultiSelect {
        config: MultiSelectConfig {
            options,
            shuffle_options: coerce::bool_of(config.get("shuffleOptions")),
            min_selections: number_of(config.get("minSelections")).map(non_negative_u32),
            max_selections: number_of(config.get("maxSelections")).map(|m| non_negative_u32(m).max(1)),
        },
        answer: MultiSelectAnswer {
            correct_indices,
            partial_credit: coerce::bool_of(answer.get("partialCredit")).unwrap_or(true),
        },
    }
}
