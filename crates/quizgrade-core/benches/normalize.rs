use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizgrade_core::model::QuestionTypeSlug;
use quizgrade_core::normalize::{normalize_question, normalize_step};
use quizgrade_core::template::parse_template;
use serde_json::json;

fn bench_normalize_question(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_question");

    let matching_config = json!({
        "leftColumn": ["H2O", "NaCl", "CO2", "O2", "N2"],
        "rightColumn": ["Water", "Salt", "Carbon dioxide", "Oxygen", "Nitrogen"]
    });
    let matching_answer = json!({"correctPairs": [[1, 1], [2, 2], [3, 3], [4, 4], [5, 5]]});

    let fill_config = json!({"template": "The {{blank}} sat on the {{blank}} near the {{blank}}."});
    let fill_answer = json!({"blanks": {"blank_0": ["cat"], "blank_1": ["mat", "rug"], "blank_2": ["door"]}});

    let numeric_config = json!({"tolerancePercent": 5, "unit": "m/s"});
    let numeric_answer = json!({"correctValue": "299792458"});

    group.bench_function("matching", |b| {
        b.iter(|| {
            normalize_question(
                QuestionTypeSlug::Matching,
                black_box(&matching_config),
                black_box(&matching_answer),
            )
        })
    });

    group.bench_function("fill_blank", |b| {
        b.iter(|| {
            normalize_question(
                QuestionTypeSlug::FillBlank,
                black_box(&fill_config),
                black_box(&fill_answer),
            )
        })
    });

    group.bench_function("numeric_range", |b| {
        b.iter(|| {
            normalize_question(
                QuestionTypeSlug::NumericRange,
                black_box(&numeric_config),
                black_box(&numeric_answer),
            )
        })
    });

    group.finish();
}

fn bench_normalize_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_step");

    let drag_content = json!({
        "leftItems": ["Mitochondria", "Ribosome", "Nucleus", "Golgi"],
        "rightItems": ["Energy", "Proteins", "DNA", "Packaging"]
    });
    let drag_answer = json!({"correctPairs": {"0": "Energy", "1": "Proteins", "Nucleus": "DNA", "3": 3}});

    let blanks_content = json!({
        "text": "{{blank}} is the capital of {{blank}}.",
        "blanks": [{"answers": ["Paris"]}, {"answers": ["France", "france"]}]
    });
    let blanks_answer = json!({});

    group.bench_function("drag_match", |b| {
        b.iter(|| normalize_step("drag_match", black_box(&drag_content), black_box(&drag_answer)))
    });

    group.bench_function("fill_blanks", |b| {
        b.iter(|| {
            normalize_step(
                "fill_blanks",
                black_box(&blanks_content),
                black_box(&blanks_answer),
            )
        })
    });

    group.finish();
}

fn bench_parse_template(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_template");

    let small = "The {{blank}} jumped over the {{blank}}.";
    let known: Vec<String> = (0..50).map(|i| format!("b{i}")).collect();
    let large = {
        let mut s = String::new();
        for i in 0..50 {
            s.push_str(&format!("Sentence {i} has {{{{b{i}}}}} and a {{{{blank}}}}. "));
        }
        s
    };

    group.bench_function("two_generic", |b| {
        b.iter(|| parse_template(black_box(small), black_box(&[])))
    });

    group.bench_function("100_markers", |b| {
        b.iter(|| parse_template(black_box(&large), black_box(&known)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_normalize_question,
    bench_normalize_step,
    bench_parse_template
);
criterion_main!(benches);
