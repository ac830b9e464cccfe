//! The `quizgrade init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizgrade.toml").exists() {
        println!("quizgrade.toml already exists, skipping.");
    } else {
        std::fs::write("quizgrade.toml", SAMPLE_CONFIG)?;
        println!("Created quizgrade.toml");
    }

    std::fs::create_dir_all("quizzes")?;
    let example_path = std::path::Path::new("quizzes/example.toml");
    if example_path.exists() {
        println!("quizzes/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_QUIZ)?;
        println!("Created quizzes/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit quizgrade.toml to set your grading defaults");
    println!("  2. Run: quizgrade check --quiz quizzes/example.toml");
    println!("  3. Run: quizgrade grade --quiz quizzes/example.toml --attempts attempts/");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizgrade configuration

parallelism = 4
output_dir = "./quizgrade-results"
show_point_values = true

[grading]
grading_type = "percentage"
pass_threshold = 60
partial_credit_enabled = true
"#;

const EXAMPLE_QUIZ: &str = r#"[quiz]
id = "example"
name = "Example Quiz"
description = "A short quiz showing the supported question types"

[grading]
grading_type = "letter"
pass_threshold = 70

[[questions]]
id = "capital"
question = "What is the capital of France?"
type = "multiple_choice"

[questions.config]
options = ["Berlin", "Paris", "Madrid"]

[questions.answer]
correctIndex = 1

[[questions]]
id = "moon_landing"
question = "In which year did Apollo 11 land on the Moon?"
type = "year_range"
points = 2

[questions.config]
toleranceYears = 5

[questions.answer]
correctYear = 1969

[[questions]]
id = "elements"
question = "Match each formula with its name."
type = "matching"
points = 2

[questions.config]
leftColumn = ["H2O", "NaCl"]
rightColumn = ["Water", "Salt"]

[questions.answer]
correctPairs = [[0, 0], [1, 1]]

[[questions]]
id = "primes"
question = "Select every prime number."
type = "multi_select"

[questions.config]
options = ["2", "4", "5", "9"]

[questions.answer]
correctIndices = [0, 2]

[[questions]]
id = "seasoning"
question = "Complete the phrase."
type = "fill_blank"

[questions.config]
template = "{{blank}} and {{blank}}"

[questions.answer.blanks]
blank_0 = ["salt", "Salt"]
blank_1 = ["pepper"]
"#;
