//! The `assessly init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("assessly.toml").exists() {
        println!("assessly.toml already exists, skipping.");
    } else {
        std::fs::write("assessly.toml", SAMPLE_CONFIG)?;
        println!("Created assessly.toml");
    }

    std::fs::create_dir_all("assessments")?;
    let example_path = Path::new("assessments/example.toml");
    if example_path.exists() {
        println!("assessments/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_ASSESSMENT)?;
        println!("Created assessments/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: assessly validate --assessment assessments/example.toml");
    println!("  2. Run: assessly take --assessment example");
    println!("  3. Run: assessly submissions");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# assessly configuration

user_id = "local-user"
# How the local backend marks short answers: "manual" or "exact-match".
short_answer_policy = "manual"

[backend]
type = "local"
assessments_dir = "./assessments"
submissions_file = "./assessly-submissions.json"

# To use a hosted platform instead:
# [backend]
# type = "http"
# base_url = "https://learn.example.com/api"
# access_token = "${ASSESSLY_ACCESS_TOKEN}"
# timeout_secs = 30
"#;

const EXAMPLE_ASSESSMENT: &str = r#"[assessment]
id = "assessment:example"
title = "Example Assessment"
description = "A short quiz to try assessly"
category = "General"
duration_minutes = 5

[[questions]]
id = "q1"
type = "multiple-choice"
prompt = "Which planet is closest to the sun?"
options = ["Venus", "Mercury", "Mars"]
correct_answer = 1

[[questions]]
id = "q2"
type = "multiple-choice"
prompt = "What is 7 x 6?"
options = ["42", "36", "48"]
correct_answer = 0

[[questions]]
id = "q3"
type = "short-answer"
prompt = "Name the process plants use to turn light into energy."
correct_answer = "photosynthesis"
points = 2
"#;
