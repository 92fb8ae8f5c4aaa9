//! Synthetic question catalog for simulations.

use examdrill_core::domains::{Domain, DomainTable};
use examdrill_core::model::{Choice, ExamPart, Question, MAX_LEVEL, MIN_LEVEL};

/// Questions generated per subcategory and level.
const PER_LEVEL: usize = 3;

const CHOICE_IDS: [&str; 4] = ["a", "b", "c", "d"];

/// Subcategories that appear in part B.
const PART_B_SUBCATEGORIES: [&str; 2] = ["algorithm-programming", "security"];

/// Build a catalog covering every subcategory in `domains` at every level.
///
/// Part B subcategories get both part A and part B questions.
pub fn synthetic_catalog(domains: &DomainTable) -> Vec<Question> {
    let mut catalog = Vec::new();
    for (subcategory, domain) in &domains.subcategories {
        for level in MIN_LEVEL..=MAX_LEVEL {
            for n in 0..PER_LEVEL {
                catalog.push(make_question(subcategory, *domain, ExamPart::PartA, level, n));
                if PART_B_SUBCATEGORIES.contains(&subcategory.as_str()) {
                    catalog.push(make_question(subcategory, *domain, ExamPart::PartB, level, n));
                }
            }
        }
    }
    catalog
}

fn make_question(
    subcategory: &str,
    domain: Domain,
    part: ExamPart,
    level: u8,
    n: usize,
) -> Question {
    let correct = (usize::from(level) + n) % CHOICE_IDS.len();
    let mut content = serde_json::Map::new();
    content.insert(
        "question".into(),
        format!("{subcategory} L{level} #{n} ({part})").into(),
    );

    Question {
        question_id: format!("{part}-{subcategory}-{level:02}-{n}"),
        exam_type: part,
        category: domain_label(domain).to_string(),
        subcategory: subcategory.to_string(),
        level,
        choices: CHOICE_IDS
            .iter()
            .enumerate()
            .map(|(i, id)| Choice {
                id: id.to_string(),
                is_correct: i == correct,
                content: serde_json::Map::new(),
            })
            .collect(),
        content,
    }
}

fn domain_label(domain: Domain) -> &'static str {
    match domain {
        Domain::Technology => "テクノロジ系",
        Domain::Management => "マネジメント系",
        Domain::Strategy => "ストラテジ系",
    }
}

/// The correct choice id of `question`, and one wrong one.
pub fn answer_keys(question: &Question) -> (Option<&str>, Option<&str>) {
    let correct = question.choices.iter().find(|c| c.is_correct);
    let wrong = question.choices.iter().find(|c| !c.is_correct);
    (correct.map(|c| c.id.as_str()), wrong.map(|c| c.id.as_str()))
}
