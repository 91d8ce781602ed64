//! ATS scoring: pluggable, trait-based scorer for an uploaded resume.
//!
//! `AppState` holds an `Arc<dyn ResumeScorer>`, picked at startup from
//! `RESUME_SCORER`. The default `MockAtsScorer` ignores the document and
//! returns a fixed breakdown.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::AppError;
use crate::resume::quantification::{bullets, review_bullet};

/// Text extracted from an upload plus the optional job description.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub text: String,
    pub job_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AtsCategory {
    pub name: String,
    /// 0 – 100
    pub score: u32,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AtsReport {
    /// 0 – 100
    pub overall_score: u32,
    pub breakdown: Vec<AtsCategory>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub suggestions: Vec<String>,
    pub scorer_backend: String,
}

#[async_trait]
pub trait ResumeScorer: Send + Sync {
    async fn score(&self, document: &ResumeDocument) -> Result<AtsReport, AppError>;
}

fn category(name: &str, score: u32, feedback: &str) -> AtsCategory {
    AtsCategory {
        name: name.to_string(),
        score,
        feedback: feedback.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MockAtsScorer
// ────────────────────────────────────────────────────────────────────────────

/// Returns the same report for every document.
pub struct MockAtsScorer;

#[async_trait]
impl ResumeScorer for MockAtsScorer {
    async fn score(&self, _document: &ResumeDocument) -> Result<AtsReport, AppError> {
        Ok(AtsReport {
            overall_score: 78,
            breakdown: vec![
                category("formatting", 85, "Clean layout with consistent headings."),
                category("keywords", 72, "Add more role-specific keywords."),
                category("experience", 80, "Experience section is well structured."),
                category("education", 90, "Education details are complete."),
                category("skills", 65, "List tools and frameworks explicitly."),
            ],
            matched_keywords: vec![
                "javascript".to_string(),
                "react".to_string(),
                "node.js".to_string(),
            ],
            missing_keywords: vec!["docker".to_string(), "aws".to_string()],
            suggestions: vec![
                "Quantify achievements with numbers where possible.".to_string(),
                "Tailor the summary to the target role.".to_string(),
            ],
            scorer_backend: "mock".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordAtsScorer
// ────────────────────────────────────────────────────────────────────────────

const SECTIONS: &[(&str, &[&str])] = &[
    ("experience", &["experience", "employment", "work history", "internship"]),
    ("education", &["education", "academics"]),
    ("skills", &["skills", "technologies", "tech stack"]),
    ("projects", &["projects"]),
    ("summary", &["summary", "objective", "profile"]),
];

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "is",
    "it", "of", "on", "or", "our", "the", "to", "we", "will", "with", "you", "your", "this",
    "that", "who", "work", "team", "role", "years", "experience", "strong", "good", "ability",
];

/// Most frequent job-description terms considered for coverage.
const MAX_JD_KEYWORDS: usize = 20;

const IDEAL_WORDS: std::ops::RangeInclusive<usize> = 300..=800;

/// Deterministic scorer: section presence, quantified bullets, length and
/// job-description keyword coverage.
///
/// Weights: sections 25, impact 25, length 15, keywords 35. Without a job
/// description the keyword category is omitted and the rest renormalized.
pub struct KeywordAtsScorer;

#[async_trait]
impl ResumeScorer for KeywordAtsScorer {
    async fn score(&self, document: &ResumeDocument) -> Result<AtsReport, AppError> {
        Ok(compute_keyword_report(document))
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.').to_lowercase())
        .filter(|t| t.len() >= 2 && !t.chars().all(|c| c.is_ascii_digit()))
}

/// Ranked by frequency, ties broken alphabetically.
fn jd_keywords(jd: &str) -> Vec<String> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for token in tokens(jd).filter(|t| !STOPWORDS.contains(&t.as_str())) {
        *counts.entry(token).or_default() += 1;
    }
    let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(MAX_JD_KEYWORDS)
        .map(|(k, _)| k)
        .collect()
}

fn score_sections(lowered: &str, suggestions: &mut Vec<String>) -> AtsCategory {
    let missing: Vec<&str> = SECTIONS
        .iter()
        .filter(|(_, aliases)| !aliases.iter().any(|a| lowered.contains(a)))
        .map(|(name, _)| *name)
        .collect();
    let found = SECTIONS.len() - missing.len();
    let score = (found * 100 / SECTIONS.len()) as u32;

    let feedback = if missing.is_empty() {
        "All standard sections present.".to_string()
    } else {
        suggestions.push(format!("Add a section for: {}.", missing.join(", ")));
        format!("Missing sections: {}.", missing.join(", "))
    };
    AtsCategory {
        name: "sections".to_string(),
        score,
        feedback,
    }
}

fn score_impact(text: &str, suggestions: &mut Vec<String>) -> AtsCategory {
    let reviews: Vec<_> = bullets(text).map(review_bullet).collect();
    if reviews.is_empty() {
        suggestions.push("Describe your work as bullet points.".to_string());
        return category("impact", 0, "No bullet points found.");
    }

    let quantified = reviews.iter().filter(|r| r.quantified).count();
    let score = (quantified * 100 / reviews.len()) as u32;

    let vague: BTreeSet<&str> = reviews.iter().filter_map(|r| r.vague_term).collect();
    if !vague.is_empty() {
        suggestions.push(format!(
            "Replace vague wording ({}) with measurable results.",
            vague.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    AtsCategory {
        name: "impact".to_string(),
        score,
        feedback: format!("{quantified} of {} bullets are quantified.", reviews.len()),
    }
}

fn score_length(words: usize, suggestions: &mut Vec<String>) -> AtsCategory {
    let score = if IDEAL_WORDS.contains(&words) {
        100
    } else if words < *IDEAL_WORDS.start() {
        (words * 100 / IDEAL_WORDS.start()) as u32
    } else {
        let over = words - IDEAL_WORDS.end();
        100u32.saturating_sub((over / 10) as u32).max(40)
    };

    if words < *IDEAL_WORDS.start() {
        suggestions.push("Expand the resume with more detail on your work.".to_string());
    } else if words > *IDEAL_WORDS.end() {
        suggestions.push("Trim the resume to the most relevant content.".to_string());
    }
    AtsCategory {
        name: "length".to_string(),
        score,
        feedback: format!("{words} words."),
    }
}

fn compute_keyword_report(document: &ResumeDocument) -> AtsReport {
    let lowered = document.text.to_lowercase();
    let resume_tokens: BTreeSet<String> = tokens(&document.text).collect();
    let word_count = document.text.split_whitespace().count();
    let mut suggestions = Vec::new();

    let mut weighted = vec![
        (score_sections(&lowered, &mut suggestions), 25u32),
        (score_impact(&document.text, &mut suggestions), 25),
        (score_length(word_count, &mut suggestions), 15),
    ];

    let mut matched_keywords = Vec::new();
    let mut missing_keywords = Vec::new();
    if let Some(jd) = document.job_description.as_deref() {
        let keywords = jd_keywords(jd);
        if !keywords.is_empty() {
            for keyword in keywords {
                if resume_tokens.contains(&keyword) {
                    matched_keywords.push(keyword);
                } else {
                    missing_keywords.push(keyword);
                }
            }
            let total = matched_keywords.len() + missing_keywords.len();
            let score = (matched_keywords.len() * 100 / total) as u32;
            if !missing_keywords.is_empty() {
                suggestions.push(format!(
                    "Consider covering: {}.",
                    missing_keywords
                        .iter()
                        .take(5)
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
            weighted.push((
                AtsCategory {
                    name: "keywords".to_string(),
                    score,
                    feedback: format!(
                        "{} of {total} job description keywords found.",
                        matched_keywords.len()
                    ),
                },
                35,
            ));
        }
    }

    let total_weight: u32 = weighted.iter().map(|(_, w)| w).sum();
    let weighted_sum: u32 = weighted.iter().map(|(c, w)| c.score * w).sum();
    let overall_score = (weighted_sum as f32 / total_weight as f32).round() as u32;

    AtsReport {
        overall_score,
        breakdown: weighted.into_iter().map(|(c, _)| c).collect(),
        matched_keywords,
        missing_keywords,
        suggestions,
        scorer_backend: "keyword".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "\
SUMMARY
Backend engineer focused on Rust and PostgreSQL services.

EXPERIENCE
Acme Corp, Software Engineer
- Reduced API latency by 35% by rewriting the cache layer in Rust
- Helped the team with various migrations
- Owned the PostgreSQL upgrade for 12 services

EDUCATION
B.Tech Computer Science, 2021

SKILLS
Rust, PostgreSQL, Docker, Kubernetes

PROJECTS
- Built a chat relay handling 2k concurrent sockets
";

    fn doc(text: &str, jd: Option<&str>) -> ResumeDocument {
        ResumeDocument {
            text: text.to_string(),
            job_description: jd.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_mock_scorer_is_fixed() {
        let a = MockAtsScorer.score(&doc("anything", None)).await.unwrap();
        let b = MockAtsScorer.score(&doc(RESUME, Some("Rust"))).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.overall_score, 78);
        assert_eq!(a.scorer_backend, "mock");
        assert_eq!(a.breakdown.len(), 5);
    }

    #[tokio::test]
    async fn test_keyword_scorer_without_jd_omits_keywords() {
        let report = KeywordAtsScorer.score(&doc(RESUME, None)).await.unwrap();
        let names: Vec<_> = report.breakdown.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["sections", "impact", "length"]);
        assert_eq!(report.breakdown[0].score, 100);
        // 3 of 4 bullets carry numbers.
        assert_eq!(report.breakdown[1].score, 75);
        assert!(report.matched_keywords.is_empty());
        assert!(report.suggestions.iter().any(|s| s.contains("helped")));
    }

    #[tokio::test]
    async fn test_keyword_coverage_against_jd() {
        let jd = "Rust engineer. Rust, PostgreSQL and Kafka required. Kafka streaming.";
        let report = KeywordAtsScorer.score(&doc(RESUME, Some(jd))).await.unwrap();
        assert!(report.matched_keywords.contains(&"rust".to_string()));
        assert!(report.matched_keywords.contains(&"postgresql".to_string()));
        assert!(report.missing_keywords.contains(&"kafka".to_string()));
        assert_eq!(report.scorer_backend, "keyword");
        assert_eq!(report.breakdown.last().unwrap().name, "keywords");
    }

    #[tokio::test]
    async fn test_empty_structure_scores_low() {
        let report = KeywordAtsScorer
            .score(&doc("just some words here", None))
            .await
            .unwrap();
        assert_eq!(report.breakdown[0].score, 0);
        assert_eq!(report.breakdown[1].score, 0);
        assert!(report.overall_score < 10);
    }

    #[test]
    fn test_jd_keywords_ranked_by_frequency() {
        let keywords = jd_keywords("kafka rust rust the and go kafka rust");
        assert_eq!(keywords, vec!["rust", "kafka", "go"]);
    }

    #[test]
    fn test_length_scoring_bands() {
        let mut s = Vec::new();
        assert_eq!(score_length(500, &mut s).score, 100);
        assert_eq!(score_length(150, &mut s).score, 50);
        assert_eq!(score_length(1000, &mut s).score, 80);
        assert_eq!(score_length(5000, &mut s).score, 40);
    }
}
