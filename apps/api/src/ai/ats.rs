//! ATS scoring: how well a CV covers the keywords of a job description.
//!
//! Default: `KeywordAtsScorer` (pure Rust, deterministic). Carried in `AppState` as
//! `Arc<dyn AtsScorer>` so a semantic backend can be swapped in without touching the
//! handler.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cv::models::CvDocument;
use crate::cv::sections::{BuiltInSection, SectionKey};
use crate::errors::AppError;

/// Upper bound on keywords taken from one job description.
const MAX_KEYWORDS: usize = 25;

const STOPWORDS: &[&str] = &[
    "a", "about", "across", "all", "also", "an", "and", "any", "are", "as", "at", "be",
    "been", "but", "by", "can", "candidate", "do", "etc", "experience", "for", "from",
    "good", "great", "has", "have", "help", "ideal", "in", "including", "into", "is", "it",
    "its", "join", "job", "knowledge", "least", "like", "looking", "more", "must", "new",
    "not", "of", "on", "or", "other", "our", "per", "plus", "position", "preferred",
    "required", "requirements", "responsibilities", "role", "skills", "strong", "such",
    "team", "than", "that", "the", "their", "them", "they", "this", "to", "us", "using",
    "via", "we", "well", "what", "who", "will", "with", "within", "work", "working",
    "years", "you", "your",
];

const VAGUE_VERBS: &[&str] = &[
    "improved",
    "enhanced",
    "helped",
    "worked on",
    "assisted",
    "supported",
    "participated",
    "involved",
];

const VAGUE_SCALE_WORDS: &[&str] = &[
    "significant",
    "major",
    "large",
    "huge",
    "massive",
    "substantial",
    "considerable",
    "great",
    "many",
    "numerous",
    "various",
    "several",
];

// ────────────────────────────────────────────────────────────────────────────
// Report
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMatch {
    pub keyword: String,
    /// Section key where the keyword was found.
    pub found_in: String,
    pub strength: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordGap {
    pub keyword: String,
    pub jd_frequency: u32,
}

/// An achievement bullet without a quantified outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactGap {
    pub bullet: String,
    pub reason: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsReport {
    pub overall_score: u32,
    pub strong_matches: Vec<KeywordMatch>,
    pub partial_matches: Vec<KeywordMatch>,
    pub gaps: Vec<KeywordGap>,
    pub weak_bullets: Vec<ImpactGap>,
    pub recommendation: String,
    pub scorer_backend: String,
}

#[async_trait]
pub trait AtsScorer: Send + Sync {
    async fn score(&self, doc: &CvDocument, job_description: &str) -> Result<AtsReport, AppError>;
}

pub struct KeywordAtsScorer;

#[async_trait]
impl AtsScorer for KeywordAtsScorer {
    async fn score(&self, doc: &CvDocument, job_description: &str) -> Result<AtsReport, AppError> {
        Ok(compute_keyword_score(doc, job_description))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Keyword extraction
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct JdKeyword {
    pub keyword: String,
    pub frequency: u32,
    pub weighted_score: f32,
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.').to_lowercase())
        .filter(|t| t.chars().count() >= 2)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
}

/// Frequent non-filler terms. Terms in the first third of the text weigh more; that is
/// where postings put their must-haves.
pub fn extract_keywords(job_description: &str) -> Vec<JdKeyword> {
    let tokens: Vec<String> = tokenize(job_description)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect();
    let early = tokens.len().div_ceil(3);

    let mut stats: HashMap<&str, (u32, f32, usize)> = HashMap::new();
    for (position, token) in tokens.iter().enumerate() {
        let weight = if position < early { 1.0 } else { 0.7 };
        let entry = stats.entry(token.as_str()).or_insert((0, 0.0, position));
        entry.0 += 1;
        entry.1 += weight;
    }

    let mut keywords: Vec<(JdKeyword, usize)> = stats
        .into_iter()
        .map(|(keyword, (frequency, weighted_score, first))| {
            (
                JdKeyword {
                    keyword: keyword.to_string(),
                    frequency,
                    weighted_score,
                },
                first,
            )
        })
        .collect();
    keywords.sort_by(|(a, a_first), (b, b_first)| {
        b.weighted_score
            .total_cmp(&a.weighted_score)
            .then(a_first.cmp(b_first))
    });
    keywords
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(k, _)| k)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// Token set per visible section, in render order. Hidden sections do not count.
fn section_tokens(doc: &CvDocument) -> Vec<(String, HashSet<String>)> {
    let mut texts = vec![
        (
            SectionKey::from(BuiltInSection::BasicInfo),
            format!("{} {}", doc.basic_info.role, doc.basic_info.location),
        ),
        (
            SectionKey::from(BuiltInSection::Summary),
            doc.summary.content.clone(),
        ),
    ];

    let experiences = doc
        .experiences
        .iter()
        .map(|e| {
            let bullets: Vec<String> = e.achievements.iter().map(|a| a.to_plain_text()).collect();
            format!("{} {} {}", e.role, e.company, bullets.join(" "))
        })
        .collect::<Vec<_>>()
        .join(" ");
    texts.push((SectionKey::from(BuiltInSection::Experiences), experiences));

    let education = doc
        .education
        .iter()
        .map(|e| format!("{} {}", e.degree, e.institute))
        .collect::<Vec<_>>()
        .join(" ");
    texts.push((SectionKey::from(BuiltInSection::Education), education));

    let projects = doc
        .projects
        .iter()
        .map(|p| format!("{} {} {}", p.name, p.company, p.details.join(" ")))
        .collect::<Vec<_>>()
        .join(" ");
    texts.push((SectionKey::from(BuiltInSection::Projects), projects));

    for (key, items) in &doc.custom_sections {
        let text = items
            .iter()
            .map(|i| format!("{} {}", i.title, i.details))
            .collect::<Vec<_>>()
            .join(" ");
        texts.push((SectionKey::Custom(key.clone()), text));
    }

    let config = doc.section_config();
    texts
        .into_iter()
        .filter(|(key, _)| config.is_visible(key))
        .map(|(key, text)| (key.to_string(), tokenize(&text).collect()))
        .collect()
}

pub fn compute_keyword_score(doc: &CvDocument, job_description: &str) -> AtsReport {
    let keywords = extract_keywords(job_description);
    let weak_bullets = check_impact(doc);

    if keywords.is_empty() {
        return AtsReport {
            overall_score: 0,
            strong_matches: vec![],
            partial_matches: vec![],
            gaps: vec![],
            weak_bullets,
            recommendation: "No keywords found in the job description, cannot score.".to_string(),
            scorer_backend: "keyword".to_string(),
        };
    }

    let skills_visible = doc
        .section_config()
        .is_visible(&SectionKey::from(BuiltInSection::Skills));
    let skill_tokens: HashSet<String> = doc
        .skills
        .iter()
        .filter(|_| skills_visible)
        .flat_map(|s| tokenize(&s.title).chain(tokenize(&s.details)).collect::<Vec<_>>())
        .collect();
    let sections = section_tokens(doc);

    let mut strong_matches = Vec::new();
    let mut partial_matches = Vec::new();
    let mut gaps = Vec::new();
    let mut total_weighted = 0.0_f32;
    let mut total_score = 0.0_f32;

    for kw in &keywords {
        total_weighted += kw.weighted_score;

        // skills listing → 1.0, mentioned elsewhere → 0.6
        let found = if skill_tokens.contains(&kw.keyword) {
            Some(("skills".to_string(), 1.0_f32))
        } else {
            sections
                .iter()
                .find(|(_, tokens)| tokens.contains(&kw.keyword))
                .map(|(key, _)| (key.clone(), 0.6))
        };

        match found {
            Some((found_in, strength)) => {
                total_score += strength * kw.weighted_score;
                let m = KeywordMatch {
                    keyword: kw.keyword.clone(),
                    found_in,
                    strength,
                };
                if strength >= 0.8 {
                    strong_matches.push(m);
                } else {
                    partial_matches.push(m);
                }
            }
            None => gaps.push(KeywordGap {
                keyword: kw.keyword.clone(),
                jd_frequency: kw.frequency,
            }),
        }
    }

    let overall_score = if total_weighted > 0.0 {
        ((total_score / total_weighted) * 100.0).round() as u32
    } else {
        0
    };

    AtsReport {
        overall_score,
        recommendation: build_recommendation(overall_score, &gaps, weak_bullets.len()),
        strong_matches,
        partial_matches,
        gaps,
        weak_bullets,
        scorer_backend: "keyword".to_string(),
    }
}

fn build_recommendation(score: u32, gaps: &[KeywordGap], weak_bullets: usize) -> String {
    let top_gaps: Vec<&str> = gaps.iter().take(3).map(|g| g.keyword.as_str()).collect();

    let mut recommendation = if score >= 80 {
        "Strong match. Your CV covers the key terms of this job description.".to_string()
    } else if score >= 60 {
        format!(
            "Moderate match ({score}/100). Consider mentioning: {}.",
            top_gaps.join(", ")
        )
    } else {
        format!(
            "Low match ({score}/100). Missing key terms: {}. Tailor your skills and summary to the posting.",
            top_gaps.join(", ")
        )
    };
    if weak_bullets > 0 {
        recommendation.push_str(&format!(
            " {weak_bullets} achievement(s) lack a measurable result."
        ));
    }
    recommendation
}

// ────────────────────────────────────────────────────────────────────────────
// Impact check
// ────────────────────────────────────────────────────────────────────────────

/// Returns why `text` reads as unquantified, or `None` when it carries a metric
/// (a digit, %, or currency sign).
pub fn impact_gap(text: &str) -> Option<ImpactGap> {
    let quantified = text
        .chars()
        .any(|c| c.is_ascii_digit() || matches!(c, '%' | '$' | '€' | '£'));
    if quantified || text.trim().is_empty() {
        return None;
    }

    let lower = text.to_lowercase();
    if let Some(vague) = VAGUE_VERBS.iter().find(|v| lower.contains(*v)) {
        return Some(ImpactGap {
            bullet: text.to_string(),
            reason: format!("Contains vague verb '{vague}' without quantified impact"),
            suggestion: format!("Add a metric: '{vague}' by how much, or what changed as a result"),
        });
    }
    if let Some(vague) = VAGUE_SCALE_WORDS.iter().find(|v| lower.contains(*v)) {
        return Some(ImpactGap {
            bullet: text.to_string(),
            reason: format!("Uses vague scale word '{vague}' without a number"),
            suggestion: format!("Replace '{vague}' with a specific number: e.g. '5x', '40%', '3 weeks'"),
        });
    }
    Some(ImpactGap {
        bullet: text.to_string(),
        reason: "No quantified outcome found".to_string(),
        suggestion: "Add a specific number, percentage, or time metric".to_string(),
    })
}

fn check_impact(doc: &CvDocument) -> Vec<ImpactGap> {
    doc.experiences
        .iter()
        .flat_map(|e| e.achievements.iter())
        .filter_map(|a| impact_gap(&a.to_plain_text()))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
