// src/engine/scoring.rs

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::config::{
    CLOSE_GAPS_THRESHOLD, CUSTOM_BUILDING_OFFSET, DEFAULT_BUILDING_THRESHOLD,
    DEFAULT_PROFICIENT_THRESHOLD, DEFAULT_QUESTION_IMPORTANCE, ROLE_READY_THRESHOLD,
};

/// Band derived from a skill score and the applicable proficiency threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Proficient,
    Building,
    NeedsDev,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Proficient => "proficient",
            Band::Building => "building",
            Band::NeedsDev => "needs_dev",
        }
    }
}

/// Overall readiness classification for one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTag {
    RoleReady,
    CloseGaps,
    NeedsDevelopment,
}

impl StatusTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTag::RoleReady => "role_ready",
            StatusTag::CloseGaps => "close_gaps",
            StatusTag::NeedsDevelopment => "needs_development",
        }
    }
}

/// One answered question, reduced to what scoring needs.
///
/// `skill_id` is None for responses whose section was never bound to a
/// skill (legacy sections); those are still scored as their own group but
/// cannot be named in the summary.
#[derive(Debug, Clone)]
pub struct ScoredResponse {
    pub skill_id: Option<Uuid>,
    pub is_correct: bool,
    pub importance: Option<f64>,
}

/// Per-skill result of the weighted scoring pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillScore {
    pub skill_id: Option<Uuid>,
    /// Plain percent-correct, kept for diagnostics/logging only.
    pub raw_score: f64,
    /// Importance-weighted percentage; authoritative for bands and readiness.
    pub weighted_score: f64,
    pub answered: usize,
    pub correct: usize,
}

fn importance_weight(importance: Option<f64>) -> f64 {
    importance
        .filter(|w| *w > 0.0)
        .unwrap_or(DEFAULT_QUESTION_IMPORTANCE)
}

/// Computes the weighted score per skill.
///
/// For each skill: sum of importance weights of correct answers over the sum
/// of importance weights of all answered questions, times 100. A skill with
/// zero answered questions simply never forms a group, so it can never
/// contribute a phantom 0% to the overall mean.
pub fn score_skills(responses: &[ScoredResponse]) -> Vec<SkillScore> {
    let mut groups: BTreeMap<Option<Uuid>, Vec<&ScoredResponse>> = BTreeMap::new();
    for response in responses {
        groups.entry(response.skill_id).or_default().push(response);
    }

    groups
        .into_iter()
        .map(|(skill_id, group)| {
            let mut total_weight = 0.0;
            let mut correct_weight = 0.0;
            let mut correct = 0usize;

            for response in &group {
                let weight = importance_weight(response.importance);
                total_weight += weight;
                if response.is_correct {
                    correct_weight += weight;
                    correct += 1;
                }
            }

            let raw_score = (correct as f64 / group.len() as f64) * 100.0;
            let weighted_score = if total_weight > 0.0 {
                ((correct_weight / total_weight) * 100.0).min(100.0)
            } else {
                raw_score
            };

            SkillScore {
                skill_id,
                raw_score,
                weighted_score,
                answered: group.len(),
                correct,
            }
        })
        .collect()
}

/// Derives the band for a score given an optional job-specific threshold.
///
/// With a custom threshold, the building bound is `custom - 20`; otherwise
/// the defaults 80/60 apply. Pure function of (score, threshold).
pub fn band_for(score: f64, custom_threshold: Option<f64>) -> Band {
    let proficient_threshold = custom_threshold.unwrap_or(DEFAULT_PROFICIENT_THRESHOLD);
    let building_threshold = match custom_threshold {
        Some(threshold) => threshold - CUSTOM_BUILDING_OFFSET,
        None => DEFAULT_BUILDING_THRESHOLD,
    };

    if score >= proficient_threshold {
        Band::Proficient
    } else if score >= building_threshold {
        Band::Building
    } else {
        Band::NeedsDev
    }
}

/// Arithmetic mean of the per-skill weighted scores.
/// Returns None when no skill was scored, so callers can surface a distinct
/// no-data condition instead of a 0%.
pub fn overall_readiness(scores: &[SkillScore]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: f64 = scores.iter().map(|s| s.weighted_score).sum();
    Some(sum / scores.len() as f64)
}

pub fn status_tag(overall_proficiency: f64) -> StatusTag {
    if overall_proficiency >= ROLE_READY_THRESHOLD {
        StatusTag::RoleReady
    } else if overall_proficiency >= CLOSE_GAPS_THRESHOLD {
        StatusTag::CloseGaps
    } else {
        StatusTag::NeedsDevelopment
    }
}

/// Human-readable readiness label reported alongside the status tag.
/// A candidate with open critical gaps never reads as ready regardless of
/// the overall number.
pub fn readiness_level(overall_proficiency: f64, critical_gap_count: usize) -> &'static str {
    if overall_proficiency >= 90.0 && critical_gap_count == 0 {
        "Highly Qualified"
    } else if overall_proficiency >= 75.0 && critical_gap_count == 0 {
        "Ready"
    } else if overall_proficiency >= 60.0 {
        "Developing"
    } else {
        "Not Ready"
    }
}

/// A scored skill with its display name resolved, ready for classification.
#[derive(Debug, Clone)]
pub struct BandedSkill {
    pub skill_name: String,
    pub score: f64,
    pub band: Band,
}

/// Actionable breakdown of an analyzed assessment.
#[derive(Debug, Clone)]
pub struct ReadinessSummary {
    pub overall_proficiency: f64,
    pub status: StatusTag,
    pub strength_areas: Vec<String>,
    pub development_areas: Vec<String>,
    pub critical_gaps: Vec<String>,
    pub next_steps: Vec<String>,
}

/// Classifies banded skills into strengths, development areas and critical
/// gaps, and derives recommendation strings.
pub fn summarize(overall_proficiency: f64, banded: &[BandedSkill]) -> ReadinessSummary {
    let strength_areas: Vec<String> = banded
        .iter()
        .filter(|s| s.band == Band::Proficient)
        .map(|s| s.skill_name.clone())
        .collect();

    let development_areas: Vec<String> = banded
        .iter()
        .filter(|s| s.band == Band::Building)
        .map(|s| s.skill_name.clone())
        .collect();

    let critical_gaps: Vec<String> = banded
        .iter()
        .filter(|s| s.band == Band::NeedsDev)
        .map(|s| s.skill_name.clone())
        .collect();

    let mut next_steps = Vec::new();
    if !critical_gaps.is_empty() {
        next_steps.push(format!(
            "Focus on critical skills: {}",
            critical_gaps
                .iter()
                .take(2)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if !development_areas.is_empty() {
        next_steps.push(format!(
            "Strengthen developing skills: {}",
            development_areas
                .iter()
                .take(2)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if overall_proficiency < CLOSE_GAPS_THRESHOLD {
        next_steps
            .push("Consider foundational training programs to build core competencies".to_string());
    } else if overall_proficiency < ROLE_READY_THRESHOLD {
        next_steps
            .push("Focus on targeted skill development to reach role-ready status".to_string());
    } else {
        next_steps.push("Fine-tune advanced skills to stay role-ready".to_string());
    }

    ReadinessSummary {
        overall_proficiency,
        status: status_tag(overall_proficiency),
        strength_areas,
        development_areas,
        critical_gaps,
        next_steps,
    }
}
