// src/engine/sampler.rs

use std::cmp::Ordering;
use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

/// Ranking tier of a skill on a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportanceLevel {
    Critical,
    Important,
    Helpful,
}

impl ImportanceLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "critical" => Some(ImportanceLevel::Critical),
            "important" => Some(ImportanceLevel::Important),
            "helpful" => Some(ImportanceLevel::Helpful),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportanceLevel::Critical => "critical",
            ImportanceLevel::Important => "important",
            ImportanceLevel::Helpful => "helpful",
        }
    }

    fn priority(&self) -> u8 {
        match self {
            ImportanceLevel::Critical => 0,
            ImportanceLevel::Important => 1,
            ImportanceLevel::Helpful => 2,
        }
    }
}

/// One required skill of a job, as ranked by the employer.
#[derive(Debug, Clone)]
pub struct RankedSkill {
    pub skill_id: Uuid,
    pub name: String,
    pub importance_level: ImportanceLevel,
    pub weight: f64,
}

/// Picks the skills an assessment will test.
///
/// Only `critical` and `important` skills qualify; critical outranks
/// important, ties break by descending weight, and at most `max_skills`
/// survive. Keeps assessments bounded while testing the skills that matter
/// most first.
pub fn select_top_skills(skills: Vec<RankedSkill>, max_skills: usize) -> Vec<RankedSkill> {
    let mut eligible: Vec<RankedSkill> = skills
        .into_iter()
        .filter(|s| {
            matches!(
                s.importance_level,
                ImportanceLevel::Critical | ImportanceLevel::Important
            )
        })
        .collect();

    eligible.sort_by(|a, b| {
        a.importance_level
            .priority()
            .cmp(&b.importance_level.priority())
            .then_with(|| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal))
    });

    eligible.truncate(max_skills);
    eligible
}

/// Samples `count` questions uniformly without replacement, preferring
/// questions the user has not seen.
///
/// If the unseen pool cannot cover `count`, previously seen questions top up
/// the result: an assessment must never come up short because of the
/// anti-repeat policy. Returns fewer than `count` only when the whole bank
/// is smaller than `count`.
pub fn sample_questions<T, F, R>(
    candidates: Vec<T>,
    seen: &HashSet<Uuid>,
    count: usize,
    id_of: F,
    rng: &mut R,
) -> Vec<T>
where
    F: Fn(&T) -> Uuid,
    R: Rng + ?Sized,
{
    let (mut unseen, mut repeats): (Vec<T>, Vec<T>) = candidates
        .into_iter()
        .partition(|q| !seen.contains(&id_of(q)));

    unseen.shuffle(rng);
    if unseen.len() >= count {
        unseen.truncate(count);
        return unseen;
    }

    // Anti-repeat exhausted the unseen pool: fall back to repeats for this
    // skill only, rather than returning too few questions.
    repeats.shuffle(rng);
    let mut picked = unseen;
    for question in repeats {
        if picked.len() >= count {
            break;
        }
        picked.push(question);
    }
    picked
}
