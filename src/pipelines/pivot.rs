//! Pivot planning: when no family serves a pair directly, find the best
//! two-hop path through an intermediary language.
//!
//! The planner is pure: the same pair sets always produce the same plan.

use std::collections::{HashMap, HashSet};

use crate::models::ModelFamily;

pub type PairSet = HashSet<(String, String)>;

/// A two-hop translation path. Single-hop plans degenerate to `mid == tgt`
/// and never leave this module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PivotPlan {
    pub src: String,
    pub mid: String,
    pub tgt: String,
    /// Family whose pair sets admitted the path. Each hop may still fall
    /// back across families when it executes.
    pub family: ModelFamily,
}

impl PivotPlan {
    pub fn hops(&self) -> [(String, String); 2] {
        [
            (self.src.clone(), self.mid.clone()),
            (self.mid.clone(), self.tgt.clone()),
        ]
    }

    /// Human-readable route, e.g. `"ja->hi->de"`.
    pub fn path(&self) -> String {
        format!("{}->{}->{}", self.src, self.mid, self.tgt)
    }
}

// Preferred intermediaries for Indic-script targets.
const INDIC_TARGETS: [&str; 11] = [
    "hi", "bn", "ta", "te", "ml", "mr", "gu", "pa", "ne", "si", "or",
];
const INDIC_PRIORITY: [&str; 3] = ["hi", "bn", "ta"];

fn script_priority_rank(tgt: &str, mid: &str) -> usize {
    if INDIC_TARGETS.contains(&tgt) {
        INDIC_PRIORITY
            .iter()
            .position(|&candidate| candidate == mid)
            .unwrap_or(INDIC_PRIORITY.len())
    } else {
        0
    }
}

/// Choose a pivot language for `(src, tgt)`. For each family in order,
/// intersect the languages reachable from `src` with those that reach
/// `tgt`; the first family with a non-empty intersection wins. Candidates
/// are ranked: the configured pivot language first, then the static
/// per-script priority, then alphabetically.
pub fn plan_pivot(
    src: &str,
    tgt: &str,
    families: &[ModelFamily],
    pairs_by_family: &HashMap<ModelFamily, PairSet>,
    pivot_lang: &str,
) -> Option<PivotPlan> {
    for family in families {
        let pairs = match pairs_by_family.get(family) {
            Some(pairs) if !pairs.is_empty() => pairs,
            _ => continue,
        };

        let reachable: HashSet<&str> = pairs
            .iter()
            .filter(|(s, _)| s == src)
            .map(|(_, m)| m.as_str())
            .collect();
        let reaching: HashSet<&str> = pairs
            .iter()
            .filter(|(_, t)| t == tgt)
            .map(|(m, _)| m.as_str())
            .collect();

        let mut candidates: Vec<&str> = reachable
            .intersection(&reaching)
            .copied()
            .filter(|&mid| mid != src && mid != tgt)
            .collect();
        if candidates.is_empty() {
            continue;
        }

        candidates.sort_by_key(|&mid| {
            (
                mid != pivot_lang,
                script_priority_rank(tgt, mid),
                mid.to_string(),
            )
        });

        return Some(PivotPlan {
            src: src.to_string(),
            mid: candidates[0].to_string(),
            tgt: tgt.to_string(),
            family: *family,
        });
    }
    None
}
