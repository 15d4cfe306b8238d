//! Tie-break policy vocabulary and resolution
//!
//! A policy is an ordered list of [`TieBreaker`] criteria. The resolver merges the
//! caller's explicit order or instructions, the league's stored configuration and the
//! platform's seed type setting into one policy, and reports where it came from.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_regex::{regex, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StandingsError;
use crate::types::TeamId;

/// A single ranking criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreaker {
    Wins,
    PointsFor,
    PointsAgainst,
    HeadToHead,
    DivisionRecord,
    Custom,
    Random,
}

impl TieBreaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreaker::Wins => "wins",
            TieBreaker::PointsFor => "points_for",
            TieBreaker::PointsAgainst => "points_against",
            TieBreaker::HeadToHead => "head_to_head",
            TieBreaker::DivisionRecord => "division_record",
            TieBreaker::Custom => "custom",
            TieBreaker::Random => "random",
        }
    }
}

impl fmt::Display for TieBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TieBreaker {
    type Err = StandingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "wins" | "win" | "record" => Ok(TieBreaker::Wins),
            "points_for" | "pf" | "total_points" => Ok(TieBreaker::PointsFor),
            "points_against" | "pa" => Ok(TieBreaker::PointsAgainst),
            "head_to_head" | "h2h" => Ok(TieBreaker::HeadToHead),
            "division_record" | "division" => Ok(TieBreaker::DivisionRecord),
            "custom" => Ok(TieBreaker::Custom),
            "random" | "coin_flip" => Ok(TieBreaker::Random),
            _ => Err(StandingsError::UnknownTieBreaker(s.to_string())),
        }
    }
}

/// Ordered, duplicate-free list of criteria
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TieBreakPolicy {
    criteria: Vec<TieBreaker>,
}

impl TieBreakPolicy {
    /// Build a policy, keeping the first occurrence of each criterion
    pub fn new(criteria: impl IntoIterator<Item = TieBreaker>) -> Self {
        let mut deduped = Vec::new();
        for criterion in criteria {
            if !deduped.contains(&criterion) {
                deduped.push(criterion);
            }
        }
        Self { criteria: deduped }
    }

    /// Parse criterion names, skipping unknown ones
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let criteria = names.iter().filter_map(|name| {
            let name = name.as_ref();
            match name.parse::<TieBreaker>() {
                Ok(criterion) => Some(criterion),
                Err(_) => {
                    warn!(name, "Skipping unknown tie-breaker");
                    None
                }
            }
        });
        Self::new(criteria)
    }

    pub fn criteria(&self) -> &[TieBreaker] {
        &self.criteria
    }

    pub fn get(&self, level: usize) -> Option<TieBreaker> {
        self.criteria.get(level).copied()
    }

    pub fn contains(&self, criterion: TieBreaker) -> bool {
        self.criteria.contains(&criterion)
    }

    /// Whether ranking needs weekly game data
    pub fn needs_games(&self) -> bool {
        self.contains(TieBreaker::HeadToHead) || self.contains(TieBreaker::DivisionRecord)
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl Default for TieBreakPolicy {
    fn default() -> Self {
        Self::new([TieBreaker::Wins, TieBreaker::PointsFor, TieBreaker::PointsAgainst])
    }
}

impl fmt::Display for TieBreakPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.criteria.iter().map(TieBreaker::as_str).collect();
        f.write_str(&names.join(" > "))
    }
}

/// Where a resolved policy came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySource {
    CallerOrder,
    CallerInstructions,
    StoredInstructions,
    StoredOrder,
    SeedType,
    Default,
}

/// Tie-break inputs supplied with a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyInputs {
    #[serde(default)]
    pub tiebreak_order: Vec<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    /// Caller-supplied values for the `custom` criterion; missing teams score 0
    #[serde(default)]
    pub custom_metrics: HashMap<TeamId, f64>,
}

/// A league's stored custom standings configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredPolicy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tiebreak_order: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPolicy {
    pub policy: TieBreakPolicy,
    pub source: PolicySource,
}

/// Resolve the policy for a request.
///
/// Precedence: caller order, caller instructions, stored instructions, stored order
/// (only when the stored configuration is enabled), seed type default, global default.
pub fn resolve(
    inputs: &PolicyInputs,
    stored: Option<&StoredPolicy>,
    seed_type: Option<i64>,
) -> ResolvedPolicy {
    let resolved = |policy, source| ResolvedPolicy { policy, source };

    if let Some(policy) = explicit_order(&inputs.tiebreak_order) {
        return resolved(policy, PolicySource::CallerOrder);
    }
    if let Some(policy) = inputs.instructions.as_deref().and_then(parse_instructions) {
        return resolved(policy, PolicySource::CallerInstructions);
    }

    if let Some(stored) = stored.filter(|s| s.enabled) {
        if let Some(policy) = stored.instructions.as_deref().and_then(parse_instructions) {
            return resolved(policy, PolicySource::StoredInstructions);
        }
        if let Some(policy) = explicit_order(&stored.tiebreak_order) {
            return resolved(policy, PolicySource::StoredOrder);
        }
        debug!("Stored policy enabled but unusable, falling through");
    }

    if let Some(policy) = seed_type.and_then(seed_type_default) {
        return resolved(policy, PolicySource::SeedType);
    }

    resolved(TieBreakPolicy::default(), PolicySource::Default)
}

fn explicit_order(names: &[String]) -> Option<TieBreakPolicy> {
    if names.is_empty() {
        return None;
    }
    let policy = TieBreakPolicy::from_names(names);
    (!policy.is_empty()).then_some(policy)
}

/// Platform default for a league's playoff seed type setting
pub fn seed_type_default(seed_type: i64) -> Option<TieBreakPolicy> {
    use TieBreaker::*;
    match seed_type {
        0 => Some(TieBreakPolicy::new([Wins, PointsFor, PointsAgainst])),
        1 => Some(TieBreakPolicy::new([Wins, PointsFor])),
        2 => Some(TieBreakPolicy::new([Wins, HeadToHead, PointsFor, PointsAgainst])),
        _ => None,
    }
}

/// Parse free-text instructions into a policy.
///
/// Returns `None` when nothing beyond `wins` is recognised.
pub fn parse_instructions(text: &str) -> Option<TieBreakPolicy> {
    let text = text.to_lowercase();
    let mut found: Vec<(usize, TieBreaker)> = KEYWORD_CRITERIA
        .iter()
        .filter_map(|&criterion| {
            keyword_pattern(criterion)
                .find_iter(&text)
                .find(|m| criterion != TieBreaker::PointsFor || !is_against_phrase(&text[m.end()..]))
                .map(|m| (m.start(), criterion))
        })
        .collect();
    found.sort_by_key(|(position, _)| *position);

    let disclaims_wins = regex!(r"(ignore|not|without) wins").is_match(&text);
    let mut criteria = Vec::with_capacity(found.len() + 1);
    if !disclaims_wins {
        criteria.push(TieBreaker::Wins);
    }
    criteria.extend(found.into_iter().map(|(_, criterion)| criterion));

    let policy = TieBreakPolicy::new(criteria);
    let usable = policy.criteria().iter().any(|c| *c != TieBreaker::Wins);
    debug!(%policy, usable, "Parsed tie-break instructions");
    usable.then_some(policy)
}

const KEYWORD_CRITERIA: [TieBreaker; 6] = [
    TieBreaker::HeadToHead,
    TieBreaker::PointsFor,
    TieBreaker::PointsAgainst,
    TieBreaker::DivisionRecord,
    TieBreaker::Custom,
    TieBreaker::Random,
];

fn keyword_pattern(criterion: TieBreaker) -> &'static Regex {
    match criterion {
        TieBreaker::HeadToHead => regex!(r"head.to.head|h2h"),
        TieBreaker::PointsFor => regex!(r"points? for|total points|points scored"),
        TieBreaker::PointsAgainst => regex!(r"points? against|points allowed"),
        TieBreaker::DivisionRecord => regex!(r"division"),
        TieBreaker::Custom => regex!(r"custom"),
        TieBreaker::Random => regex!(r"random|coin (flip|toss)"),
        TieBreaker::Wins => regex!(r"\bwins?\b"),
    }
}

fn is_against_phrase(rest: &str) -> bool {
    rest.starts_with(" against") || rest.starts_with(" allowed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use TieBreaker::*;

    fn inputs(order: &[&str], instructions: Option<&str>) -> PolicyInputs {
        PolicyInputs {
            tiebreak_order: order.iter().map(|s| s.to_string()).collect(),
            instructions: instructions.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("h2h".parse::<TieBreaker>().unwrap(), HeadToHead);
        assert_eq!("Points For".parse::<TieBreaker>().unwrap(), PointsFor);
        assert_eq!("head-to-head".parse::<TieBreaker>().unwrap(), HeadToHead);
        assert!("strength_of_schedule".parse::<TieBreaker>().is_err());
    }

    #[test]
    fn policy_deduplicates() {
        let policy = TieBreakPolicy::new([Wins, PointsFor, Wins, PointsFor, Random]);
        assert_eq!(policy.criteria(), &[Wins, PointsFor, Random]);
        assert_eq!(policy.to_string(), "wins > points_for > random");
    }

    #[test]
    fn unknown_names_are_skipped() {
        let policy = TieBreakPolicy::from_names(&["wins", "bogus", "h2h"]);
        assert_eq!(policy.criteria(), &[Wins, HeadToHead]);
    }

    #[test]
    fn instructions_in_order_of_appearance() {
        let policy = parse_instructions("Use points against first, then Head-to-Head, then total points").unwrap();
        assert_eq!(policy.criteria(), &[Wins, PointsAgainst, HeadToHead, PointsFor]);
    }

    #[test]
    fn instructions_can_drop_wins() {
        let policy = parse_instructions("Ignore wins and rank by points scored").unwrap();
        assert_eq!(policy.criteria(), &[PointsFor]);
    }

    #[test]
    fn total_points_against_is_not_points_for() {
        let policy = parse_instructions("break ties by total points against").unwrap();
        assert_eq!(policy.criteria(), &[Wins, PointsAgainst]);
    }

    #[test]
    fn unusable_instructions_yield_none() {
        assert!(parse_instructions("most wins takes it").is_none());
        assert!(parse_instructions("").is_none());
    }

    #[test]
    fn caller_order_wins_over_everything() {
        let stored = StoredPolicy {
            enabled: true,
            instructions: Some("head to head".into()),
            ..Default::default()
        };
        let resolved = resolve(&inputs(&["wins", "pf"], Some("division")), Some(&stored), Some(2));
        assert_eq!(resolved.source, PolicySource::CallerOrder);
        assert_eq!(resolved.policy.criteria(), &[Wins, PointsFor]);
    }

    #[test]
    fn caller_instructions_before_stored() {
        let stored = StoredPolicy {
            enabled: true,
            tiebreak_order: vec!["wins".into(), "points_against".into()],
            ..Default::default()
        };
        let resolved = resolve(&inputs(&[], Some("then division record")), Some(&stored), None);
        assert_eq!(resolved.source, PolicySource::CallerInstructions);
        assert_eq!(resolved.policy.criteria(), &[Wins, DivisionRecord]);
    }

    #[test]
    fn stored_instructions_then_stored_order() {
        let mut stored = StoredPolicy {
            enabled: true,
            instructions: Some("h2h then points for".into()),
            tiebreak_order: vec!["wins".into(), "points_against".into()],
            notes: None,
        };
        let resolved = resolve(&PolicyInputs::default(), Some(&stored), Some(0));
        assert_eq!(resolved.source, PolicySource::StoredInstructions);
        assert_eq!(resolved.policy.criteria(), &[Wins, HeadToHead, PointsFor]);

        stored.instructions = Some("nothing useful".into());
        let resolved = resolve(&PolicyInputs::default(), Some(&stored), Some(0));
        assert_eq!(resolved.source, PolicySource::StoredOrder);
        assert_eq!(resolved.policy.criteria(), &[Wins, PointsAgainst]);
    }

    #[test]
    fn disabled_stored_policy_is_ignored() {
        let stored = StoredPolicy {
            enabled: false,
            tiebreak_order: vec!["random".into()],
            ..Default::default()
        };
        let resolved = resolve(&PolicyInputs::default(), Some(&stored), Some(2));
        assert_eq!(resolved.source, PolicySource::SeedType);
        assert_eq!(resolved.policy.criteria(), &[Wins, HeadToHead, PointsFor, PointsAgainst]);
    }

    #[test]
    fn seed_type_defaults() {
        assert_eq!(seed_type_default(1).unwrap().criteria(), &[Wins, PointsFor]);
        assert!(seed_type_default(9).is_none());

        let resolved = resolve(&inputs(&["bogus"], None), None, Some(9));
        assert_eq!(resolved.source, PolicySource::Default);
        assert_eq!(resolved.policy, TieBreakPolicy::default());
    }
}
