//! Recursive tie-break ranking
//!
//! Teams start as one group. At each policy level the group is sorted by the
//! criterion's value and split into runs of equal value; each run is refined at the
//! next level. Groups that outlast the policy keep their input order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::error::{Result, StandingsError};
use crate::head_to_head::{DivisionRecords, HeadToHeadMatrix};
use crate::policy::{TieBreakPolicy, TieBreaker};
use crate::types::{StandingEntry, Standings, TeamId, TeamRecord};

/// Per-request inputs for criteria that are not part of a team record
#[derive(Debug, Clone, Default)]
pub struct RankingContext {
    pub custom_metrics: HashMap<TeamId, f64>,
    pub random_keys: HashMap<TeamId, u64>,
    pub division_records: DivisionRecords,
}

impl RankingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_custom_metrics(mut self, metrics: HashMap<TeamId, f64>) -> Self {
        self.custom_metrics = metrics;
        self
    }

    pub fn with_division_records(mut self, records: DivisionRecords) -> Self {
        self.division_records = records;
        self
    }

    /// Draw a key for every team that does not have one yet
    pub fn assign_random_keys<R: Rng>(&mut self, teams: &[TeamId], rng: &mut R) {
        for &team in teams {
            self.random_keys.entry(team).or_insert_with(|| rng.gen());
        }
    }

    pub fn with_random_keys<R: Rng>(mut self, teams: &[TeamId], rng: &mut R) -> Self {
        self.assign_random_keys(teams, rng);
        self
    }
}

/// Value of one team under one criterion, higher is better
#[derive(Debug, Clone, Copy)]
enum SortKey {
    Count(i64),
    Real(f64),
    MiniLeague { wins: u32, losses: u32 },
    Key(u64),
}

impl SortKey {
    fn real(value: f64) -> Self {
        // Normalise -0.0 so equal values group together
        SortKey::Real(value + 0.0)
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Count(a), SortKey::Count(b)) => a.cmp(b),
            (SortKey::Real(a), SortKey::Real(b)) => a.total_cmp(b),
            (
                SortKey::MiniLeague { wins: wa, losses: la },
                SortKey::MiniLeague { wins: wb, losses: lb },
            ) => wa.cmp(wb).then(lb.cmp(la)),
            (SortKey::Key(a), SortKey::Key(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

struct Ranker<'a> {
    records: HashMap<TeamId, &'a TeamRecord>,
    policy: &'a TieBreakPolicy,
    matrix: &'a HeadToHeadMatrix,
    context: &'a RankingContext,
    notes: HashMap<TeamId, Vec<String>>,
    head_to_head: HashMap<TeamId, BTreeMap<TeamId, u32>>,
}

/// Rank teams into a strict order under `policy`.
///
/// Records with duplicate team ids or non-finite points are skipped. The `random`
/// criterion reads keys from `context` only; teams without a key share key 0, so the
/// output depends on nothing but the arguments.
pub fn rank(
    records: &[TeamRecord],
    policy: &TieBreakPolicy,
    matrix: &HeadToHeadMatrix,
    context: &RankingContext,
) -> Result<Standings> {
    let mut seen = HashSet::new();
    let valid: Vec<&TeamRecord> = records
        .iter()
        .filter(|r| {
            if !seen.insert(r.team_id) {
                warn!(team_id = r.team_id, "Skipping duplicate team record");
                return false;
            }
            if !r.points_for.is_finite() || !r.points_against.is_finite() {
                warn!(team_id = r.team_id, "Skipping team record with non-finite points");
                return false;
            }
            true
        })
        .collect();

    if valid.is_empty() {
        return Err(StandingsError::NoTeams);
    }

    let order: Vec<TeamId> = valid.iter().map(|r| r.team_id).collect();
    if policy.contains(TieBreaker::Random) && order.iter().any(|t| !context.random_keys.contains_key(t)) {
        warn!("Random tie-break requested without keys for every team");
    }

    let mut ranker = Ranker {
        records: valid.iter().map(|r| (r.team_id, *r)).collect(),
        policy,
        matrix,
        context,
        notes: HashMap::new(),
        head_to_head: HashMap::new(),
    };
    let ranked = ranker.order_group(order, 0);

    let entries: Vec<StandingEntry> = ranked
        .iter()
        .enumerate()
        .filter_map(|(index, team)| {
            let record = ranker.records.get(team)?;
            let mut entry = StandingEntry::from_record(record);
            entry.rank = index as u32 + 1;
            entry.tiebreak_notes = ranker.notes.remove(team).unwrap_or_default();
            entry.head_to_head_record = ranker.head_to_head.remove(team);
            Some(entry)
        })
        .collect();

    info!(teams = entries.len(), %policy, "Ranked standings");

    Ok(Standings {
        entries,
        policy: policy.clone(),
        summary: format!("Tiebreakers applied: {policy}"),
    })
}

impl Ranker<'_> {
    fn order_group(&mut self, group: Vec<TeamId>, level: usize) -> Vec<TeamId> {
        if group.len() <= 1 {
            return group;
        }

        let Some(criterion) = self.policy.get(level) else {
            debug!(?group, "Tie unresolved after full policy");
            self.note_all(&group, "tie unresolved by policy, input order kept".to_string());
            return group;
        };

        let keys: Vec<(TeamId, SortKey)> = match criterion {
            TieBreaker::HeadToHead => {
                if !self.matrix.has_complete_data(&group) {
                    debug!(?group, "Incomplete head-to-head data, skipping criterion");
                    self.note_all(
                        &group,
                        format!("head_to_head skipped for {}-team tie: incomplete results", group.len()),
                    );
                    return self.order_group(group, level + 1);
                }
                self.mini_league_keys(&group)
            }
            TieBreaker::DivisionRecord => {
                let has_data = group
                    .iter()
                    .any(|t| self.context.division_records.win_percentage(*t).is_some());
                if !has_data {
                    return self.order_group(group, level + 1);
                }
                group
                    .iter()
                    .map(|t| {
                        let pct = self.context.division_records.win_percentage(*t).unwrap_or(-1.0);
                        (*t, SortKey::real(pct))
                    })
                    .collect()
            }
            _ => group.iter().map(|t| (*t, self.key(criterion, *t))).collect(),
        };

        let runs = partition(keys);
        if level > 0 && runs.len() > 1 {
            self.note_all(&group, format!("{criterion} broke {}-team tie", group.len()));
        }

        runs.into_iter()
            .flat_map(|run| self.order_group(run, level + 1))
            .collect()
    }

    fn key(&self, criterion: TieBreaker, team: TeamId) -> SortKey {
        let Some(record) = self.records.get(&team) else {
            return SortKey::Count(0);
        };
        match criterion {
            TieBreaker::Wins => SortKey::Count(i64::from(record.wins)),
            TieBreaker::PointsFor => SortKey::real(record.points_for),
            TieBreaker::PointsAgainst => SortKey::real(-record.points_against),
            TieBreaker::Custom => {
                SortKey::real(self.context.custom_metrics.get(&team).copied().unwrap_or(0.0))
            }
            TieBreaker::Random => SortKey::Key(self.context.random_keys.get(&team).copied().unwrap_or(0)),
            TieBreaker::HeadToHead | TieBreaker::DivisionRecord => SortKey::Count(0),
        }
    }

    fn mini_league_keys(&mut self, group: &[TeamId]) -> Vec<(TeamId, SortKey)> {
        group
            .iter()
            .map(|&team| {
                let (wins, losses) = self.matrix.record_within(team, group);
                self.head_to_head
                    .insert(team, self.matrix.wins_against(team, group));
                (team, SortKey::MiniLeague { wins, losses })
            })
            .collect()
    }

    fn note_all(&mut self, group: &[TeamId], note: String) {
        for team in group {
            self.notes.entry(*team).or_default().push(note.clone());
        }
    }
}

/// Stable sort by key (best first) and split into runs of equal key
fn partition(mut keys: Vec<(TeamId, SortKey)>) -> Vec<Vec<TeamId>> {
    keys.sort_by(|a, b| b.1.compare(&a.1));

    let mut runs: Vec<Vec<TeamId>> = Vec::new();
    let mut previous: Option<SortKey> = None;
    for (team, key) in keys {
        match (previous, runs.last_mut()) {
            (Some(prev), Some(run)) if prev.compare(&key) == Ordering::Equal => run.push(team),
            _ => runs.push(vec![team]),
        }
        previous = Some(key);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Game, Schedule, WeekRange};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use TieBreaker::*;

    fn team(id: TeamId, wins: u32, losses: u32, pf: f64, pa: f64) -> TeamRecord {
        TeamRecord::new(id, wins, losses, 0, pf, pa)
    }

    fn ids(standings: &Standings) -> Vec<TeamId> {
        standings.team_ids()
    }

    #[test]
    fn wins_then_points_for() {
        let records = vec![
            team(1, 10, 2, 1500.0, 1200.0),
            team(2, 10, 2, 1520.0, 1300.0),
            team(3, 8, 4, 1600.0, 1250.0),
        ];
        let policy = TieBreakPolicy::new([Wins, PointsFor]);
        let standings = rank(&records, &policy, &HeadToHeadMatrix::new(), &RankingContext::new()).unwrap();

        assert_eq!(ids(&standings), vec![2, 1, 3]);
        let ranks: Vec<u32> = standings.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(standings.summary, "Tiebreakers applied: wins > points_for");
        assert_eq!(standings.get(1).unwrap().tiebreak_notes, vec!["points_for broke 2-team tie"]);
        assert!(standings.get(3).unwrap().tiebreak_notes.is_empty());
    }

    #[test]
    fn points_against_prefers_lower() {
        let records = vec![team(1, 5, 5, 1000.0, 1100.0), team(2, 5, 5, 1000.0, 900.0)];
        let policy = TieBreakPolicy::new([Wins, PointsFor, PointsAgainst]);
        let standings = rank(&records, &policy, &HeadToHeadMatrix::new(), &RankingContext::new()).unwrap();
        assert_eq!(ids(&standings), vec![2, 1]);
    }

    #[test]
    fn head_to_head_mini_league() {
        let schedule: Schedule = vec![
            (1, vec![Game::new(1, 1, 110.0, 2, 100.0)]),
            (2, vec![Game::new(2, 1, 110.0, 3, 100.0)]),
            (3, vec![Game::new(3, 2, 110.0, 3, 100.0)]),
        ]
        .into_iter()
        .collect();
        let matrix = HeadToHeadMatrix::build(&schedule, WeekRange::new(1, 14));
        // Points favour the reverse order so only head-to-head can produce 1, 2, 3
        let records = vec![
            team(3, 9, 3, 1700.0, 1000.0),
            team(2, 9, 3, 1600.0, 1000.0),
            team(1, 9, 3, 1500.0, 1000.0),
        ];
        let policy = TieBreakPolicy::new([Wins, HeadToHead, PointsFor]);
        let standings = rank(&records, &policy, &matrix, &RankingContext::new()).unwrap();

        assert_eq!(ids(&standings), vec![1, 2, 3]);
        let leader = standings.get(1).unwrap();
        assert_eq!(leader.head_to_head_record, Some(BTreeMap::from([(2, 1), (3, 1)])));
        assert_eq!(leader.tiebreak_notes, vec!["head_to_head broke 3-team tie"]);
    }

    #[test]
    fn incomplete_head_to_head_falls_through() {
        let schedule: Schedule = vec![(1, vec![Game::new(1, 1, 110.0, 2, 100.0)])]
            .into_iter()
            .collect();
        let matrix = HeadToHeadMatrix::build(&schedule, WeekRange::new(1, 14));
        let records = vec![
            team(1, 9, 3, 1500.0, 1000.0),
            team(2, 9, 3, 1600.0, 1000.0),
            team(3, 9, 3, 1700.0, 1000.0),
        ];
        let policy = TieBreakPolicy::new([Wins, HeadToHead, PointsFor]);
        let standings = rank(&records, &policy, &matrix, &RankingContext::new()).unwrap();

        assert_eq!(ids(&standings), vec![3, 2, 1]);
        assert!(standings.get(1).unwrap().head_to_head_record.is_none());
        assert!(standings.get(1).unwrap().tiebreak_notes[0].starts_with("head_to_head skipped"));
    }

    #[test]
    fn exhausted_policy_keeps_input_order() {
        let records = vec![team(7, 6, 6, 1000.0, 1000.0), team(4, 6, 6, 1000.0, 1000.0)];
        let policy = TieBreakPolicy::new([Wins, PointsFor]);
        let standings = rank(&records, &policy, &HeadToHeadMatrix::new(), &RankingContext::new()).unwrap();

        assert_eq!(ids(&standings), vec![7, 4]);
        assert_eq!(
            standings.entries[0].tiebreak_notes,
            vec!["tie unresolved by policy, input order kept"]
        );
    }

    #[test]
    fn custom_metric_defaults_to_zero() {
        let records = vec![team(1, 6, 6, 1000.0, 1000.0), team(2, 6, 6, 1000.0, 1000.0)];
        let context = RankingContext::new().with_custom_metrics(HashMap::from([(2, 0.5)]));
        let policy = TieBreakPolicy::new([Wins, Custom]);
        let standings = rank(&records, &policy, &HeadToHeadMatrix::new(), &context).unwrap();
        assert_eq!(ids(&standings), vec![2, 1]);
    }

    #[test]
    fn division_record_without_data_falls_through() {
        let records = vec![team(1, 6, 6, 900.0, 1000.0), team(2, 6, 6, 1000.0, 1000.0)];
        let policy = TieBreakPolicy::new([Wins, DivisionRecord, PointsFor]);
        let standings = rank(&records, &policy, &HeadToHeadMatrix::new(), &RankingContext::new()).unwrap();
        assert_eq!(ids(&standings), vec![2, 1]);
    }

    #[test]
    fn division_record_orders_by_percentage() {
        let records = vec![
            team(1, 6, 6, 1000.0, 1000.0).with_division(1),
            team(2, 6, 6, 900.0, 1000.0).with_division(1),
        ];
        let schedule: Schedule = vec![(1, vec![Game::new(1, 2, 100.0, 1, 90.0)])]
            .into_iter()
            .collect();
        let divisions = DivisionRecords::build(&schedule, WeekRange::new(1, 14), &records);
        let context = RankingContext::new().with_division_records(divisions);
        let policy = TieBreakPolicy::new([Wins, DivisionRecord, PointsFor]);
        let standings = rank(&records, &policy, &HeadToHeadMatrix::new(), &context).unwrap();
        assert_eq!(ids(&standings), vec![2, 1]);
    }

    #[test]
    fn random_keys_are_stable_for_a_context() {
        let records: Vec<TeamRecord> = (1..=6).map(|id| team(id, 5, 5, 1000.0, 1000.0)).collect();
        let team_ids: Vec<TeamId> = records.iter().map(|r| r.team_id).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let context = RankingContext::new().with_random_keys(&team_ids, &mut rng);
        let policy = TieBreakPolicy::new([Wins, Random]);

        let first = rank(&records, &policy, &HeadToHeadMatrix::new(), &context).unwrap();
        let second = rank(&records, &policy, &HeadToHeadMatrix::new(), &context).unwrap();
        assert_eq!(first, second);

        let mut expected = team_ids.clone();
        expected.sort_by_key(|t| std::cmp::Reverse(context.random_keys[t]));
        assert_eq!(ids(&first), expected);
    }

    #[test]
    fn missing_random_keys_keep_input_order() {
        let records: Vec<TeamRecord> = (1..=4).map(|id| team(id, 5, 5, 1000.0, 1000.0)).collect();
        let policy = TieBreakPolicy::new([Wins, Random]);

        let standings = rank(&records, &policy, &HeadToHeadMatrix::new(), &RankingContext::new()).unwrap();
        assert_eq!(ids(&standings), vec![1, 2, 3, 4]);
        assert_eq!(
            rank(&records, &policy, &HeadToHeadMatrix::new(), &RankingContext::new()).unwrap(),
            standings
        );
    }

    #[test]
    fn duplicate_and_invalid_records_are_skipped() {
        let records = vec![
            team(1, 6, 6, 1000.0, 1000.0),
            team(1, 9, 3, 1200.0, 1000.0),
            team(2, 6, 6, f64::NAN, 1000.0),
        ];
        let standings =
            rank(&records, &TieBreakPolicy::default(), &HeadToHeadMatrix::new(), &RankingContext::new())
                .unwrap();
        assert_eq!(ids(&standings), vec![1]);
        assert_eq!(standings.entries[0].wins, 6);
    }

    #[test]
    fn empty_input_is_an_error() {
        let result = rank(&[], &TieBreakPolicy::default(), &HeadToHeadMatrix::new(), &RankingContext::new());
        assert_eq!(result.unwrap_err(), StandingsError::NoTeams);
    }
}
