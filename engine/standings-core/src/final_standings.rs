//! Final standings: playoff outcomes layered over the regular season ranking

use std::collections::HashMap;

use tracing::info;

use crate::bracket::{BracketOrigin, PlayoffBracket};
use crate::types::{PlayoffOutcome, Standings, TeamId};

/// Order teams by playoff outcome, keeping regular season rank as the tie-break
/// for teams eliminated before the medal games.
///
/// Entries that already carry a regular season rank keep it, so composing an
/// already-composed table yields the same table.
pub fn compose(regular_season: &Standings, bracket: &PlayoffBracket) -> Standings {
    let outcomes = playoff_outcomes(bracket);

    let mut entries = regular_season.entries.clone();
    for entry in &mut entries {
        entry.regular_season_rank.get_or_insert(entry.rank);
        entry.seed = bracket.playoff_teams.get(&entry.team_id).copied();
        let outcome = match outcomes.get(&entry.team_id) {
            Some(outcome) => *outcome,
            None if bracket.is_playoff_team(entry.team_id) => PlayoffOutcome::QuarterfinalLoss,
            None => PlayoffOutcome::NoPlayoffs,
        };
        entry.playoff_outcome = Some(outcome);
    }

    entries.sort_by_key(|entry| {
        let outcome = entry.playoff_outcome.unwrap_or(PlayoffOutcome::NoPlayoffs);
        let tie_break = if outcome.uses_regular_season_rank() {
            entry.regular_season_rank.unwrap_or(u32::MAX)
        } else {
            0
        };
        (outcome.priority(), tie_break)
    });
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index as u32 + 1;
    }

    let source = match bracket.origin {
        BracketOrigin::Authoritative => "platform bracket",
        BracketOrigin::Inferred => "playoff schedule",
    };
    info!(champion = ?bracket.champion(), source, "Composed final standings");

    let summary = if regular_season.summary.contains("Final standings") {
        regular_season.summary.clone()
    } else {
        format!("{} (Final standings based on playoff results from {source})", regular_season.summary)
    };

    Standings {
        entries,
        policy: regular_season.policy.clone(),
        summary,
    }
}

/// Outcomes decided by bracket games. Later assignments overwrite earlier ones.
fn playoff_outcomes(bracket: &PlayoffBracket) -> HashMap<TeamId, PlayoffOutcome> {
    let mut outcomes = HashMap::new();

    for game in &bracket.quarterfinals {
        outcomes.insert(game.loser_id, PlayoffOutcome::QuarterfinalLoss);
    }
    for game in &bracket.semifinals {
        outcomes.insert(game.loser_id, PlayoffOutcome::SemifinalLoss);
    }
    if let Some(game) = &bracket.third_place {
        outcomes.insert(game.winner_id, PlayoffOutcome::ThirdPlace);
        outcomes.insert(game.loser_id, PlayoffOutcome::FourthPlace);
    }
    if let Some(game) = &bracket.championship {
        outcomes.insert(game.winner_id, PlayoffOutcome::Champion);
        outcomes.insert(game.loser_id, PlayoffOutcome::RunnerUp);
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{BracketGame, Round, Seeding};
    use crate::policy::TieBreakPolicy;
    use crate::types::{StandingEntry, TeamRecord};

    fn regular_season(teams: u32) -> Standings {
        let entries = (1..=teams)
            .map(|id| {
                let mut entry = StandingEntry::from_record(&TeamRecord::new(id, 14 - id, id, 0, 0.0, 0.0));
                entry.rank = id;
                entry
            })
            .collect();
        Standings {
            entries,
            policy: TieBreakPolicy::default(),
            summary: "Tiebreakers applied: wins > points_for > points_against".to_string(),
        }
    }

    fn six_team_bracket(with_third: bool) -> PlayoffBracket {
        let seeding = Seeding::from_teams(&[1, 2, 3, 4, 5, 6]);
        let mut bracket = PlayoffBracket::new(&seeding, BracketOrigin::Inferred);
        bracket.quarterfinals = vec![
            BracketGame::from_result(Round::Quarterfinal, 3, 6, 6, 3).unwrap(),
            BracketGame::from_result(Round::Quarterfinal, 4, 5, 4, 5).unwrap(),
        ];
        bracket.semifinals = vec![
            BracketGame::from_result(Round::Semifinal, 1, 6, 6, 1).unwrap(),
            BracketGame::from_result(Round::Semifinal, 2, 4, 4, 2).unwrap(),
        ];
        bracket.championship = BracketGame::from_result(Round::Championship, 6, 4, 4, 6);
        if with_third {
            bracket.third_place = BracketGame::from_result(Round::ThirdPlace, 1, 2, 2, 1);
            bracket.has_third_place = true;
        }
        bracket
    }

    fn outcome_order(standings: &Standings) -> Vec<(TeamId, PlayoffOutcome)> {
        standings
            .entries
            .iter()
            .map(|e| (e.team_id, e.playoff_outcome.unwrap()))
            .collect()
    }

    #[test]
    fn places_teams_by_outcome() {
        let standings = compose(&regular_season(8), &six_team_bracket(true));

        use PlayoffOutcome::*;
        assert_eq!(
            outcome_order(&standings),
            vec![
                (4, Champion),
                (6, RunnerUp),
                (2, ThirdPlace),
                (1, FourthPlace),
                (3, QuarterfinalLoss),
                (5, QuarterfinalLoss),
                (7, NoPlayoffs),
                (8, NoPlayoffs),
            ]
        );
        let ranks: Vec<u32> = standings.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, (1..=8).collect::<Vec<_>>());
        assert_eq!(standings.get(4).unwrap().regular_season_rank, Some(4));
        assert_eq!(standings.get(6).unwrap().seed, Some(6));
        assert!(standings.get(8).unwrap().seed.is_none());
    }

    #[test]
    fn semifinal_losers_without_third_place_game() {
        let standings = compose(&regular_season(6), &six_team_bracket(false));
        let order = outcome_order(&standings);
        assert_eq!(order[2], (1, PlayoffOutcome::SemifinalLoss));
        assert_eq!(order[3], (2, PlayoffOutcome::SemifinalLoss));
    }

    #[test]
    fn unplaced_seeds_are_quarterfinal_losers() {
        let mut bracket = six_team_bracket(true);
        bracket.quarterfinals.clear();
        let standings = compose(&regular_season(6), &bracket);
        let tail: Vec<(TeamId, PlayoffOutcome)> = outcome_order(&standings)[4..].to_vec();
        assert_eq!(
            tail,
            vec![(3, PlayoffOutcome::QuarterfinalLoss), (5, PlayoffOutcome::QuarterfinalLoss)]
        );
    }

    #[test]
    fn compose_is_idempotent() {
        let bracket = six_team_bracket(true);
        let once = compose(&regular_season(10), &bracket);
        let twice = compose(&once, &bracket);
        assert_eq!(once, twice);
    }
}
