use std::collections::BTreeSet;

use tracing::debug;

use super::{BracketFormat, BracketGame, BracketOrigin, BracketSource, PlayoffBracket, Round, Seeding};
use crate::error::BracketError;
use crate::types::{Game, Schedule, TeamId, Week, WeekRange};

/// Bracket inferred from the games played inside the playoff window.
///
/// Only games where both teams are still contending count. Losers drop out after each
/// round, so consolation games never look like bracket games.
#[derive(Debug, Clone)]
pub struct InferredBracket<'a> {
    schedule: &'a Schedule,
    window: WeekRange,
}

impl<'a> InferredBracket<'a> {
    pub fn new(schedule: &'a Schedule, window: WeekRange) -> Self {
        Self { schedule, window }
    }
}

impl<'a> InferredBracket<'a> {
    fn week(&self, week: Week) -> Result<&'a [Game], BracketError> {
        self.schedule.week(week).ok_or_else(|| {
            BracketError::StructureNotDetected(format!("week {week} of the playoff window is missing"))
        })
    }
}

impl BracketSource for InferredBracket<'_> {
    fn name(&self) -> &'static str {
        "inferred"
    }

    fn build(&self, seeding: &Seeding) -> Result<PlayoffBracket, BracketError> {
        if self.schedule.weeks_in(self.window).next().is_none() {
            return Err(BracketError::Unavailable);
        }

        let mut bracket = PlayoffBracket::new(seeding, BracketOrigin::Inferred);
        let mut contenders: BTreeSet<TeamId> = seeding.seeds().keys().copied().collect();

        // A week that failed to load could hold a round or a final leg, so every week up to
        // the one after the final must be present.
        for week in self.window.weeks() {
            let games = self.week(week)?;
            let round_games: Vec<&Game> = games
                .iter()
                .filter(|g| g.is_valid() && contenders.contains(&g.team_a) && contenders.contains(&g.team_b))
                .collect();
            debug!(week, games = round_games.len(), contenders = contenders.len(), "Scanning playoff week");

            match round_games.len() {
                0 => continue,
                1 if bracket.semifinals.len() == 2 => {
                    let next_week = match week + 1 {
                        next if self.window.contains(next) => Some((next, self.week(next)?)),
                        _ => None,
                    };
                    read_final(&mut bracket, (week, games), round_games[0], next_week)?;
                    return Ok(bracket);
                }
                n if n >= 2 && bracket.semifinals.is_empty() => {
                    let round = if seeding.len() > 4 && bracket.quarterfinals.is_empty() {
                        Round::Quarterfinal
                    } else {
                        Round::Semifinal
                    };
                    if round == Round::Semifinal && n != 2 {
                        return Err(irregular(week, n));
                    }

                    let decided = round_games
                        .iter()
                        .map(|g| scored(round, vec![week], g))
                        .collect::<Result<Vec<_>, _>>()?;
                    for game in &decided {
                        contenders.remove(&game.loser_id);
                    }
                    match round {
                        Round::Quarterfinal => bracket.quarterfinals = decided,
                        _ => bracket.semifinals = decided,
                    }
                    bracket.weeks.push(week);
                }
                n => return Err(irregular(week, n)),
            }
        }

        if bracket.semifinals.is_empty() && bracket.quarterfinals.is_empty() {
            return Err(BracketError::StructureNotDetected(format!(
                "no playoff games between seeded teams in {}",
                self.window
            )));
        }
        // Final not played yet; validation rejects the bracket
        Ok(bracket)
    }
}

fn irregular(week: Week, games: usize) -> BracketError {
    BracketError::StructureNotDetected(format!(
        "week {week} has {games} games between contending teams"
    ))
}

fn scored(round: Round, weeks: Vec<Week>, game: &Game) -> Result<BracketGame, BracketError> {
    BracketGame::from_scores(round, weeks, (game.team_a, game.score_a), (game.team_b, game.score_b))
}

fn same_pair(a: &Game, b: &Game) -> bool {
    a.involves(b.team_a) && a.involves(b.team_b)
}

/// Read the championship, and the third-place result when one was played.
///
/// The same pair meeting again the following week makes it a two-week aggregate final.
fn read_final(
    bracket: &mut PlayoffBracket,
    (week, games): (Week, &[Game]),
    final_game: &Game,
    next_week: Option<(Week, &[Game])>,
) -> Result<(), BracketError> {
    let losers: Vec<TeamId> = bracket.semifinals.iter().map(|g| g.loser_id).collect();

    let second_leg = next_week.and_then(|(next, next_games)| {
        next_games
            .iter()
            .find(|g| g.is_valid() && same_pair(g, final_game))
            .map(|g| (next, next_games, g))
    });

    match second_leg {
        Some((next, next_games, leg)) => {
            let weeks = vec![week, next];
            let total = |team: TeamId| {
                final_game.score_of(team).unwrap_or(0.0) + leg.score_of(team).unwrap_or(0.0)
            };
            let (team1, team2) = (final_game.team_a, final_game.team_b);
            bracket.championship = Some(BracketGame::from_scores(
                Round::Championship,
                weeks.clone(),
                (team1, total(team1)),
                (team2, total(team2)),
            )?);

            if let [loser1, loser2] = losers[..] {
                let legs = [games, next_games];
                if let (Some(points1), Some(points2)) =
                    (aggregate_points(loser1, &legs), aggregate_points(loser2, &legs))
                {
                    bracket.third_place = Some(BracketGame::from_scores(
                        Round::ThirdPlace,
                        weeks.clone(),
                        (loser1, points1),
                        (loser2, points2),
                    )?);
                }
            }
            bracket.format = BracketFormat::TwoWeekAggregate;
            bracket.weeks.extend(weeks);
        }
        None => {
            bracket.championship = Some(scored(Round::Championship, vec![week], final_game)?);
            bracket.third_place = match losers[..] {
                [loser1, loser2] => games
                    .iter()
                    .find(|g| g.is_valid() && g.involves(loser1) && g.involves(loser2))
                    .map(|g| scored(Round::ThirdPlace, vec![week], g))
                    .transpose()?,
                _ => None,
            };
            bracket.format = BracketFormat::SingleGameFinal;
            bracket.weeks.push(week);
        }
    }

    bracket.has_third_place = bracket.third_place.is_some();
    Ok(())
}

/// A team's points summed over every leg it played in
fn aggregate_points(team: TeamId, legs: &[&[Game]]) -> Option<f64> {
    let points: Vec<f64> = legs
        .iter()
        .filter_map(|games| {
            games
                .iter()
                .filter(|g| g.is_valid())
                .find_map(|g| g.score_of(team))
        })
        .collect();
    (!points.is_empty()).then(|| points.iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::validate;

    fn seeding() -> Seeding {
        Seeding::from_teams(&[1, 2, 3, 4, 5, 6])
    }

    /// Six-team bracket: 3 and 5 win quarterfinals, 1 and 3 win semifinals
    fn through_semifinals() -> Vec<(Week, Vec<Game>)> {
        vec![
            (
                15,
                vec![
                    Game::new(15, 3, 120.0, 6, 100.0),
                    Game::new(15, 4, 90.0, 5, 95.0),
                    // Consolation game against a non-playoff team
                    Game::new(15, 1, 80.0, 7, 85.0),
                ],
            ),
            (
                16,
                vec![
                    Game::new(16, 1, 130.0, 5, 110.0),
                    Game::new(16, 2, 100.0, 3, 104.0),
                    Game::new(16, 4, 90.0, 6, 70.0),
                ],
            ),
        ]
    }

    #[test]
    fn single_game_final_with_third_place() {
        let mut weeks = through_semifinals();
        weeks.push((
            17,
            vec![Game::new(17, 1, 101.0, 3, 117.0), Game::new(17, 5, 99.0, 2, 88.0)],
        ));
        let schedule: Schedule = weeks.into_iter().collect();
        let bracket = InferredBracket::new(&schedule, WeekRange::new(15, 17)).build(&seeding()).unwrap();

        assert_eq!(bracket.quarterfinals.len(), 2);
        assert_eq!(bracket.semifinals.len(), 2);
        assert_eq!(bracket.champion(), Some(3));
        assert_eq!(bracket.third_place.as_ref().map(|g| g.winner_id), Some(5));
        assert_eq!(bracket.format, BracketFormat::SingleGameFinal);
        assert_eq!(bracket.weeks, vec![15, 16, 17]);
        assert_eq!(validate(&bracket, 6), Ok(()));
    }

    #[test]
    fn two_week_final_sums_scores() {
        let mut weeks = through_semifinals();
        weeks.push((
            17,
            vec![Game::new(17, 1, 50.0, 3, 55.0), Game::new(17, 2, 70.0, 8, 60.0), Game::new(17, 5, 80.0, 9, 75.0)],
        ));
        weeks.push((
            18,
            vec![Game::new(18, 3, 40.0, 1, 60.0), Game::new(18, 5, 66.0, 2, 90.0)],
        ));
        let schedule: Schedule = weeks.into_iter().collect();
        let bracket = InferredBracket::new(&schedule, WeekRange::new(15, 18)).build(&seeding()).unwrap();

        let championship = bracket.championship.as_ref().unwrap();
        assert_eq!(championship.team1_id, 1);
        assert_eq!(championship.team1_score, Some(110.0));
        assert_eq!(championship.team2_score, Some(95.0));
        assert_eq!(championship.winner_id, 1);
        assert_eq!(championship.weeks, vec![17, 18]);

        // Semifinal losers 5 and 2: 80 + 66 against 70 + 90
        let third = bracket.third_place.as_ref().unwrap();
        assert_eq!((third.winner_id, third.loser_id), (2, 5));
        assert_eq!(bracket.format, BracketFormat::TwoWeekAggregate);
        assert!(bracket.has_third_place);
        assert_eq!(validate(&bracket, 6), Ok(()));
    }

    #[test]
    fn four_team_bracket_has_no_quarterfinals() {
        let schedule: Schedule = vec![
            (15, vec![Game::new(15, 1, 100.0, 4, 90.0), Game::new(15, 2, 100.0, 3, 110.0)]),
            (16, vec![Game::new(16, 1, 100.0, 3, 90.0)]),
            (17, vec![]),
        ]
        .into_iter()
        .collect();
        let seeding = Seeding::from_teams(&[1, 2, 3, 4]);
        let bracket = InferredBracket::new(&schedule, WeekRange::new(15, 17)).build(&seeding).unwrap();

        assert!(bracket.quarterfinals.is_empty());
        assert_eq!(bracket.champion(), Some(1));
        assert!(!bracket.has_third_place);
        assert_eq!(validate(&bracket, 4), Ok(()));
    }

    #[test]
    fn missing_week_inside_playoffs_is_not_detected() {
        let mut weeks = through_semifinals();
        weeks.push((18, vec![Game::new(18, 1, 101.0, 3, 117.0)]));
        let schedule: Schedule = weeks.into_iter().collect();
        let result = InferredBracket::new(&schedule, WeekRange::new(15, 18)).build(&seeding());
        assert!(matches!(result, Err(BracketError::StructureNotDetected(_))));
    }

    #[test]
    fn missing_second_leg_is_not_read_as_single_final() {
        let mut weeks = through_semifinals();
        weeks.push((17, vec![Game::new(17, 1, 50.0, 3, 55.0)]));
        let schedule: Schedule = weeks.into_iter().collect();
        let result = InferredBracket::new(&schedule, WeekRange::new(15, 18)).build(&seeding());
        assert!(matches!(result, Err(BracketError::StructureNotDetected(_))));
    }

    #[test]
    fn final_on_last_window_week_needs_no_following_week() {
        let mut weeks = through_semifinals();
        weeks.push((17, vec![Game::new(17, 1, 50.0, 3, 55.0)]));
        let schedule: Schedule = weeks.into_iter().collect();
        let bracket = InferredBracket::new(&schedule, WeekRange::new(15, 17)).build(&seeding()).unwrap();
        assert_eq!(bracket.champion(), Some(3));
        assert_eq!(bracket.format, BracketFormat::SingleGameFinal);
    }

    #[test]
    fn irregular_schedule_is_not_detected() {
        let schedule: Schedule = vec![(15, vec![Game::new(15, 1, 100.0, 2, 90.0)])]
            .into_iter()
            .collect();
        let result = InferredBracket::new(&schedule, WeekRange::new(15, 18)).build(&seeding());
        assert!(matches!(result, Err(BracketError::StructureNotDetected(_))));
    }

    #[test]
    fn unfinished_playoffs_fail_validation() {
        let schedule: Schedule = through_semifinals().into_iter().collect();
        let bracket = InferredBracket::new(&schedule, WeekRange::new(15, 16)).build(&seeding()).unwrap();
        assert!(bracket.championship.is_none());
        assert!(validate(&bracket, 6).is_err());
    }

    #[test]
    fn no_playoff_data_is_unavailable() {
        let schedule = Schedule::new();
        let result = InferredBracket::new(&schedule, WeekRange::new(15, 18)).build(&seeding());
        assert_eq!(result.unwrap_err(), BracketError::Unavailable);
    }
}
