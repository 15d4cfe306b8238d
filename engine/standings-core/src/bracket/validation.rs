use std::collections::BTreeSet;

use super::{BracketFormat, PlayoffBracket};
use crate::error::BracketError;
use crate::types::TeamId;

/// Check that a bracket is complete enough to derive final standings from
pub fn validate(bracket: &PlayoffBracket, expected_teams: usize) -> Result<(), BracketError> {
    if bracket.playoff_teams.len() != expected_teams {
        return Err(BracketError::SeedCountMismatch {
            expected: expected_teams,
            found: bracket.playoff_teams.len(),
        });
    }

    let games = bracket
        .quarterfinals
        .iter()
        .chain(&bracket.semifinals)
        .chain(&bracket.championship)
        .chain(&bracket.third_place);
    for game in games {
        if let Some(team) = game.participants().into_iter().find(|t| !bracket.is_playoff_team(*t)) {
            return Err(BracketError::UnseededTeam(team));
        }
    }

    if expected_teams > 4 && bracket.quarterfinals.len() < 2 {
        return Err(BracketError::MissingRound {
            round: "quarterfinal",
            expected: 2,
            found: bracket.quarterfinals.len(),
        });
    }

    if bracket.semifinals.len() < 2 {
        return Err(BracketError::MissingRound {
            round: "semifinal",
            expected: 2,
            found: bracket.semifinals.len(),
        });
    }

    let Some(championship) = &bracket.championship else {
        return Err(BracketError::ChampionshipCount(0));
    };

    match (bracket.has_third_place, bracket.third_place.is_some()) {
        (true, false) => return Err(BracketError::ThirdPlaceMismatch("missing")),
        (false, true) => return Err(BracketError::ThirdPlaceMismatch("unexpected")),
        _ => {}
    }

    if bracket.format == BracketFormat::SingleGameFinal {
        let winners: BTreeSet<TeamId> = bracket.semifinals.iter().map(|g| g.winner_id).collect();
        let participants: BTreeSet<TeamId> = championship.participants().into_iter().collect();
        if winners != participants {
            return Err(BracketError::ChampionshipParticipants);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{BracketGame, BracketOrigin, Round, Seeding};

    fn bracket() -> PlayoffBracket {
        let seeding = Seeding::from_teams(&[1, 2, 3, 4, 5, 6]);
        let mut bracket = PlayoffBracket::new(&seeding, BracketOrigin::Inferred);
        bracket.quarterfinals = vec![
            BracketGame::from_result(Round::Quarterfinal, 3, 6, 3, 6).unwrap(),
            BracketGame::from_result(Round::Quarterfinal, 4, 5, 4, 5).unwrap(),
        ];
        bracket.semifinals = vec![
            BracketGame::from_result(Round::Semifinal, 1, 4, 1, 4).unwrap(),
            BracketGame::from_result(Round::Semifinal, 2, 3, 2, 3).unwrap(),
        ];
        bracket.championship = BracketGame::from_result(Round::Championship, 1, 2, 2, 1);
        bracket.third_place = BracketGame::from_result(Round::ThirdPlace, 4, 3, 3, 4);
        bracket.has_third_place = true;
        bracket
    }

    #[test]
    fn complete_bracket_is_valid() {
        assert_eq!(validate(&bracket(), 6), Ok(()));
    }

    #[test]
    fn seed_count_must_match_configuration() {
        assert_eq!(
            validate(&bracket(), 8),
            Err(BracketError::SeedCountMismatch { expected: 8, found: 6 })
        );
    }

    #[test]
    fn six_team_bracket_needs_quarterfinals() {
        let mut b = bracket();
        b.quarterfinals.pop();
        assert!(matches!(
            validate(&b, 6),
            Err(BracketError::MissingRound { round: "quarterfinal", found: 1, .. })
        ));
    }

    #[test]
    fn third_place_must_match_flag() {
        let mut b = bracket();
        b.third_place = None;
        assert_eq!(validate(&b, 6), Err(BracketError::ThirdPlaceMismatch("missing")));

        b.has_third_place = false;
        assert_eq!(validate(&b, 6), Ok(()));
    }

    #[test]
    fn bracket_games_must_involve_seeded_teams() {
        let seeding = Seeding::from_teams(&[1, 2, 3, 4]);
        let mut b = PlayoffBracket::new(&seeding, BracketOrigin::Authoritative);
        b.semifinals = vec![
            BracketGame::from_result(Round::Semifinal, 1, 5, 5, 1).unwrap(),
            BracketGame::from_result(Round::Semifinal, 2, 3, 2, 3).unwrap(),
        ];
        b.championship = BracketGame::from_result(Round::Championship, 5, 2, 5, 2);
        assert_eq!(validate(&b, 4), Err(BracketError::UnseededTeam(5)));
    }

    #[test]
    fn championship_must_feature_semifinal_winners() {
        let mut b = bracket();
        b.championship = BracketGame::from_result(Round::Championship, 1, 3, 3, 1);
        assert_eq!(validate(&b, 6), Err(BracketError::ChampionshipParticipants));

        b.format = BracketFormat::TwoWeekAggregate;
        assert_eq!(validate(&b, 6), Ok(()));
    }
}
