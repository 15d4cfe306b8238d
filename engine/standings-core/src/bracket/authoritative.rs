use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{BracketGame, BracketOrigin, BracketSource, PlayoffBracket, Round, Seeding};
use crate::error::BracketError;
use crate::types::TeamId;

const CHAMPIONSHIP_MARKER: u32 = 1;
const THIRD_PLACE_MARKER: u32 = 3;

/// One game of the platform's winners bracket, as reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBracketGame {
    pub round: u32,
    pub team1: Option<TeamId>,
    pub team2: Option<TeamId>,
    pub winner: Option<TeamId>,
    pub loser: Option<TeamId>,
    /// Placement the game decides, e.g. 1 for the title and 3 for third place
    pub placement: Option<u32>,
}

impl RawBracketGame {
    fn decided(&self, round: Round) -> Option<BracketGame> {
        BracketGame::from_result(round, self.team1?, self.team2?, self.winner?, self.loser?)
    }

    fn is_ignored_placement(&self) -> bool {
        matches!(self.placement, Some(p) if p != CHAMPIONSHIP_MARKER && p != THIRD_PLACE_MARKER)
    }
}

/// Bracket built from the platform's pre-classified bracket games
#[derive(Debug, Clone, Default)]
pub struct AuthoritativeBracket {
    games: Vec<RawBracketGame>,
}

impl AuthoritativeBracket {
    pub fn new(games: Vec<RawBracketGame>) -> Self {
        Self { games }
    }
}

impl BracketSource for AuthoritativeBracket {
    fn name(&self) -> &'static str {
        "authoritative"
    }

    fn build(&self, seeding: &Seeding) -> Result<PlayoffBracket, BracketError> {
        let games: Vec<&RawBracketGame> = self
            .games
            .iter()
            .filter(|g| !g.is_ignored_placement())
            .collect();
        let max_round = games
            .iter()
            .map(|g| g.round)
            .max()
            .ok_or(BracketError::Unavailable)?;

        let mut bracket = PlayoffBracket::new(seeding, BracketOrigin::Authoritative);

        // Final round: markers first, then position for unmarked games
        let final_round: Vec<&RawBracketGame> =
            games.iter().copied().filter(|g| g.round == max_round).collect();
        bracket.has_third_place = final_round.len() > 1;

        let mut championship = final_round
            .iter()
            .find(|g| g.placement == Some(CHAMPIONSHIP_MARKER))
            .copied();
        let mut third_place = final_round
            .iter()
            .find(|g| g.placement == Some(THIRD_PLACE_MARKER))
            .copied();
        for game in final_round.iter().filter(|g| g.placement.is_none()) {
            if championship.is_none() {
                championship = Some(*game);
            } else if third_place.is_none() {
                third_place = Some(*game);
            }
        }

        bracket.championship = championship.and_then(|g| g.decided(Round::Championship));
        bracket.third_place = third_place.and_then(|g| g.decided(Round::ThirdPlace));

        for game in games.iter().filter(|g| g.round < max_round) {
            let round = if game.round + 1 == max_round {
                Round::Semifinal
            } else {
                Round::Quarterfinal
            };
            match game.decided(round) {
                Some(decided) if round == Round::Semifinal => bracket.semifinals.push(decided),
                Some(decided) => bracket.quarterfinals.push(decided),
                None => debug!(round = game.round, "Skipping undecided bracket game"),
            }
        }

        debug!(
            max_round,
            quarterfinals = bracket.quarterfinals.len(),
            semifinals = bracket.semifinals.len(),
            champion = ?bracket.champion(),
            "Read authoritative bracket"
        );
        Ok(bracket)
    }
}
