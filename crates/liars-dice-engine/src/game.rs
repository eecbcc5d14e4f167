//! The match-state engine.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::{
    Bid, Challenge, Die, GameError, Player, PlayerId, PublicPlayer,
    PublicState, FACES, STARTING_DICE,
};

/// All match state for one room.
///
/// The roster is an arena of slots indexed by [`PlayerId`]. Removing a
/// player vacates their slot instead of shifting the others, and
/// elimination is a flag, so turn order is a modular walk over stable
/// indices.
///
/// `R` is the dice source. It defaults to ChaCha20; tests pass a seeded
/// one through [`Game::with_seed`] or [`Game::with_rng`].
#[derive(Debug)]
pub struct Game<R = ChaCha20Rng> {
    slots: Vec<Option<Player>>,
    current_player: PlayerId,
    /// The standing bid and the player who placed it.
    bid: Option<(Bid, PlayerId)>,
    started: bool,
    rng: R,
}

impl Game<ChaCha20Rng> {
    /// Creates an empty match with dice seeded from the thread RNG.
    pub fn new() -> Self {
        Self::with_rng(ChaCha20Rng::from_rng(&mut rand::rng()))
    }

    /// Creates an empty match with a reproducible dice sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha20Rng::seed_from_u64(seed))
    }
}

impl Default for Game<ChaCha20Rng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> Game<R> {
    /// Creates an empty match that rolls dice from `rng`.
    pub fn with_rng(rng: R) -> Self {
        Self {
            slots: Vec::new(),
            current_player: PlayerId(0),
            bid: None,
            started: false,
            rng,
        }
    }

    // -- Roster -------------------------------------------------------------

    /// Seats a new player and returns the id assigned to them.
    ///
    /// Before the round starts the player gets a fresh hand. Once it has
    /// started they are seated as eliminated with no dice and join the next
    /// match after a restart.
    pub fn add_player(&mut self, name: impl Into<String>) -> PlayerId {
        let id = PlayerId(self.slots.len());
        let late = self.started;
        let dice = if late { Vec::new() } else { self.roll(STARTING_DICE) };

        self.slots.push(Some(Player {
            id,
            name: name.into(),
            dice,
            has_lost: late,
        }));

        // The turn may point at a vacated seat if everyone else left.
        if !late && !self.is_active(self.current_player) {
            self.current_player = id;
        }

        tracing::debug!(player = %id, late, "player seated");
        id
    }

    /// Removes a player. Other ids are untouched; unknown ids are ignored.
    ///
    /// If the removed player held the turn, it passes to the next active
    /// player. A standing bid stays on the table even if its bidder left,
    /// but it can then only be raised, not challenged.
    pub fn remove_player(&mut self, id: PlayerId) {
        let Some(slot) = self.slots.get_mut(id.0) else {
            return;
        };
        if slot.take().is_none() {
            return;
        }
        tracing::debug!(player = %id, "player removed");

        if id == self.current_player {
            self.next_player();
        }
    }

    // -- Round lifecycle ----------------------------------------------------

    /// Starts a round: re-rolls every active hand, clears the bid and gives
    /// the turn to the lowest active id.
    pub fn start(&mut self) {
        self.started = true;
        self.bid = None;
        self.current_player = self.first_active().unwrap_or(PlayerId(0));
        self.roll_dice_for_all_players();
        tracing::debug!(first = %self.current_player, "round started");
    }

    /// Re-rolls every active player's hand, keeping its size.
    pub fn roll_dice_for_all_players(&mut self) {
        for index in 0..self.slots.len() {
            let size = match &self.slots[index] {
                Some(player) if player.is_active() => player.dice.len(),
                _ => continue,
            };
            let dice = self.roll(size);
            if let Some(player) = self.slots[index].as_mut() {
                player.dice = dice;
            }
        }
    }

    /// Passes the turn to the next active player and returns their id.
    ///
    /// Walks at most one full lap. With a single active player the walk
    /// returns to them; with none, the turn is left where it was.
    pub fn next_player(&mut self) -> PlayerId {
        let total = self.slots.len();
        let from = self.current_player.0;

        for step in 1..=total {
            let candidate = PlayerId((from + step) % total);
            if self.is_active(candidate) {
                self.current_player = candidate;
                return candidate;
            }
        }

        tracing::warn!(
            current = %self.current_player,
            "no active player to pass the turn to"
        );
        self.current_player
    }

    /// Resets everyone to six fresh dice, revives eliminated players and
    /// returns the match to its pre-start state.
    pub fn restart_game(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].is_none() {
                continue;
            }
            let dice = self.roll(STARTING_DICE);
            if let Some(player) = self.slots[index].as_mut() {
                player.dice = dice;
                player.has_lost = false;
            }
        }
        self.bid = None;
        self.current_player = self.first_active().unwrap_or(PlayerId(0));
        self.started = false;
        tracing::debug!("match restarted");
    }

    /// Returns the winner's name if exactly one player is still active.
    ///
    /// A winner also restarts the match, so callers must treat `Some` as
    /// "the match is over and has been reset".
    pub fn game_over(&mut self) -> Option<String> {
        let name = {
            let mut active = self.players().filter(|p| p.is_active());
            let winner = active.next()?;
            if active.next().is_some() {
                return None;
            }
            winner.name.clone()
        };

        tracing::info!(winner = %name, "match won");
        self.restart_game();
        Some(name)
    }

    // -- Actions ------------------------------------------------------------

    /// Places a bid for the current player and passes the turn.
    ///
    /// # Errors
    /// - [`GameError::NotYourTurn`] if `player` is not the current player
    /// - [`GameError::InvalidBid`] for a zero count or a face outside 1-6
    /// - [`GameError::BidTooLow`] if `count * face` does not beat the
    ///   standing bid
    pub fn make_bid(
        &mut self,
        player: PlayerId,
        count: u32,
        face: Die,
    ) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        let bid = Bid::new(count, face)?;
        if let Some((current, _)) = self.bid {
            if !bid.beats(&current) {
                return Err(GameError::BidTooLow { bid, current });
            }
        }

        self.bid = Some((bid, player));
        tracing::debug!(%player, %bid, "bid placed");
        self.next_player();
        Ok(())
    }

    /// Challenges the standing bid on behalf of the current player.
    ///
    /// The whole table's dice are tallied for the bid's face. If the tally
    /// falls short of the bid the bidder loses a die, otherwise the
    /// challenger does. The bid is cleared, the turn moves on from the
    /// challenger and every active hand is re-rolled.
    ///
    /// # Errors
    /// - [`GameError::NoBidToChallenge`] if no bid is outstanding
    /// - [`GameError::NotYourTurn`] if `player` is not the current player
    /// - [`GameError::NoPreviousBidder`] if whoever placed the bid has left
    ///   or is out of the match; state is left untouched
    pub fn call_liar(
        &mut self,
        player: PlayerId,
    ) -> Result<Challenge, GameError> {
        let (bid, bidder) = self.bid.ok_or(GameError::NoBidToChallenge)?;
        self.ensure_turn(player)?;

        if bidder == player || !self.is_active(bidder) {
            tracing::error!(
                current = %self.current_player,
                %bidder,
                %bid,
                "no previous bidder found"
            );
            return Err(GameError::NoPreviousBidder {
                current: self.current_player,
            });
        }

        let actual = self.count_face(bid.face);
        let loser = if actual < bid.count { bidder } else { player };
        let eliminated = self.take_die(loser);

        self.bid = None;
        self.next_player();
        self.roll_dice_for_all_players();

        tracing::info!(
            challenger = %player,
            %bidder,
            %loser,
            %bid,
            actual,
            eliminated,
            "challenge resolved"
        );

        Ok(Challenge {
            challenger: player,
            bidder,
            loser,
            bid,
            actual,
            eliminated,
        })
    }

    // -- Queries ------------------------------------------------------------

    /// The snapshot that may be shown to every player: dice counts only.
    pub fn public_state(&self) -> PublicState {
        PublicState {
            players: self
                .players()
                .map(|p| PublicPlayer {
                    id: p.id,
                    name: p.name.clone(),
                    dice_count: p.dice.len(),
                    has_lost: p.has_lost,
                })
                .collect(),
            current_player: self.current_player,
            current_bid: self.bid(),
            started: self.started,
        }
    }

    /// One player's own dice. Deliver only to that player.
    ///
    /// # Errors
    /// [`GameError::UnknownPlayer`] if no player holds that seat.
    pub fn player_dice(&self, id: PlayerId) -> Result<&[Die], GameError> {
        self.player(id)
            .map(|p| p.dice.as_slice())
            .ok_or(GameError::UnknownPlayer(id))
    }

    /// Looks up a seated player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Seated players in id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.slots.iter().flatten()
    }

    /// Number of seated players, eliminated or not.
    pub fn player_count(&self) -> usize {
        self.players().count()
    }

    /// Number of players still taking turns.
    pub fn active_count(&self) -> usize {
        self.players().filter(|p| p.is_active()).count()
    }

    /// Dice left on the table.
    pub fn total_dice(&self) -> usize {
        self.players().map(|p| p.dice.len()).sum()
    }

    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    pub fn bid(&self) -> Option<Bid> {
        self.bid.map(|(bid, _)| bid)
    }

    /// Who placed the standing bid.
    pub fn bidder(&self) -> Option<PlayerId> {
        self.bid.map(|(_, bidder)| bidder)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    // -- Internals ----------------------------------------------------------

    fn is_active(&self, id: PlayerId) -> bool {
        self.player(id).is_some_and(Player::is_active)
    }

    fn first_active(&self) -> Option<PlayerId> {
        self.players().find(|p| p.is_active()).map(|p| p.id)
    }

    fn ensure_turn(&self, player: PlayerId) -> Result<(), GameError> {
        if player != self.current_player || !self.is_active(player) {
            return Err(GameError::NotYourTurn {
                player,
                current: self.current_player,
            });
        }
        Ok(())
    }

    fn count_face(&self, face: Die) -> u32 {
        let matching = self
            .players()
            .flat_map(|p| p.dice.iter())
            .filter(|&&die| die == face)
            .count();
        u32::try_from(matching).unwrap_or(u32::MAX)
    }

    /// Removes one die from `id`. Returns `true` if that eliminated them.
    fn take_die(&mut self, id: PlayerId) -> bool {
        let Some(player) = self.slots.get_mut(id.0).and_then(Option::as_mut)
        else {
            return false;
        };
        if player.dice.len() <= 1 {
            player.dice.clear();
            player.has_lost = true;
            true
        } else {
            player.dice.pop();
            false
        }
    }

    fn roll(&mut self, count: usize) -> Vec<Die> {
        (0..count).map(|_| self.rng.random_range(1..=FACES)).collect()
    }
}

// =========================================================================
// Tests
// =========================================================================
