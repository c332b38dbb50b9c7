//! Memory-matching minigame over law terms.
//!
//! Cards are dealt face-down from a set of `(term, counterpart)` pairs. Two
//! cards match when they come from the same pair.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::MatchingError;

/// Points awarded per matched pair.
pub const MATCH_POINTS: u32 = 10;
pub const MIN_PAIRS: usize = 5;
pub const MAX_PAIRS: usize = 10;

/// Built-in term pairs for the law-review board.
pub const LAW_TERMS: [(&str, &str); 10] = [
    ("Executive", "Enforces Law"),
    ("Legislative", "Makes Law"),
    ("Judiciary", "Interprets Law"),
    ("Corazon Aquino", "1st President (5th Rep)"),
    ("Fidel Ramos", "Philippines 2000"),
    ("Joseph Estrada", "Erap Para sa Mahirap"),
    ("Gloria Arroyo", "Strong Republic"),
    ("Rodrigo Duterte", "Build Build Build"),
    ("Bill of Rights", "Article III"),
    ("Suffrage", "Right to Vote"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCard {
    pair: usize,
    label: String,
}

impl MatchCard {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Index of the pair this card belongs to.
    #[must_use]
    pub fn pair(&self) -> usize {
        self.pair
    }
}

/// What a `reveal` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Out of range, already face-up, or two cards already showing.
    Ignored,
    /// First card of a turn flipped.
    Flipped,
    Matched,
    /// Both cards stay revealed until `conceal`.
    Mismatched,
}

#[derive(Debug, Clone)]
pub struct MatchingGame {
    pairs: Vec<(String, String)>,
    cards: Vec<MatchCard>,
    revealed: Vec<usize>,
    matched: Vec<bool>,
    score: u32,
}

impl MatchingGame {
    /// Deal a board from the built-in law terms.
    #[must_use]
    pub fn law_terms() -> Self {
        let pairs = LAW_TERMS
            .iter()
            .map(|(term, counterpart)| ((*term).to_string(), (*counterpart).to_string()))
            .collect();
        let mut game = Self::empty(pairs);
        game.new_game();
        game
    }

    /// Deal a board from custom pairs.
    ///
    /// # Errors
    ///
    /// Returns `MatchingError::NoPairs` if `pairs` is empty.
    pub fn new(pairs: Vec<(String, String)>) -> Result<Self, MatchingError> {
        Self::new_with_rng(pairs, &mut rand::rng())
    }

    /// `new` with a caller-supplied random source.
    ///
    /// # Errors
    ///
    /// Returns `MatchingError::NoPairs` if `pairs` is empty.
    pub fn new_with_rng<R: Rng + ?Sized>(
        pairs: Vec<(String, String)>,
        rng: &mut R,
    ) -> Result<Self, MatchingError> {
        if pairs.is_empty() {
            return Err(MatchingError::NoPairs);
        }
        let mut game = Self::empty(pairs);
        game.new_game_with_rng(rng);
        Ok(game)
    }

    fn empty(pairs: Vec<(String, String)>) -> Self {
        Self {
            pairs,
            cards: Vec::new(),
            revealed: Vec::new(),
            matched: Vec::new(),
            score: 0,
        }
    }

    /// Redeal with a fresh pair count and order, resetting the score.
    pub fn new_game(&mut self) {
        self.new_game_with_rng(&mut rand::rng());
    }

    pub fn new_game_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let max = MAX_PAIRS.min(self.pairs.len());
        let min = MIN_PAIRS.min(max);
        let count = rng.random_range(min..=max);

        let mut cards: Vec<MatchCard> = self
            .pairs
            .iter()
            .take(count)
            .enumerate()
            .flat_map(|(pair, (term, counterpart))| {
                [
                    MatchCard {
                        pair,
                        label: term.clone(),
                    },
                    MatchCard {
                        pair,
                        label: counterpart.clone(),
                    },
                ]
            })
            .collect();
        cards.shuffle(rng);

        self.matched = vec![false; cards.len()];
        self.cards = cards;
        self.revealed.clear();
        self.score = 0;
    }

    /// Flip the card at `index`.
    pub fn reveal(&mut self, index: usize) -> RevealOutcome {
        if index >= self.cards.len()
            || self.revealed.len() == 2
            || self.revealed.contains(&index)
            || self.matched[index]
        {
            return RevealOutcome::Ignored;
        }
        self.revealed.push(index);

        let [first, second] = self.revealed[..] else {
            return RevealOutcome::Flipped;
        };
        if self.cards[first].pair == self.cards[second].pair {
            self.matched[first] = true;
            self.matched[second] = true;
            self.revealed.clear();
            self.score = self.score.saturating_add(MATCH_POINTS);
            RevealOutcome::Matched
        } else {
            RevealOutcome::Mismatched
        }
    }

    /// Turn unmatched revealed cards face-down again.
    pub fn conceal(&mut self) {
        self.revealed.clear();
    }

    #[must_use]
    pub fn cards(&self) -> &[MatchCard] {
        &self.cards
    }

    #[must_use]
    pub fn is_face_up(&self, index: usize) -> bool {
        self.revealed.contains(&index) || self.matched.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn is_matched(&self, index: usize) -> bool {
        self.matched.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    #[must_use]
    pub fn pairs_matched(&self) -> usize {
        self.matched.iter().filter(|m| **m).count() / 2
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.cards.is_empty() && self.matched.iter().all(|m| *m)
    }
}
