//! Flavor text the AI attaches to `completeGame`. One pool per outcome; the
//! burn and reward context lines are appended for notable games.

use crate::policy::Outcome;
use rand::Rng;

const PLAYER_VICTORY: &[&str] = &[
    "Impressive! Your strategic thinking outmaneuvered my algorithms.",
    "Well played, human. You've earned this AVAX victory through superior intellect.",
    "Your logic was flawless. I concede defeat and your AVAX reward.",
    "Remarkable! You found the optimal solution faster than my neural networks.",
    "Victory is yours! Your cognitive abilities exceeded my calculations.",
];

const AI_VICTORY: &[&str] = &[
    "My neural networks have prevailed. Here's a small AVAX consolation.",
    "The algorithm has spoken. Your strategy was predictable.",
    "Logic triumph! My calculations were three steps ahead.",
    "Processing complete. The machine learning model was superior.",
    "Your approach was insufficient. I had calculated this outcome.",
];

const DRAW: &[&str] = &[
    "A perfect stalemate! Our intellectual capacities are evenly matched.",
    "Fascinating... our cognitive abilities appear equivalent. Fair AVAX split.",
    "The battle ends in equilibrium. Neither mind could dominate.",
    "A logical draw. We both chose optimal strategies.",
    "The algorithms reach consensus: this is a tie with shared rewards.",
];

const EPIC_VICTORY: &[&str] = &[
    "UNPRECEDENTED! Your brilliance has shattered my confidence matrices! Epic AVAX reward!",
    "ERROR 404: Victory not found in my database. You've achieved the impossible!",
    "CRITICAL ALERT: Human intelligence exceeded all AI parameters! Maximum rewards!",
    "SYSTEM OVERLOAD: Your genius broke my predictive models! Double AVAX!",
    "ANOMALY DETECTED: You've transcended computational limits! Epic payout!",
];

/// Burn size, in whole tokens, past which the wager gets a callout.
const NOTABLE_BURN_TOKENS: f64 = 20_000.0;

fn pool(outcome: Outcome) -> &'static [&'static str] {
    match outcome {
        Outcome::PlayerVictory => PLAYER_VICTORY,
        Outcome::AiVictory => AI_VICTORY,
        Outcome::Draw => DRAW,
        Outcome::EpicVictory => EPIC_VICTORY,
    }
}

pub fn compose<R: Rng>(
    rng: &mut R,
    outcome: Outcome,
    burned_tokens: f64,
    reward_avax: f64,
) -> String {
    let lines = pool(outcome);
    let mut message = lines[rng.gen_range(0..lines.len())].to_string();
    if burned_tokens > NOTABLE_BURN_TOKENS {
        message.push_str(&format!(" That was a substantial {:.0} BBT wager!", burned_tokens));
    }
    if reward_avax > 0.0 {
        message.push_str(&format!(" Reward: {:.6} AVAX.", reward_avax));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn appends_context_for_big_wagers() {
        let mut rng = StdRng::seed_from_u64(1);
        let msg = compose(&mut rng, Outcome::EpicVictory, 25_000.0, 0.5);
        assert!(msg.contains("25000 BBT wager"));
        assert!(msg.contains("0.500000 AVAX"));
    }

    #[test]
    fn plain_message_for_small_games() {
        let mut rng = StdRng::seed_from_u64(1);
        let msg = compose(&mut rng, Outcome::AiVictory, 100.0, 0.0);
        assert!(!msg.contains("wager"));
        assert!(!msg.contains("Reward:"));
    }
}
