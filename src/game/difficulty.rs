use crate::config::DifficultyTier;
use crate::error::GameError;
use anyhow::Result;

/// Ascending score tiers. The first tier whose bound is above the score wins.
#[derive(Debug, Clone)]
pub struct DifficultyTable {
    bounded: Vec<DifficultyTier>,
    // catches every score past the last bound
    open: DifficultyTier,
}

impl DifficultyTable {
    /// `tiers` must end with an unbounded tier so every score has a match
    pub fn new(mut tiers: Vec<DifficultyTier>) -> Result<Self> {
        match tiers.pop() {
            Some(open) if open.below.is_none() => Ok(DifficultyTable {
                bounded: tiers,
                open,
            }),
            _ => Err(GameError::InvalidArgument(
                "difficulty table needs a final unbounded tier".to_string(),
            )
            .into()),
        }
    }

    pub fn select(&self, score: f64) -> &DifficultyTier {
        self.bounded
            .iter()
            .find(|tier| tier.below.map_or(true, |below| score < below))
            .unwrap_or(&self.open)
    }
}
