//! Wrestler model
//!
//! A wrestler is defined by an immutable 10-byte `genes` vector; everything
//! the battle engine needs (attack, defense, max stamina, level, horoscope
//! sign) is a pure function of genes, experience and training boosts. Battle
//! logic only reads genes/experience/boosts and writes training boosts,
//! experience, item and location.
//!
//! # Stat derivation
//!
//! ```text
//! level       = min(8, 1 + isqrt(experience / 100))
//! attack      = 40 + (genes[0] & 63) + 5*level + 4*training.attack
//! defense     = 40 + (genes[1] & 63) + 5*level + 4*training.defense
//! max_stamina = 200 + 4*(genes[2] & 63) + 20*level + 8*training.stamina
//! horoscope   = genes[9] % 12
//! ```
//!
//! All integer arithmetic; no floats anywhere near resolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::params::EngineParams;

/// Maximum wrestler level; Ranked mode requires it
pub const MAX_LEVEL: u32 = 8;

/// Experience ceiling (the level-8 threshold); awards clamp here
pub const MAX_EXPERIENCE: u64 = 4_900;

/// Cap on the sum of the three training boost counters
pub const TRAINING_CAP: u32 = 30;

/// Errors that can occur during wrestler operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WrestlerError {
    #[error("Wrestler {id} is not available (location {location:?})")]
    NotAvailable { id: u64, location: Location },

    #[error("Wrestler {id} has no mojo left")]
    NoMojo { id: u64 },
}

/// Where a wrestler currently is; mutually exclusive, single-owner state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    /// Free: may queue for a match, train, or be traded
    #[default]
    None,
    /// Locked into an active battle
    Battle { battle_id: u64 },
    /// Training at the gym
    Gym,
    /// Listed on the market
    Market,
    /// Resting in a room
    Room,
}

/// The three independent training counters; `sum <= TRAINING_CAP`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrainingBoosts {
    pub attack: u32,
    pub defense: u32,
    pub stamina: u32,
}

impl TrainingBoosts {
    pub fn total(&self) -> u32 {
        self.attack + self.defense + self.stamina
    }

    /// Add `amount` to the counter selected by `slot` (0=attack, 1=defense,
    /// 2=stamina), clamped so the total never exceeds the cap.
    pub fn add_clamped(&mut self, slot: u8, amount: u32) -> u32 {
        let headroom = TRAINING_CAP.saturating_sub(self.total());
        let granted = amount.min(headroom);
        match slot % 3 {
            0 => self.attack += granted,
            1 => self.defense += granted,
            2 => self.stamina += granted,
            _ => unreachable!(),
        }
        granted
    }
}

/// A wrestler record
///
/// # Example
/// ```
/// use battle_engine_core_rs::Wrestler;
///
/// let w = Wrestler::new(1, [60, 30, 50, 0, 0, 0, 0, 0, 0, 4], "El Santo");
/// assert_eq!(w.level(), 1);
/// assert!(w.max_stamina() > 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wrestler {
    id: u64,
    /// Immutable gene vector seeding all derived stats
    genes: [u8; 10],
    /// Monotonic non-decreasing experience
    experience: u64,
    training: TrainingBoosts,
    /// Equipped item reference, if any
    item: Option<u64>,
    location: Location,
    /// Remaining mojo points at `mojo_time`
    mojo: u32,
    /// Ledger time the mojo figure was last trued up
    mojo_time: u64,
    /// Cosmetic fields; the engine never reads them
    name: String,
    mask: u8,
}

impl Wrestler {
    pub fn new(id: u64, genes: [u8; 10], name: &str) -> Self {
        Self {
            id,
            genes,
            experience: 0,
            training: TrainingBoosts::default(),
            item: None,
            location: Location::None,
            mojo: 10,
            mojo_time: 0,
            name: name.to_string(),
            mask: genes[8],
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn genes(&self) -> &[u8; 10] {
        &self.genes
    }

    pub fn experience(&self) -> u64 {
        self.experience
    }

    pub fn training(&self) -> &TrainingBoosts {
        &self.training
    }

    pub fn training_mut(&mut self) -> &mut TrainingBoosts {
        &mut self.training
    }

    pub fn item(&self) -> Option<u64> {
        self.item
    }

    pub fn set_item(&mut self, item: Option<u64>) {
        self.item = item;
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Experience is monotonic: a smaller value is ignored. Clamped to the
    /// max-level ceiling.
    pub fn add_experience(&mut self, amount: u64) -> u64 {
        let target = (self.experience + amount).min(MAX_EXPERIENCE);
        let granted = target - self.experience;
        self.experience = target;
        granted
    }

    /// Level on the square-root-of-XP curve, capped at [`MAX_LEVEL`]
    pub fn level(&self) -> u32 {
        (1 + isqrt(self.experience / 100)).min(MAX_LEVEL as u64) as u32
    }

    pub fn is_max_level(&self) -> bool {
        self.level() == MAX_LEVEL
    }

    /// Base attack stat
    pub fn attack(&self) -> u32 {
        40 + (self.genes[0] & 63) as u32 + 5 * self.level() + 4 * self.training.attack
    }

    /// Base defense stat
    pub fn defense(&self) -> u32 {
        40 + (self.genes[1] & 63) as u32 + 5 * self.level() + 4 * self.training.defense
    }

    /// Maximum stamina
    pub fn max_stamina(&self) -> u32 {
        200 + 4 * (self.genes[2] & 63) as u32 + 20 * self.level() + 8 * self.training.stamina
    }

    /// Horoscope sign (0..12), drives the opponent's training award
    pub fn horoscope(&self) -> u8 {
        self.genes[9] % 12
    }

    /// Mojo available at ledger time `now`, regenerated lazily
    pub fn available_mojo(&self, now: u64, params: &EngineParams) -> u32 {
        let regenerated = if params.mojo_regen_secs == 0 {
            0
        } else {
            (now.saturating_sub(self.mojo_time) / params.mojo_regen_secs) as u32
        };
        (self.mojo + regenerated).min(params.mojo_max)
    }

    /// Spend one mojo point, truing the pool up to `now` first
    pub fn spend_mojo(&mut self, now: u64, params: &EngineParams) -> Result<(), WrestlerError> {
        let available = self.available_mojo(now, params);
        if available == 0 {
            return Err(WrestlerError::NoMojo { id: self.id });
        }
        self.mojo = available - 1;
        self.mojo_time = now;
        Ok(())
    }

    /// Reject use of a wrestler that is not free
    pub fn ensure_available(&self) -> Result<(), WrestlerError> {
        if self.location == Location::None {
            Ok(())
        } else {
            Err(WrestlerError::NotAvailable {
                id: self.id,
                location: self.location,
            })
        }
    }
}

/// Integer square root (floor)
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}
