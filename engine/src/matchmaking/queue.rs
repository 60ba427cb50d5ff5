//! The matchmaker set and versus challenges
//!
//! Membership is a sorted set of addresses so scan order is identical on
//! every replica. Versus challenges are recorded on the *target* and pruned
//! lazily on read; there is no background sweep.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One pending versus challenge, held on the challenged address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub challenger: String,
    /// Ledger time the challenge was issued
    pub created: u64,
}

/// Matchmaker state: the queue set plus pending versus challenges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchmaker {
    members: BTreeSet<String>,
    /// target address -> challenges directed at it
    challenges: BTreeMap<String, Vec<Challenge>>,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: &str) {
        self.members.insert(address.to_string());
    }

    pub fn remove(&mut self, address: &str) {
        self.members.remove(address);
    }

    pub fn contains(&self, address: &str) -> bool {
        self.members.contains(address)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Queue members in sorted (deterministic) order
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    /// Record a challenge from `challenger` against `target`
    ///
    /// Re-challenging refreshes the creation time instead of duplicating.
    pub fn record_challenge(&mut self, target: &str, challenger: &str, now: u64) {
        let list = self.challenges.entry(target.to_string()).or_default();
        if let Some(existing) = list.iter_mut().find(|c| c.challenger == challenger) {
            existing.created = now;
        } else {
            list.push(Challenge {
                challenger: challenger.to_string(),
                created: now,
            });
        }
    }

    /// Drop expired challenges against `target`, then return the live ones
    pub fn challengers(&mut self, target: &str, now: u64, ttl_secs: u64) -> Vec<Challenge> {
        let Some(list) = self.challenges.get_mut(target) else {
            return Vec::new();
        };
        list.retain(|c| now.saturating_sub(c.created) <= ttl_secs);
        if list.is_empty() {
            self.challenges.remove(target);
            return Vec::new();
        }
        list.clone()
    }

    /// True when `challenger` holds a live challenge against `target`
    pub fn has_challenge(&mut self, target: &str, challenger: &str, now: u64, ttl_secs: u64) -> bool {
        self.challengers(target, now, ttl_secs)
            .iter()
            .any(|c| c.challenger == challenger)
    }

    /// Remove every challenge involving `address`: those directed at it, and
    /// those it issued against anyone else. Called when a match forms or the
    /// account leaves the queue.
    pub fn clear_challenges(&mut self, address: &str) {
        self.challenges.remove(address);
        self.challenges.retain(|_, list| {
            list.retain(|c| c.challenger != address);
            !list.is_empty()
        });
    }
}
