use std::collections::BTreeMap;

use cosmwasm_std::{Addr, Decimal};

/// Full allocation scale: 10,000 basis points = 100%.
pub const VOTE_SCALE: u32 = 10_000;

/// Allocation index reserved for "keep current basket weights".
pub const NO_CHANGE_SLOT: usize = 0;

/// A single votable slot: either the reserved no-change option or a
/// whitelisted candidate token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOption {
    NoChange,
    Candidate(Addr),
}

/// Raw per-slot vote weights as accumulated by a voter, before scaling.
///
/// Purely in-memory: the contract builds one per `PlaceVotes` call and
/// discards it after the allocation is computed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoteSlots {
    pub no_change: u32,
    pub candidates: BTreeMap<Addr, u32>,
}

impl VoteSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `clicks` to a slot, creating it if absent.
    pub fn add(&mut self, option: &VoteOption, clicks: u32) {
        match option {
            VoteOption::NoChange => self.no_change += clicks,
            VoteOption::Candidate(addr) => {
                *self.candidates.entry(addr.clone()).or_default() += clicks;
            }
        }
    }

    pub fn increment(&mut self, option: &VoteOption) {
        self.add(option, 1);
    }

    /// Removes one click from a slot, never going below zero.
    pub fn decrement(&mut self, option: &VoteOption) {
        match option {
            VoteOption::NoChange => self.no_change = self.no_change.saturating_sub(1),
            VoteOption::Candidate(addr) => {
                if let Some(clicks) = self.candidates.get_mut(addr) {
                    *clicks = clicks.saturating_sub(1);
                }
            }
        }
    }

    pub fn clicks(&self, option: &VoteOption) -> u32 {
        match option {
            VoteOption::NoChange => self.no_change,
            VoteOption::Candidate(addr) => self.candidates.get(addr).copied().unwrap_or_default(),
        }
    }

    pub fn total_clicks(&self) -> u64 {
        u64::from(self.no_change)
            + self
                .candidates
                .values()
                .map(|clicks| u64::from(*clicks))
                .sum::<u64>()
    }

    /// Share of a slot in the total click count, for display. Zero when no
    /// clicks exist anywhere, never a division by zero.
    pub fn percentage_of(&self, option: &VoteOption) -> Decimal {
        let total = self.total_clicks();
        if total == 0 {
            return Decimal::zero();
        }

        Decimal::from_ratio(self.clicks(option), total)
    }

    /// Scales the click counts into a basis-point allocation summing to
    /// exactly [`VOTE_SCALE`].
    ///
    /// Index 0 is the no-change slot; `ordered_candidates[i]` lands at index
    /// `i + 1`. Each slot receives the floor of its proportional share, and
    /// the rounding shortfall is added to the no-change slot, so the result
    /// is deterministic and reproducible. With no clicks at all, the full
    /// scale goes to no-change.
    pub fn to_allocation(&self, ordered_candidates: &[Addr]) -> Vec<u32> {
        let total = self.total_clicks();
        let mut allocation = vec![0u32; ordered_candidates.len() + 1];

        if total == 0 {
            allocation[NO_CHANGE_SLOT] = VOTE_SCALE;
            return allocation;
        }

        allocation[NO_CHANGE_SLOT] = scaled_floor(self.no_change, total);
        for (index, candidate) in ordered_candidates.iter().enumerate() {
            let clicks = self.candidates.get(candidate).copied().unwrap_or_default();
            allocation[index + 1] = scaled_floor(clicks, total);
        }

        let assigned: u32 = allocation.iter().sum();
        allocation[NO_CHANGE_SLOT] += VOTE_SCALE.saturating_sub(assigned);

        allocation
    }
}

fn scaled_floor(clicks: u32, total_clicks: u64) -> u32 {
    (u64::from(clicks) * u64::from(VOTE_SCALE) / total_clicks) as u32
}
