//! Cost payment tracking
//!
//! A `ManaPayment` is the bookkeeping for one cost a player is in the middle
//! of paying: what the cost is after modifiers, what has already been put
//! towards it, and any non-mana cost that comes with it.

use crate::core::{CardId, Color, ManaMap, PermanentId};
use serde::{Deserialize, Serialize};

/// Non-mana cost paid alongside the mana
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdditionalCost {
    #[default]
    None,
    /// Tap the source permanent ({T})
    Tap,
}

/// What the payment is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentPurpose {
    /// Casting the spell with this card on the stack
    Spell(CardId),
    /// Activating ability `index` of a permanent
    Ability { source: PermanentId, index: usize },
}

/// An in-progress payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaPayment {
    pub purpose: PaymentPurpose,
    pub initial_cost: ManaMap,
    pub increases: Vec<ManaMap>,
    pub reductions: Vec<ManaMap>,
    pub additional: AdditionalCost,
    pub additional_paid: bool,
    pub already_paid: ManaMap,
}

impl ManaPayment {
    pub fn new(purpose: PaymentPurpose, initial_cost: ManaMap) -> Self {
        ManaPayment {
            purpose,
            initial_cost,
            increases: Vec::new(),
            reductions: Vec::new(),
            additional: AdditionalCost::None,
            additional_paid: false,
            already_paid: ManaMap::new(),
        }
    }

    pub fn with_additional(mut self, additional: AdditionalCost) -> Self {
        self.additional = additional;
        self
    }

    /// The cost actually owed: initial + increases - reductions, per color
    pub fn goal(&self) -> ManaMap {
        let mut goal = self.initial_cost;
        for increase in &self.increases {
            goal.add_map(increase);
        }
        for reduction in &self.reductions {
            goal = goal.saturating_sub(reduction);
        }
        goal
    }

    /// Mana still owed
    pub fn remaining(&self) -> ManaMap {
        self.goal().saturating_sub(&self.already_paid)
    }

    /// True when there is nothing left to pay, mana or otherwise
    pub fn is_free(&self) -> bool {
        self.goal().is_empty() && self.additional == AdditionalCost::None
    }

    /// The mana part is paid exactly when what was paid equals the goal
    pub fn is_mana_paid(&self) -> bool {
        self.already_paid == self.goal()
    }

    /// Mana paid and the additional cost, if any, settled
    pub fn is_complete(&self) -> bool {
        self.is_mana_paid() && (self.additional == AdditionalCost::None || self.additional_paid)
    }

    /// Mark the additional cost paid and return it, so the caller can carry
    /// it out on the source
    pub fn pay_additional(&mut self) -> AdditionalCost {
        self.additional_paid = true;
        self.additional
    }

    /// Move mana from `pool` into the payment
    ///
    /// Precedence:
    /// 1. generic cost from colorless mana,
    /// 2. each color from mana of exactly that color,
    /// 3. leftover generic from any remaining colored mana (WUBRG order).
    ///
    /// Whatever is not needed stays in the pool.
    pub fn pay_from_pool(&mut self, pool: &mut ManaMap) {
        let goal = self.goal();

        let owed = goal
            .get(Color::Colorless)
            .saturating_sub(self.already_paid.get(Color::Colorless));
        let paid = pool.remove(Color::Colorless, owed);
        self.already_paid.add(Color::Colorless, paid);

        for color in Color::COLORS {
            let owed = goal.get(color).saturating_sub(self.already_paid.get(color));
            if owed == 0 {
                continue;
            }
            let paid = pool.remove(color, owed);
            self.already_paid.add(color, paid);
        }

        for color in Color::COLORS {
            let owed = goal
                .get(Color::Colorless)
                .saturating_sub(self.already_paid.get(Color::Colorless));
            if owed == 0 {
                break;
            }
            let paid = pool.remove(color, owed);
            self.already_paid.add(Color::Colorless, paid);
        }
    }

    /// Apply freshly produced mana
    ///
    /// The mana lands in the pool and is immediately applied to any unmet part
    /// of the goal. Surplus stays in the pool until the pool is emptied.
    pub fn apply_added_mana(&mut self, added: &ManaMap, pool: &mut ManaMap) {
        pool.add_map(added);
        self.pay_from_pool(pool);
    }

    /// Could `available` cover the mana of this payment, following the same
    /// precedence?
    pub fn can_be_paid_from(&self, available: &ManaMap) -> bool {
        let mut trial = self.clone();
        let mut scratch = *available;
        trial.pay_from_pool(&mut scratch);
        trial.is_mana_paid()
    }
}
