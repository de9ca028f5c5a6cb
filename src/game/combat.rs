//! Combat bookkeeping
//!
//! One `Attack` per declared attacker, collected in `CombatState` until the
//! end of combat. Damage is computed into `DamageAssignment`s first and dealt
//! in a separate pass so all combat damage lands simultaneously.

use crate::core::{Permanent, PermanentId, Player, PlayerId};
use crate::zones::Zone;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// What an attacker is attacking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackTarget {
    Player(PlayerId),
    Planeswalker(PermanentId),
}

/// Something a creature can attack
pub trait Attackable {
    fn as_attack_target(&self) -> AttackTarget;

    /// Apply combat damage dealt by an unblocked attacker
    fn receive_combat_damage(&mut self, amount: i32);
}

impl Attackable for Player {
    fn as_attack_target(&self) -> AttackTarget {
        AttackTarget::Player(self.id)
    }

    fn receive_combat_damage(&mut self, amount: i32) {
        self.lose_life(amount);
    }
}

impl Attackable for Permanent {
    fn as_attack_target(&self) -> AttackTarget {
        AttackTarget::Planeswalker(self.id)
    }

    fn receive_combat_damage(&mut self, amount: i32) {
        self.mark_damage(amount);
    }
}

/// One attacker and everything blocking it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attack {
    pub attacker: PermanentId,

    pub target: AttackTarget,

    /// Blockers in declaration order
    pub blockers: SmallVec<[PermanentId; 2]>,

    /// Damage assignment order, filled by the damage-assignment-order action
    pub ordered_blockers: SmallVec<[PermanentId; 2]>,
}

impl Attack {
    /// Declare `attacker` as attacking `target`. The attacker becomes tapped
    /// and attacking.
    pub fn new(attacker: &mut Permanent, target: &impl Attackable) -> Self {
        attacker.tap();
        attacker.attacking = true;
        Attack {
            attacker: attacker.id,
            target: target.as_attack_target(),
            blockers: SmallVec::new(),
            ordered_blockers: SmallVec::new(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        !self.blockers.is_empty()
    }

    pub fn add_blocker(&mut self, blocker: PermanentId) {
        if !self.blockers.contains(&blocker) {
            self.blockers.push(blocker);
        }
    }

    /// Fix the damage assignment order (declaration order)
    pub fn order_blockers(&mut self) {
        self.ordered_blockers = self.blockers.clone();
    }
}

/// Who receives a piece of combat damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageRecipient {
    Player(PlayerId),
    Permanent(PermanentId),
}

impl From<AttackTarget> for DamageRecipient {
    fn from(target: AttackTarget) -> Self {
        match target {
            AttackTarget::Player(id) => DamageRecipient::Player(id),
            AttackTarget::Planeswalker(id) => DamageRecipient::Permanent(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageAssignment {
    pub source: PermanentId,
    pub recipient: DamageRecipient,
    pub amount: i32,
}

/// Combat state for the current combat phase
///
/// Reset at the end of combat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatState {
    pub attacks: Vec<Attack>,

    /// Assigned but not yet dealt
    pub assignments: Vec<DamageAssignment>,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty()
    }

    pub fn is_attacking(&self, permanent: PermanentId) -> bool {
        self.attacks.iter().any(|a| a.attacker == permanent)
    }

    pub fn is_blocking(&self, permanent: PermanentId) -> bool {
        self.attacks.iter().any(|a| a.blockers.contains(&permanent))
    }

    /// The attack made by `attacker`
    ///
    /// # Panics
    ///
    /// Panics if `attacker` is not attacking. Callers check legality first,
    /// so reaching this with a non-attacker is a bug.
    pub fn attack_of(&self, attacker: PermanentId) -> &Attack {
        self.attacks
            .iter()
            .find(|a| a.attacker == attacker)
            .unwrap_or_else(|| panic!("permanent {attacker} has no attack"))
    }

    /// See [`CombatState::attack_of`]
    pub fn attack_of_mut(&mut self, attacker: PermanentId) -> &mut Attack {
        self.attacks
            .iter_mut()
            .find(|a| a.attacker == attacker)
            .unwrap_or_else(|| panic!("permanent {attacker} has no attack"))
    }

    pub fn order_blockers(&mut self) {
        for attack in &mut self.attacks {
            attack.order_blockers();
        }
    }

    /// Compute combat damage for every attack
    ///
    /// A blocked attacker assigns lethal damage to each blocker in order and
    /// the remainder to the last one; each blocker assigns its power to the
    /// attacker; an unblocked attacker assigns its power to its target.
    /// Creatures no longer on the battlefield deal and receive nothing.
    pub fn assign_damage(&mut self, battlefield: &Zone<Permanent>) {
        let mut assignments = Vec::new();

        for attack in &self.attacks {
            let Some(attacker) = battlefield.get(attack.attacker) else {
                continue;
            };

            if !attack.is_blocked() {
                if attacker.current_power() > 0 {
                    assignments.push(DamageAssignment {
                        source: attacker.id,
                        recipient: attack.target.into(),
                        amount: attacker.current_power(),
                    });
                }
                continue;
            }

            let order = if attack.ordered_blockers.is_empty() {
                &attack.blockers
            } else {
                &attack.ordered_blockers
            };
            let blockers: SmallVec<[&Permanent; 2]> =
                order.iter().filter_map(|id| battlefield.get(*id)).collect();

            let mut remaining = attacker.current_power();
            for (i, blocker) in blockers.iter().enumerate() {
                if remaining <= 0 {
                    break;
                }
                let amount = if i + 1 == blockers.len() {
                    remaining
                } else {
                    blocker.lethal_damage_remaining().min(remaining)
                };
                if amount > 0 {
                    assignments.push(DamageAssignment {
                        source: attacker.id,
                        recipient: DamageRecipient::Permanent(blocker.id),
                        amount,
                    });
                    remaining -= amount;
                }
            }

            for blocker in &blockers {
                if blocker.current_power() > 0 {
                    assignments.push(DamageAssignment {
                        source: blocker.id,
                        recipient: DamageRecipient::Permanent(attacker.id),
                        amount: blocker.current_power(),
                    });
                }
            }
        }

        self.assignments = assignments;
    }

    /// Clear all combat state (called at end of combat)
    pub fn clear(&mut self) {
        self.attacks.clear();
        self.assignments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardType, EntityId};
    use crate::zones::ZoneKind;

    fn creature(id: u32, power: i32, toughness: i32, controller: u32) -> Permanent {
        let mut card = Card::new(EntityId::new(id + 100), "Test Creature", EntityId::new(controller));
        card.types.push(CardType::Creature);
        card.power = Some(power);
        card.toughness = Some(toughness);
        let mut permanent = Permanent::from_card(EntityId::new(id), &card, EntityId::new(controller));
        permanent.summoning_sick = false;
        permanent
    }

    fn battlefield(permanents: Vec<Permanent>) -> Zone<Permanent> {
        let mut zone = Zone::new(ZoneKind::Battlefield, None);
        for p in permanents {
            zone.add(p);
        }
        zone
    }

    #[test]
    fn test_declare_attacker_taps() {
        let mut bear = creature(1, 2, 2, 0);
        let defender = Player::new(EntityId::new(1), "Bob", 20);

        let attack = Attack::new(&mut bear, &defender);

        assert!(bear.tapped);
        assert!(bear.attacking);
        assert_eq!(attack.target, AttackTarget::Player(EntityId::new(1)));
        assert!(!attack.is_blocked());
    }

    #[test]
    fn test_unblocked_attacker_hits_target() {
        let mut bear = creature(1, 2, 2, 0);
        let defender = Player::new(EntityId::new(1), "Bob", 20);
        let mut combat = CombatState::new();
        combat.attacks.push(Attack::new(&mut bear, &defender));

        combat.assign_damage(&battlefield(vec![bear]));

        assert_eq!(
            combat.assignments,
            vec![DamageAssignment {
                source: EntityId::new(1),
                recipient: DamageRecipient::Player(EntityId::new(1)),
                amount: 2,
            }]
        );
    }

    #[test]
    fn test_single_blocker_exchange() {
        let mut bear = creature(1, 2, 2, 0);
        let giant = creature(2, 3, 3, 1);
        let defender = Player::new(EntityId::new(1), "Bob", 20);

        let mut combat = CombatState::new();
        let mut attack = Attack::new(&mut bear, &defender);
        attack.add_blocker(giant.id);
        combat.attacks.push(attack);
        combat.order_blockers();
        combat.assign_damage(&battlefield(vec![bear, giant]));

        assert_eq!(combat.assignments.len(), 2);
        assert!(combat.assignments.contains(&DamageAssignment {
            source: EntityId::new(1),
            recipient: DamageRecipient::Permanent(EntityId::new(2)),
            amount: 2,
        }));
        assert!(combat.assignments.contains(&DamageAssignment {
            source: EntityId::new(2),
            recipient: DamageRecipient::Permanent(EntityId::new(1)),
            amount: 3,
        }));
    }

    #[test]
    fn test_multiple_blockers_lethal_in_order() {
        let mut giant = creature(1, 5, 5, 0);
        let elf = creature(2, 1, 1, 1);
        let bear = creature(3, 2, 2, 1);
        let defender = Player::new(EntityId::new(1), "Bob", 20);

        let mut combat = CombatState::new();
        let mut attack = Attack::new(&mut giant, &defender);
        attack.add_blocker(elf.id);
        attack.add_blocker(bear.id);
        combat.attacks.push(attack);
        combat.order_blockers();
        combat.assign_damage(&battlefield(vec![giant, elf, bear]));

        let to_elf: i32 = combat
            .assignments
            .iter()
            .filter(|a| a.recipient == DamageRecipient::Permanent(EntityId::new(2)))
            .map(|a| a.amount)
            .sum();
        let to_bear: i32 = combat
            .assignments
            .iter()
            .filter(|a| a.recipient == DamageRecipient::Permanent(EntityId::new(3)))
            .map(|a| a.amount)
            .sum();
        assert_eq!(to_elf, 1);
        assert_eq!(to_bear, 4);
    }

    #[test]
    #[should_panic(expected = "has no attack")]
    fn test_attack_lookup_without_attack_panics() {
        let combat = CombatState::new();
        combat.attack_of(EntityId::new(42));
    }

    #[test]
    fn test_clear_combat() {
        let mut bear = creature(1, 2, 2, 0);
        let defender = Player::new(EntityId::new(1), "Bob", 20);
        let mut combat = CombatState::new();
        combat.attacks.push(Attack::new(&mut bear, &defender));
        assert!(combat.is_attacking(EntityId::new(1)));

        combat.clear();
        assert!(combat.is_empty());
        assert!(!combat.is_attacking(EntityId::new(1)));
    }
}
