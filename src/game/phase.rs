//! Turn phases and steps
//!
//! A `Turn` owns its five `Phase`s, and each non-main `Phase` owns its
//! `Step`s. All three levels advance through a forward-only cursor and carry
//! running/skipped/repeated flags. A fresh `Turn` is built every round.

use crate::core::PlayerId;
use crate::game::actions::TurnBasedAction;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// Major phases of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseType {
    Beginning,
    PrecombatMain,
    Combat,
    PostcombatMain,
    Ending,
}

impl PhaseType {
    pub const ALL: [PhaseType; 5] = [
        PhaseType::Beginning,
        PhaseType::PrecombatMain,
        PhaseType::Combat,
        PhaseType::PostcombatMain,
        PhaseType::Ending,
    ];

    pub fn is_main(&self) -> bool {
        matches!(self, PhaseType::PrecombatMain | PhaseType::PostcombatMain)
    }

    /// Steps this phase iterates, in order (empty for main phases)
    pub fn steps(&self) -> &'static [StepType] {
        match self {
            PhaseType::Beginning => &[StepType::Untap, StepType::Upkeep, StepType::Draw],
            PhaseType::PrecombatMain | PhaseType::PostcombatMain => &[],
            PhaseType::Combat => &[
                StepType::BeginCombat,
                StepType::DeclareAttackers,
                StepType::DeclareBlockers,
                StepType::CombatDamage,
                StepType::EndCombat,
            ],
            PhaseType::Ending => &[StepType::End, StepType::Cleanup],
        }
    }
}

impl fmt::Display for PhaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhaseType::Beginning => "beginning",
            PhaseType::PrecombatMain => "precombat main",
            PhaseType::Combat => "combat",
            PhaseType::PostcombatMain => "postcombat main",
            PhaseType::Ending => "ending",
        };
        write!(f, "{s}")
    }
}

/// Specific steps within phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepType {
    // Beginning phase
    Untap,
    Upkeep,
    Draw,

    // Combat phase
    BeginCombat,
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,
    EndCombat,

    // Ending phase
    End,
    Cleanup,
}

impl StepType {
    /// Get the phase this step belongs to
    pub fn phase(&self) -> PhaseType {
        match self {
            StepType::Untap | StepType::Upkeep | StepType::Draw => PhaseType::Beginning,
            StepType::BeginCombat
            | StepType::DeclareAttackers
            | StepType::DeclareBlockers
            | StepType::CombatDamage
            | StepType::EndCombat => PhaseType::Combat,
            StepType::End | StepType::Cleanup => PhaseType::Ending,
        }
    }

    /// Turn-based actions posted when the step begins
    pub fn begin_actions(&self) -> SmallVec<[TurnBasedAction; 3]> {
        match self {
            StepType::Untap => smallvec![TurnBasedAction::Phasing, TurnBasedAction::Untap],
            StepType::Upkeep => smallvec![TurnBasedAction::Upkeep],
            StepType::Draw => smallvec![TurnBasedAction::Draw],
            StepType::DeclareAttackers => smallvec![TurnBasedAction::DeclareAttackers],
            StepType::DeclareBlockers => smallvec![TurnBasedAction::DeclareBlockers],
            StepType::CombatDamage => smallvec![
                TurnBasedAction::DamageAssignmentOrder,
                TurnBasedAction::AssignCombatDamage,
                TurnBasedAction::DealCombatDamage,
            ],
            StepType::Cleanup => smallvec![TurnBasedAction::DiscardToHandSize, TurnBasedAction::Cleanup],
            StepType::BeginCombat | StepType::EndCombat | StepType::End => SmallVec::new(),
        }
    }

    /// Turn-based action posted when the step ends
    pub fn end_action(&self) -> TurnBasedAction {
        match self {
            StepType::EndCombat => TurnBasedAction::EndOfCombat,
            _ => TurnBasedAction::ClearManaPools,
        }
    }

    /// Do players receive priority during this step?
    pub fn grants_priority(&self) -> bool {
        !matches!(self, StepType::Untap | StepType::Cleanup)
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepType::Untap => "untap",
            StepType::Upkeep => "upkeep",
            StepType::Draw => "draw",
            StepType::BeginCombat => "beginning of combat",
            StepType::DeclareAttackers => "declare attackers",
            StepType::DeclareBlockers => "declare blockers",
            StepType::CombatDamage => "combat damage",
            StepType::EndCombat => "end of combat",
            StepType::End => "end",
            StepType::Cleanup => "cleanup",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle flags shared by steps, phases and turns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFlags {
    pub running: bool,

    /// Consume without running
    pub skipped: bool,

    /// Run once more, then the flag clears
    pub repeated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub kind: StepType,
    pub flags: UnitFlags,
}

impl Step {
    pub fn new(kind: StepType) -> Self {
        Step {
            kind,
            flags: UnitFlags::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.flags.running
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseType,
    pub flags: UnitFlags,
    steps: Vec<Step>,
    cursor: Option<usize>,
}

impl Phase {
    pub fn new(kind: PhaseType) -> Self {
        Phase {
            kind,
            flags: UnitFlags::default(),
            steps: kind.steps().iter().copied().map(Step::new).collect(),
            cursor: None,
        }
    }

    pub fn is_main(&self) -> bool {
        self.kind.is_main()
    }

    pub fn is_running(&self) -> bool {
        self.flags.running
    }

    pub fn has_next_step(&self) -> bool {
        match self.cursor {
            None => !self.steps.is_empty(),
            Some(i) => self.steps[i].flags.repeated || i + 1 < self.steps.len(),
        }
    }

    /// Move the cursor to the next step (or rerun a repeated one) and return it
    pub fn advance_step(&mut self) -> Option<&mut Step> {
        let next = match self.cursor {
            None if self.steps.is_empty() => return None,
            None => 0,
            Some(i) if self.steps[i].flags.repeated => {
                self.steps[i].flags.repeated = false;
                i
            }
            Some(i) if i + 1 < self.steps.len() => i + 1,
            Some(_) => return None,
        };
        self.cursor = Some(next);
        Some(&mut self.steps[next])
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.cursor.map(|i| &self.steps[i])
    }

    pub fn current_step_mut(&mut self) -> Option<&mut Step> {
        match self.cursor {
            Some(i) => Some(&mut self.steps[i]),
            None => None,
        }
    }

    pub fn step_mut(&mut self, kind: StepType) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.kind == kind)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// One player's turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Turn number (starts at 1)
    pub number: u32,

    pub active_player: PlayerId,

    pub nonactive_player: PlayerId,

    pub flags: UnitFlags,

    phases: Vec<Phase>,

    cursor: Option<usize>,
}

impl Turn {
    pub fn new(number: u32, active_player: PlayerId, nonactive_player: PlayerId) -> Self {
        Turn {
            number,
            active_player,
            nonactive_player,
            flags: UnitFlags::default(),
            phases: PhaseType::ALL.iter().copied().map(Phase::new).collect(),
            cursor: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.flags.running
    }

    pub fn has_next_phase(&self) -> bool {
        match self.cursor {
            None => true,
            Some(i) => self.phases[i].flags.repeated || i + 1 < self.phases.len(),
        }
    }

    /// Move the cursor to the next phase (or rerun a repeated one) and return it
    pub fn advance_phase(&mut self) -> Option<&mut Phase> {
        let next = match self.cursor {
            None => 0,
            Some(i) if self.phases[i].flags.repeated => {
                let kind = self.phases[i].kind;
                // A rerun phase walks its steps again from the top
                self.phases[i] = Phase::new(kind);
                i
            }
            Some(i) if i + 1 < self.phases.len() => i + 1,
            Some(_) => return None,
        };
        self.cursor = Some(next);
        Some(&mut self.phases[next])
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.cursor.map(|i| &self.phases[i])
    }

    pub fn current_phase_mut(&mut self) -> Option<&mut Phase> {
        match self.cursor {
            Some(i) => Some(&mut self.phases[i]),
            None => None,
        }
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.current_phase().and_then(Phase::current_step)
    }

    pub fn phase_mut(&mut self, kind: PhaseType) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.kind == kind)
    }

    pub fn skip_phase(&mut self, kind: PhaseType) {
        if let Some(phase) = self.phase_mut(kind) {
            phase.flags.skipped = true;
        }
    }

    pub fn skip_step(&mut self, kind: StepType) {
        if let Some(step) = self.phase_mut(kind.phase()).and_then(|p| p.step_mut(kind)) {
            step.flags.skipped = true;
        }
    }

    pub fn is_step_skipped(&self, kind: StepType) -> bool {
        self.phases
            .iter()
            .filter(|p| p.kind == kind.phase())
            .flat_map(|p| p.steps.iter())
            .any(|s| s.kind == kind && s.flags.skipped)
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    fn turn() -> Turn {
        Turn::new(1, EntityId::new(0), EntityId::new(1))
    }

    #[test]
    fn test_step_phases() {
        assert_eq!(StepType::Untap.phase(), PhaseType::Beginning);
        assert_eq!(StepType::DeclareAttackers.phase(), PhaseType::Combat);
        assert_eq!(StepType::Cleanup.phase(), PhaseType::Ending);
    }

    #[test]
    fn test_priority_steps() {
        assert!(!StepType::Untap.grants_priority());
        assert!(!StepType::Cleanup.grants_priority());
        assert!(StepType::Upkeep.grants_priority());
        assert!(StepType::CombatDamage.grants_priority());
    }

    #[test]
    fn test_step_actions() {
        assert_eq!(
            StepType::Untap.begin_actions().as_slice(),
            &[TurnBasedAction::Phasing, TurnBasedAction::Untap]
        );
        assert!(StepType::End.begin_actions().is_empty());
        assert_eq!(StepType::Draw.end_action(), TurnBasedAction::ClearManaPools);
        assert_eq!(StepType::EndCombat.end_action(), TurnBasedAction::EndOfCombat);
    }

    #[test]
    fn test_turn_walks_all_phases_in_order() {
        let mut turn = turn();
        let mut seen = Vec::new();
        while turn.has_next_phase() {
            seen.push(turn.advance_phase().unwrap().kind);
        }
        assert_eq!(seen, PhaseType::ALL.to_vec());
        assert!(turn.advance_phase().is_none());
    }

    #[test]
    fn test_main_phase_has_no_steps() {
        let mut phase = Phase::new(PhaseType::PrecombatMain);
        assert!(!phase.has_next_step());
        assert!(phase.advance_step().is_none());
    }

    #[test]
    fn test_combat_steps_in_order() {
        let mut phase = Phase::new(PhaseType::Combat);
        let mut seen = Vec::new();
        while let Some(step) = phase.advance_step() {
            seen.push(step.kind);
        }
        assert_eq!(seen, PhaseType::Combat.steps().to_vec());
        assert!(!phase.has_next_step());
    }

    #[test]
    fn test_repeated_step_runs_once_more() {
        let mut phase = Phase::new(PhaseType::Ending);
        phase.advance_step().unwrap().flags.repeated = true;

        assert!(phase.has_next_step());
        let again = phase.advance_step().unwrap();
        assert_eq!(again.kind, StepType::End);
        assert!(!again.flags.repeated);

        assert_eq!(phase.advance_step().unwrap().kind, StepType::Cleanup);
        assert!(phase.advance_step().is_none());
    }

    #[test]
    fn test_repeated_phase_restarts_its_steps() {
        let mut turn = turn();
        let combat = {
            turn.advance_phase();
            turn.advance_phase();
            turn.advance_phase().unwrap()
        };
        assert_eq!(combat.kind, PhaseType::Combat);
        combat.advance_step();
        combat.flags.repeated = true;

        let rerun = turn.advance_phase().unwrap();
        assert_eq!(rerun.kind, PhaseType::Combat);
        assert!(rerun.current_step().is_none());
        assert_eq!(turn.advance_phase().unwrap().kind, PhaseType::PostcombatMain);
    }

    #[test]
    fn test_skip_step() {
        let mut turn = turn();
        turn.skip_step(StepType::Draw);
        assert!(turn.is_step_skipped(StepType::Draw));
        assert!(!turn.is_step_skipped(StepType::Upkeep));
    }
}
