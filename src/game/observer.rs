//! Change notifications for presentation layers
//!
//! The engine reads and writes plain fields. After every `update()` tick and
//! every posted action the match takes a small `ObservedView` of the values a
//! display cares about and publishes one `ChangeNotice` per difference from
//! the previous view.

use crate::core::{PlayerId, PlayerState};
use crate::game::phase::{PhaseType, StepType};
use crate::zones::ZoneKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeNotice {
    /// Contents of a zone changed size. `owner` is `None` for shared zones.
    ZoneChanged {
        owner: Option<PlayerId>,
        zone: ZoneKind,
        size: usize,
    },
    LifeChanged {
        player: PlayerId,
        life: i32,
    },
    TurnChanged {
        number: u32,
        active_player: PlayerId,
    },
    PhaseChanged(Option<PhaseType>),
    StepChanged(Option<StepType>),
    PlayerStateChanged {
        player: PlayerId,
        state: PlayerState,
    },
    MatchEnded {
        winner: Option<PlayerId>,
    },
}

pub type ChangeListener = Box<dyn FnMut(&ChangeNotice)>;

/// Per-player values watched for changes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerView {
    pub id: Option<PlayerId>,
    pub life: i32,
    pub state: Option<PlayerState>,
    pub library: usize,
    pub hand: usize,
    pub graveyard: usize,
}

/// Everything a display is notified about
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObservedView {
    pub turn: Option<(u32, PlayerId)>,
    pub phase: Option<PhaseType>,
    pub step: Option<StepType>,
    pub players: [PlayerView; 2],
    pub battlefield: usize,
    pub exile: usize,
    pub stack: usize,
    pub finished: Option<Option<PlayerId>>,
}

impl ObservedView {
    /// Notices describing how `self` differs from `previous`
    pub fn diff(&self, previous: &ObservedView) -> Vec<ChangeNotice> {
        let mut notices = Vec::new();

        if let Some((number, active_player)) = self.turn {
            if self.turn != previous.turn {
                notices.push(ChangeNotice::TurnChanged { number, active_player });
            }
        }
        if self.phase != previous.phase {
            notices.push(ChangeNotice::PhaseChanged(self.phase));
        }
        if self.step != previous.step {
            notices.push(ChangeNotice::StepChanged(self.step));
        }

        for (now, before) in self.players.iter().zip(previous.players.iter()) {
            let Some(player) = now.id else { continue };
            if now.life != before.life {
                notices.push(ChangeNotice::LifeChanged { player, life: now.life });
            }
            if let Some(state) = now.state {
                if now.state != before.state {
                    notices.push(ChangeNotice::PlayerStateChanged { player, state });
                }
            }
            for (zone, size, old) in [
                (ZoneKind::Library, now.library, before.library),
                (ZoneKind::Hand, now.hand, before.hand),
                (ZoneKind::Graveyard, now.graveyard, before.graveyard),
            ] {
                if size != old {
                    notices.push(ChangeNotice::ZoneChanged {
                        owner: Some(player),
                        zone,
                        size,
                    });
                }
            }
        }

        for (zone, size, old) in [
            (ZoneKind::Battlefield, self.battlefield, previous.battlefield),
            (ZoneKind::Exile, self.exile, previous.exile),
            (ZoneKind::Stack, self.stack, previous.stack),
        ] {
            if size != old {
                notices.push(ChangeNotice::ZoneChanged { owner: None, zone, size });
            }
        }

        if let Some(winner) = self.finished {
            if previous.finished.is_none() {
                notices.push(ChangeNotice::MatchEnded { winner });
            }
        }

        notices
    }
}

/// Registered listeners plus the last view they were told about
#[derive(Default)]
pub struct Observers {
    listeners: Vec<ChangeListener>,
    last: ObservedView,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Notify every listener of what changed since the last publish
    pub fn publish(&mut self, view: ObservedView) {
        if view == self.last {
            return;
        }
        let notices = view.diff(&self.last);
        for notice in &notices {
            for listener in &mut self.listeners {
                listener(notice);
            }
        }
        self.last = view;
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
