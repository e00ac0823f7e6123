use bevy::prelude::*;
use std::collections::HashSet;

/// Logical bindings, refreshed every frame by `input_mapping_system`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    PanForward,
    PanBackward,
    PanLeft,
    PanRight,
    RotateBuilding,
    CycleBlueprint,
    PlaceBuilding,
}

/// Held bindings drive the camera; fired bindings drive one-shot build commands.
#[derive(Default, Resource)]
pub struct ActionState {
    held: HashSet<PlayerAction>,
    fired: HashSet<PlayerAction>,
}

impl ActionState {
    /// Drop last frame's one-shots before remapping.
    pub fn begin_frame(&mut self) {
        self.fired.clear();
    }

    pub fn hold(&mut self, action: PlayerAction, is_held: bool) {
        if is_held {
            self.held.insert(action);
        } else {
            self.held.remove(&action);
        }
    }

    pub fn fire(&mut self, action: PlayerAction) {
        self.fired.insert(action);
    }

    pub fn pressed(&self, action: PlayerAction) -> bool {
        self.held.contains(&action)
    }

    pub fn fired(&self, action: PlayerAction) -> bool {
        self.fired.contains(&action)
    }
}
