use bevy::prelude::*;
use bevy::ui::BackgroundColor;

use crate::building::{BuildController, PlacementFeedback, PlacementSession, SnapState};

#[derive(Component)]
pub struct PauseOverlay;

/// Top-left status line for the build session.
#[derive(Component)]
pub struct BuildHud;

pub fn spawn_pause_overlay(mut commands: Commands) {
    commands.spawn((
        // Fullscreen transparent overlay node
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        BackgroundColor(Color::linear_rgba(0.0, 0.0, 0.0, 0.7)),
        PauseOverlay,
    ))
    .with_children(|parent| {
        parent.spawn((
            Text::new("Paused"),
            TextFont {
                font_size: 64.0,
                ..default()
            },
            TextLayout::new_with_justify(JustifyText::Center),
            TextColor(Color::WHITE),
        ));
    });
}

pub fn despawn_pause_overlay(
    mut commands: Commands,
    query: Query<Entity, With<PauseOverlay>>,
) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}

pub fn spawn_build_hud(mut commands: Commands) {
    commands.spawn((
        Text::new(hud_line(SnapState::Free, None, None)),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(Color::srgb(0.9, 0.9, 0.85)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        BuildHud,
    ));
}

pub fn update_build_hud(
    mut feedback: EventReader<PlacementFeedback>,
    sessions: Query<(&PlacementSession, Option<&BuildController>)>,
    mut hud: Query<&mut Text, With<BuildHud>>,
    mut last: Local<Option<String>>,
) {
    if let Some(latest) = feedback.read().last() {
        *last = Some(describe(latest));
    }

    let (state, blueprint) = sessions
        .iter()
        .next()
        .map(|(s, build)| (s.snap_state(), build.map(|b| b.blueprint.as_str())))
        .unwrap_or_default();
    let line = hud_line(state, blueprint, last.as_deref());
    for mut text in &mut hud {
        if text.0 != line {
            text.0 = line.clone();
        }
    }
}

fn describe(feedback: &PlacementFeedback) -> String {
    match *feedback {
        PlacementFeedback::Snapped { anchor, .. } => {
            format!("snapped at ({:.1}, {:.1}, {:.1})", anchor.x, anchor.y, anchor.z)
        }
        PlacementFeedback::Released { .. } => "released".to_string(),
        PlacementFeedback::Rotated { .. } => "rotated".to_string(),
        PlacementFeedback::Placed { structure, .. } => format!("placed {structure}"),
        PlacementFeedback::Rejected { blocking, .. } => format!("blocked by {blocking}"),
        PlacementFeedback::Switched { .. } => "switched blueprint".to_string(),
    }
}

fn hud_line(state: SnapState, blueprint: Option<&str>, last: Option<&str>) -> String {
    let state = match state {
        SnapState::Free => "Free",
        SnapState::Snapped => "Snapped",
    };
    let mut line = match blueprint {
        Some(name) => format!("{name}: {state}"),
        None => state.to_string(),
    };
    if let Some(last) = last {
        line.push_str(" | ");
        line.push_str(last);
    }
    line.push_str("  [R] rotate  [Tab] blueprint  [LMB] place");
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hud_shows_state_and_last_event() {
        assert!(hud_line(SnapState::Free, None, None).starts_with("Free  "));
        let line = hud_line(SnapState::Snapped, Some("wall"), Some("rotated"));
        assert!(line.starts_with("wall: Snapped | rotated"));
    }

    #[test]
    fn rejection_names_blocker_count() {
        let fb = PlacementFeedback::Rejected { controller: Entity::from_raw(1), blocking: 2 };
        assert_eq!(describe(&fb), "blocked by 2");
    }
}
