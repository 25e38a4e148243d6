//! Free-flight camera controller for inspecting a scene.
//!
//! Provides WASD movement with mouse look. Scroll adjusts the speed, which
//! is reset to suit the scene's size once it has loaded.

use bevy::ecs::message::MessageReader;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions, PrimaryWindow};

/// Minimum base speed in scene units per second.
pub const MIN_SPEED: f32 = 0.05;
/// Maximum base speed in scene units per second.
pub const MAX_SPEED: f32 = 5_000.0;

/// Plugin for free-flight camera controls.
pub struct CameraControllerPlugin;

impl Plugin for CameraControllerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraSettings>()
            .add_systems(Startup, grab_cursor)
            .add_systems(
                Update,
                (
                    cursor_grab_system,
                    adjust_speed_with_scroll.run_if(cursor_is_grabbed),
                    camera_look.run_if(cursor_is_grabbed),
                    camera_movement,
                )
                    .chain(),
            );
    }
}

/// Settings for camera movement.
#[derive(Resource)]
pub struct CameraSettings {
    /// Base movement speed in scene units per second.
    pub base_speed: f32,
    /// Speed multiplier when boost key is held.
    pub boost_multiplier: f32,
    /// Mouse sensitivity for look rotation.
    pub mouse_sensitivity: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            base_speed: 5.0,
            boost_multiplier: 5.0,
            mouse_sensitivity: 0.001,
        }
    }
}

/// Marker component for the camera entity that should be controlled.
#[derive(Component)]
pub struct FlightCamera {
    /// Current direction the camera is facing (normalized).
    pub direction: Vec3,
}

impl Default for FlightCamera {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-1.0, -0.5, -1.0).normalize(),
        }
    }
}

/// Where to put the camera so that a box is in view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    pub position: Vec3,
    pub direction: Vec3,
    /// Speed that crosses the box in about four seconds.
    pub speed: f32,
}

impl Framing {
    /// Look at the centre of `min..max` from above one corner.
    #[must_use]
    pub fn for_bounds(min: Vec3, max: Vec3) -> Self {
        let center = (min + max) * 0.5;
        let extent = (max - min).length().max(1.0);
        let direction = FlightCamera::default().direction;
        Self {
            position: center - direction * extent * 1.2,
            direction,
            speed: (extent / 4.0).clamp(MIN_SPEED, MAX_SPEED),
        }
    }

    /// Move the camera and set the speed.
    pub fn apply(
        &self,
        transform: &mut Transform,
        camera: &mut FlightCamera,
        settings: &mut CameraSettings,
    ) {
        transform.translation = self.position;
        transform.look_to(self.direction, Vec3::Y);
        camera.direction = self.direction;
        settings.base_speed = self.speed;
    }
}

/// Grab the cursor on startup.
fn grab_cursor(
    mut cursor: Single<&mut CursorOptions>,
    mut window: Single<&mut Window, With<PrimaryWindow>>,
) {
    set_cursor_grab(&mut cursor, &mut window, true);
}

/// Set cursor grab state, centering the cursor when grabbing.
fn set_cursor_grab(cursor: &mut CursorOptions, window: &mut Window, grabbed: bool) {
    if grabbed {
        cursor.grab_mode = CursorGrabMode::Locked;
        cursor.visible = false;
        let center = Vec2::new(window.width() / 2.0, window.height() / 2.0);
        window.set_cursor_position(Some(center));
    } else {
        cursor.grab_mode = CursorGrabMode::None;
        cursor.visible = true;
    }
}

#[allow(clippy::needless_pass_by_value)]
fn cursor_is_grabbed(cursor: Single<&CursorOptions>) -> bool {
    cursor.grab_mode == CursorGrabMode::Locked
}

/// Release the cursor with ESC, grab it again with a left click.
#[allow(clippy::needless_pass_by_value)]
fn cursor_grab_system(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut cursor: Single<&mut CursorOptions>,
    mut window: Single<&mut Window, With<PrimaryWindow>>,
) {
    let is_grabbed = cursor.grab_mode == CursorGrabMode::Locked;

    if keyboard.just_pressed(KeyCode::Escape) && is_grabbed {
        set_cursor_grab(&mut cursor, &mut window, false);
    } else if mouse.just_pressed(MouseButton::Left) && !is_grabbed {
        set_cursor_grab(&mut cursor, &mut window, true);
    }
}

/// Adjust speed with mouse scroll wheel.
#[allow(clippy::needless_pass_by_value)]
fn adjust_speed_with_scroll(
    mut scroll_events: MessageReader<MouseWheel>,
    mut settings: ResMut<CameraSettings>,
) {
    for event in scroll_events.read() {
        if event.y != 0.0 {
            let factor = 1.1_f32.powf(event.y);
            settings.base_speed = (settings.base_speed * factor).clamp(MIN_SPEED, MAX_SPEED);
        }
    }
}

/// Rotate `direction` by a mouse delta, keeping it off the vertical.
#[must_use]
pub fn look_direction(direction: Vec3, delta: Vec2, sensitivity: f32) -> Vec3 {
    let yaw = -delta.x * sensitivity;
    let pitch = -delta.y * sensitivity;

    let overhead = direction.dot(Vec3::Y);
    let pitch = if (overhead > 0.99 && pitch > 0.0) || (overhead < -0.99 && pitch < 0.0) {
        0.0
    } else {
        pitch
    };

    let pitch_axis = direction.cross(Vec3::Y).normalize();
    let yaw_rotation = Quat::from_rotation_y(yaw);
    let pitch_rotation = Quat::from_axis_angle(pitch_axis, pitch);
    (yaw_rotation * pitch_rotation * direction).normalize()
}

/// Handle mouse look rotation.
#[allow(clippy::needless_pass_by_value)]
fn camera_look(
    mut mouse_motion: MessageReader<MouseMotion>,
    settings: Res<CameraSettings>,
    mut query: Query<(&mut Transform, &mut FlightCamera)>,
) {
    let mut delta = Vec2::ZERO;
    for event in mouse_motion.read() {
        delta += event.delta;
    }

    if delta == Vec2::ZERO {
        return;
    }

    for (mut transform, mut camera) in &mut query {
        camera.direction = look_direction(camera.direction, delta, settings.mouse_sensitivity);
        transform.look_to(camera.direction, Vec3::Y);
    }
}

/// Handle WASD + Space/Ctrl movement with shift boost.
#[allow(clippy::needless_pass_by_value)]
fn camera_movement(
    time: Res<Time>,
    keyboard: Res<ButtonInput<KeyCode>>,
    settings: Res<CameraSettings>,
    mut query: Query<(&mut Transform, &FlightCamera)>,
) {
    for (mut transform, camera) in &mut query {
        let mut speed = settings.base_speed;
        if keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight) {
            speed *= settings.boost_multiplier;
        }

        let forward = camera.direction;
        let right = forward.cross(Vec3::Y).normalize_or_zero();

        let mut movement = Vec3::ZERO;
        if keyboard.pressed(KeyCode::KeyW) {
            movement += forward;
        }
        if keyboard.pressed(KeyCode::KeyS) {
            movement -= forward;
        }
        if keyboard.pressed(KeyCode::KeyA) {
            movement -= right;
        }
        if keyboard.pressed(KeyCode::KeyD) {
            movement += right;
        }
        if keyboard.pressed(KeyCode::Space) {
            movement += Vec3::Y;
        }
        if keyboard.pressed(KeyCode::ControlLeft) || keyboard.pressed(KeyCode::ControlRight) {
            movement -= Vec3::Y;
        }

        if movement != Vec3::ZERO {
            transform.translation += movement.normalize() * speed * time.delta_secs();
        }
    }
}
