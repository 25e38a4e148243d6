//! Interactive viewer for ZModeler Z3D scenes.
//!
//! Usage: `z3d-viewer <file.z3d> [texture-dir...]`
//!
//! Controls: WASD to move, Space/Ctrl to rise and sink, Shift to boost,
//! mouse to look, scroll to change speed, ESC to release the cursor.

mod camera;
mod loader;
mod spawn;

use std::path::PathBuf;

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::GlobalAmbientLight;
use bevy::prelude::*;
use z3d::LoadOptions;

use camera::{CameraControllerPlugin, FlightCamera};
use loader::SceneLoaderPlugin;

fn main() {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: z3d-viewer <file.z3d> [texture-dir...]");
        std::process::exit(2);
    };
    let options = LoadOptions {
        texture_search_paths: args.map(PathBuf::from).collect(),
        ..LoadOptions::default()
    };

    let title = path.file_name().map_or_else(
        || "Z3D Viewer".to_owned(),
        |name| format!("{} - Z3D Viewer", name.to_string_lossy()),
    );

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title,
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.2, 0.22, 0.25)))
        .insert_resource(GlobalAmbientLight {
            color: Color::WHITE,
            brightness: 400.0,
            ..default()
        })
        .add_plugins((CameraControllerPlugin, SceneLoaderPlugin { path, options }))
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands) {
    let camera = FlightCamera::default();
    commands.spawn((
        Camera3d::default(),
        Tonemapping::None,
        Transform::from_xyz(5.0, 2.5, 5.0).looking_to(camera.direction, Vec3::Y),
        camera,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            ..default()
        },
        Transform::from_xyz(1.0, 3.0, 2.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}
