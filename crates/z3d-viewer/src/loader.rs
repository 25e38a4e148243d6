//! Background scene loading.
//!
//! The file is read and decoded on Bevy's `AsyncComputeTaskPool`; the
//! result comes back over an `async_channel` that an update system polls.
//! Once a scene arrives it is spawned and the camera is moved to frame it.

use std::path::PathBuf;

use bevy::prelude::*;
use bevy::tasks::AsyncComputeTaskPool;

use z3d::{LoadOptions, LoadedScene};

use crate::camera::{CameraSettings, FlightCamera, Framing};
use crate::spawn::{SceneAssets, scene_to_world, spawn_scene};

/// Plugin that loads one scene file.
pub struct SceneLoaderPlugin {
    pub path: PathBuf,
    pub options: LoadOptions,
}

impl Plugin for SceneLoaderPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(LoaderState {
            path: self.path.clone(),
            options: self.options.clone(),
            loaded: false,
        })
        .init_resource::<LoaderChannels>()
        .add_systems(Startup, start_load)
        .add_systems(Update, poll_load_task);
    }
}

/// State for the scene loader.
#[derive(Resource)]
pub struct LoaderState {
    /// The file to load.
    pub path: PathBuf,
    pub options: LoadOptions,
    /// Whether the scene has been received.
    pub loaded: bool,
}

/// Channel for receiving the loaded scene from the background task.
#[derive(Resource)]
pub struct LoaderChannels {
    scene_rx: async_channel::Receiver<z3d::Result<LoadedScene>>,
    scene_tx: async_channel::Sender<z3d::Result<LoadedScene>>,
}

impl Default for LoaderChannels {
    fn default() -> Self {
        let (scene_tx, scene_rx) = async_channel::bounded(1);
        Self { scene_rx, scene_tx }
    }
}

/// Start decoding the scene file.
#[allow(clippy::needless_pass_by_value)]
fn start_load(state: Res<LoaderState>, channels: Res<LoaderChannels>) {
    let path = state.path.clone();
    let options = state.options.clone();
    let tx = channels.scene_tx.clone();

    AsyncComputeTaskPool::get()
        .spawn(async move {
            let result = z3d::load_with_options(&path, &options);
            let _ = tx.send(result).await;
        })
        .detach();

    tracing::info!("Started loading {}", state.path.display());
}

/// Poll the loading task and spawn the scene when it arrives.
#[allow(clippy::needless_pass_by_value, clippy::too_many_arguments)]
fn poll_load_task(
    mut commands: Commands,
    mut state: ResMut<LoaderState>,
    channels: Res<LoaderChannels>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    mut settings: ResMut<CameraSettings>,
    mut cameras: Query<(&mut Transform, &mut FlightCamera)>,
) {
    if state.loaded {
        return;
    }

    let Ok(result) = channels.scene_rx.try_recv() else {
        return;
    };
    state.loaded = true;

    let loaded = match result {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load {}: {}", state.path.display(), e);
            return;
        }
    };

    let mut assets = SceneAssets {
        meshes: &mut meshes,
        materials: &mut materials,
        images: &mut images,
    };
    spawn_scene(&mut commands, &mut assets, &loaded);

    let Some((min, max)) = loaded.bounds() else {
        tracing::info!("Scene has no vertices");
        return;
    };
    let rotation = scene_to_world();
    let (a, b) = (rotation * min, rotation * max);
    let framing = Framing::for_bounds(a.min(b), a.max(b));
    for (mut transform, mut camera) in &mut cameras {
        framing.apply(&mut transform, &mut camera, &mut settings);
    }
}
