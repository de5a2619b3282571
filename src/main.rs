use glam::{Quat, Vec3};

use shotcam::controller::{
    ForeignController, InputEvent, InputState, RigConfig, RigEvent, SceneViewport, ShotRig, SyncError,
};
use shotcam::logging;
use shotcam::model::{AspectPreset, Camera, CameraPose, MemoryStore, NodeHandle, Scene, SceneNode, ShotSettings, Transform};
use shotcam::utils::from_euler_degrees;
use shotcam::view::{safe_frame, PreviewSink, Rect, ShotWriter};

const DT: f32 = 1.0 / 60.0;

/// Scripted input for one phase of the demo session.
struct Phase {
    name: &'static str,
    ticks: usize,
    press: &'static [&'static str],
    release: &'static [&'static str],
}

const SCRIPT: &[Phase] = &[
    Phase { name: "fly forward", ticks: 60, press: &["w", "Shift"], release: &[] },
    Phase { name: "lock on statue", ticks: 30, press: &["r"], release: &["w", "Shift", "r"] },
    Phase { name: "scene sync", ticks: 30, press: &["o"], release: &["o"] },
    Phase { name: "hand back", ticks: 45, press: &["o"], release: &["o"] },
    Phase { name: "capture", ticks: 1, press: &["p"], release: &["p"] },
];

fn build_scene() -> (Scene, NodeHandle, NodeHandle) {
    let mut scene = Scene::new("DemoScene");
    let camera = scene.spawn(
        SceneNode::new("ShotCam", Transform::new(Vec3::new(0.0, 1.6, -8.0), Quat::IDENTITY)).with_camera(Camera::new(1280, 720)),
    );
    let statue = scene.spawn(SceneNode::new("Statue", Transform::new(Vec3::new(3.0, 1.0, 6.0), Quat::IDENTITY)));
    (scene, camera, statue)
}

fn run() -> Result<(), SyncError> {
    let (scene, camera, statue) = build_scene();

    let store = MemoryStore::default();
    let mut settings = ShotSettings::load(&store);
    settings.preset = AspectPreset::Hd;
    settings.safe_frame.show = true;
    if let Ok(dir) = std::env::var("SHOTCAM_OUT") {
        settings.out_dir = dir.into();
    }
    if let Some(overlay) = safe_frame(Rect::new(0.0, 0.0, 800.0, 600.0), settings.output_size(), &settings.safe_frame) {
        tracing::debug!(frame = ?overlay.frame, lines = overlay.lines.len(), label = %overlay.label, "safe frame");
    }

    let viewport = SceneViewport::new(CameraPose::perspective(
        Vec3::new(-4.0, 3.0, -2.0),
        from_euler_degrees(15.0, 60.0, 0.0),
        50.0,
    ));
    let mut rig = ShotRig::open(RigConfig::default(), scene, camera, Box::new(viewport))?
        .with_service(ShotWriter::new(PreviewSink::default(), settings));
    if let Some(ff) = rig.free_fly_mut() {
        ff.set_lock_target(Some(statue));
    }
    let mut brain = ForeignController::with_look_fields("CinemachineBrain", 0.0, 0.0);
    brain.writes_late = true;
    let brain = rig.add_aux(brain);
    rig.behaviours.set_enabled(brain, false);

    let mut input = InputState::new();
    for phase in SCRIPT {
        tracing::info!(phase = phase.name, "phase start");
        for key in phase.press {
            input.process_event(&InputEvent::KeyDown(key.to_string()));
        }
        for tick in 0..phase.ticks {
            for event in rig.update(DT, &input) {
                tracing::info!(phase = phase.name, tick, ?event, "rig event");
                if event == RigEvent::OverrideReleased {
                    tracing::info!("free-fly owns the camera again");
                }
            }
            input.end_frame();
        }
        for key in phase.release {
            input.process_event(&InputEvent::KeyUp(key.to_string()));
        }
        if let Some(pose) = rig.camera_pose() {
            tracing::info!(phase = phase.name, position = ?pose.position, "phase end");
        }
    }

    rig.close();
    Ok(())
}

fn main() {
    logging::init();
    if let Err(e) = run() {
        tracing::error!(error = %e, "demo session failed");
        std::process::exit(1);
    }
}
