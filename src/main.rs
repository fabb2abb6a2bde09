//! Planar - headless physics demo
//!
//! Loads configuration and a scene, then runs a fixed number of frames while
//! logging every contact callback the scene names.

use planar::config::AppConfig;
use planar::scene::SceneBuilder;
use planar::systems::SimulationSystem;
use planar_core::{Scene, Stage};
use planar_physics::{BodyKindMask, ContactEvent, TypeRegistry};

fn log_contact(callback: &str, event: &ContactEvent) {
    let (a, b) = event.bodies();
    match event {
        ContactEvent::PreSolve {
            point,
            approach_velocity,
            ..
        } => log::info!(
            "{}({}, {}) at ({:.3}, {:.3}), approach {:.3}",
            callback,
            a,
            b,
            point.x,
            point.y,
            approach_velocity
        ),
        _ => log::info!("{}({}, {})", callback, a, b),
    }
}

fn main() {
    // Load configuration before logging so the configured level applies
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialize logging; RUST_LOG still wins over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()))
        .init();
    log::info!("Starting Planar");
    if let Some(e) = config_error {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }

    let scene = Scene::load(&config.scene.path).unwrap_or_else(|e| {
        log::warn!("Failed to load scene '{}': {}. Using built-in demo.", config.scene.path, e);
        SceneBuilder::demo()
    });

    let mut types = TypeRegistry::new();
    let mut stage = Stage::with_config(&mut types, config.to_world_config());
    let instance = match stage.instantiate(&scene) {
        Ok(instance) => instance,
        Err(e) => {
            log::error!("Failed to instantiate scene '{}': {}", scene.name, e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Loaded scene '{}' with {} bodies and {} render objects",
        scene.name,
        instance.bodies.len(),
        stage.objects().len()
    );

    if let Err(e) = stage.physics_mut().set_contact_handler(instance.world, log_contact) {
        log::error!("Failed to install contact handler: {}", e);
        std::process::exit(1);
    }

    let mut simulation = SimulationSystem::fixed(&config.simulation);
    for _ in 0..config.simulation.frames {
        if let Err(e) = simulation.update(&mut stage) {
            log::error!("Simulation failed at frame {}: {}", simulation.frames(), e);
            std::process::exit(1);
        }
    }

    let physics = stage.physics();
    let names = physics
        .get_bodies(instance.world, BodyKindMask::all())
        .unwrap_or_default();
    for name in names {
        if let Ok(pose) = physics.get_body_info(instance.world, &name) {
            log::info!(
                "{}: position ({:.3}, {:.3}), angle {:.3} rad",
                name,
                pose.position.x,
                pose.position.y,
                pose.angle
            );
        }
    }
    log::info!("Finished {} frames", simulation.frames());
}
