//! Integration tests for the scene -> stage -> physics pipeline
//!
//! These tests verify:
//! 1. A scene saved to disk loads back and instantiates into a World
//! 2. Scene callback names reach the contact handler
//! 3. Linked render objects follow their bodies, even after the object list shifts
//! 4. Deleting the owner object tears the World down

use std::cell::RefCell;
use std::rc::Rc;

use planar_core::{BodyTemplate, RenderObject, Scene, Stage};
use planar_math::Vec2;
use planar_physics::{BodyKind, ContactKind, FixtureMaterial, FixtureShape, FixtureTemplate, TypeRegistry};

fn drop_scene() -> Scene {
    let mut scene = Scene::new("drop");
    scene.add_template(
        "dead_ball",
        FixtureTemplate::new(FixtureShape::circle(0.5)).with_material(FixtureMaterial::new(1.0, 0.3, 0.0)),
    );
    scene.add_body(
        BodyTemplate::new("floor", BodyKind::Static, Vec2::ZERO)
            .with_fixture(
                FixtureTemplate::new(FixtureShape::rect(20.0, 1.0)).with_material(FixtureMaterial::new(1.0, 0.6, 0.0)),
            ),
    );
    scene.add_body(
        BodyTemplate::new("ball", BodyKind::Dynamic, Vec2::new(0.0, 3.0))
            .with_template("dead_ball")
            .with_render_object("ball_sprite"),
    );
    scene.callbacks.begin_contact = Some("onLand".into());
    scene
}

// ==================== Scene File Tests ====================

/// Test that a scene written to disk loads back unchanged and still builds
#[test]
fn test_scene_file_roundtrip_instantiates() {
    let path = std::env::temp_dir().join(format!("planar_stage_{}.ron", std::process::id()));
    drop_scene().save(&path).expect("scene should save");

    let loaded = Scene::load(&path).expect("scene should load");
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded, drop_scene());

    let mut stage = Stage::new(&mut TypeRegistry::new());
    let instance = stage.instantiate(&loaded).expect("scene should instantiate");
    assert_eq!(stage.physics().body_count(instance.world).unwrap(), 2);
    assert!(instance.body("floor").is_some());
    assert!(instance.body("ball").is_some());
}

// ==================== Contact Tests ====================

/// Test that the callback name from the scene is passed to the handler
#[test]
fn test_scene_callback_reaches_handler() {
    let mut stage = Stage::new(&mut TypeRegistry::new());
    let instance = stage.instantiate(&drop_scene()).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    stage
        .physics_mut()
        .set_contact_handler(instance.world, move |name, event| {
            sink.borrow_mut().push((name.to_string(), event.kind()));
        })
        .unwrap();

    for _ in 0..120 {
        stage.step(instance.world, 1.0 / 60.0).unwrap();
    }

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1, "ball should land exactly once: {:?}", *seen);
    assert_eq!(seen[0], ("onLand".to_string(), ContactKind::Begin));
}

// ==================== Transform Sync Tests ====================

/// Test that the linked sprite follows the ball as it falls
#[test]
fn test_linked_sprite_follows_ball() {
    let mut stage = Stage::new(&mut TypeRegistry::new());
    let instance = stage.instantiate(&drop_scene()).unwrap();
    let sprite = stage.objects().find("ball_sprite").unwrap();

    for _ in 0..10 {
        stage.step(instance.world, 1.0 / 60.0).unwrap();
    }

    let ball = instance.body("ball").unwrap();
    let pose = stage.physics().get_body_info(instance.world, ball).unwrap();
    let model = stage.objects().get(sprite).unwrap().model;
    assert!(pose.position.y < 3.0);
    assert!((model[3][1] - pose.position.y).abs() < 1e-5);
}

/// Test that removing an earlier object does not break stepping
#[test]
fn test_shifted_object_ids_are_tolerated() {
    let mut stage = Stage::new(&mut TypeRegistry::new());
    let filler = stage.spawn_object(RenderObject::new("filler"));
    let instance = stage.instantiate(&drop_scene()).unwrap();

    // The sprite was the last object; removing the filler leaves its id past the end
    stage.delete_object(filler);
    for _ in 0..10 {
        stage.step(instance.world, 1.0 / 60.0).unwrap();
    }

    assert_eq!(stage.objects().len(), 2);
    assert!(stage.objects().find("ball_sprite").is_some());
}

// ==================== Lifecycle Tests ====================

/// Test that deleting the owner object removes the World and nothing else
#[test]
fn test_delete_owner_removes_world() {
    let mut stage = Stage::new(&mut TypeRegistry::new());
    let instance = stage.instantiate(&drop_scene()).unwrap();
    let objects_before = stage.objects().len();

    stage.delete_object(instance.owner).unwrap();

    assert_eq!(stage.physics().world_count(), 0);
    assert_eq!(stage.objects().len(), objects_before - 1);
    assert!(stage.step(instance.world, 1.0 / 60.0).is_err());
    assert!(stage.update(100.0, 1.0 / 60.0).is_ok());
}
