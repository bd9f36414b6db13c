use approx::assert_relative_eq;
use kiln::{
    FrameStatus, HeadlessBackend, HeadlessSurface, PreviewConfig, PrimitiveKind, STONE_COUNT,
    STONE_ORBIT, Stage, StagePreview, Vec3,
};
use std::time::{Duration, Instant};

fn attach(width: u32, height: u32) -> (HeadlessSurface, StagePreview<HeadlessBackend>) {
    let surface = HeadlessSurface::new(width, height);
    let mut preview = StagePreview::new(PreviewConfig::default());
    preview.attach(&surface).expect("attach to headless surface");
    (surface, preview)
}

#[test]
fn each_stage_has_its_primitive_count() {
    let (_surface, mut preview) = attach(320, 240);

    for (stage, expected) in Stage::ALL.into_iter().zip([1, 1, 1, 13]) {
        preview.set_stage(stage).unwrap();
        let content = preview.content().unwrap();
        assert_eq!(content.len(), expected, "{stage}");
        assert_eq!(stage.primitive_count(), expected);
    }
}

#[test]
fn every_replaced_primitive_is_released() {
    let (surface, mut preview) = attach(320, 240);
    let sequence = [
        Stage::DecoratedRing,
        Stage::RawLump,
        Stage::DecoratedRing,
        Stage::DecoratedRing,
        Stage::HeatedRod,
        Stage::PlainRing,
        Stage::DecoratedRing,
    ];

    for stage in sequence {
        preview.set_stage(stage).unwrap();
        let content = preview.content().unwrap();
        assert_eq!(
            content.released_total(),
            content.added_total() - content.len()
        );

        let ledger = surface.ledger().snapshot();
        assert_eq!(ledger.live_meshes(), content.len());
        assert_eq!(ledger.live_materials(), content.len());
    }
}

#[test]
fn setting_the_same_stage_twice_rebuilds_it() {
    let (surface, mut preview) = attach(320, 240);

    preview.set_stage(Stage::DecoratedRing).unwrap();
    let kinds = preview.content().unwrap().kinds();
    let uploaded = surface.ledger().snapshot().meshes_uploaded;

    preview.set_stage(Stage::DecoratedRing).unwrap();
    assert_eq!(preview.content().unwrap().kinds(), kinds);

    let ledger = surface.ledger().snapshot();
    assert_eq!(ledger.meshes_uploaded, uploaded * 2);
    assert_eq!(ledger.meshes_released, uploaded);
    assert_eq!(ledger.live_meshes(), 13);
}

#[test]
fn detach_leaves_nothing_behind() {
    let (surface, mut preview) = attach(640, 480);
    preview.set_stage(Stage::PlainRing).unwrap();
    preview.set_stage(Stage::RawLump).unwrap();
    let start = Instant::now();
    for i in 0..10 {
        preview.frame(start + Duration::from_millis(16 * i)).unwrap();
    }

    let report = preview.detach().unwrap();
    assert_eq!(report.primitives_released, 1);
    assert_eq!(report.frames, 10);

    let ledger = surface.ledger().snapshot();
    assert_eq!(ledger.live_meshes(), 0);
    assert_eq!(ledger.live_materials(), 0);
    assert_eq!(ledger.contexts_released, 1);
    assert!(ledger.cleared);
    assert!(!preview.is_attached());
}

#[test]
fn resize_only_touches_aspect_and_backing_store() {
    let (surface, mut preview) = attach(400, 400);
    preview.set_stage(Stage::HeatedRod).unwrap();
    let start = Instant::now();
    preview.frame(start).unwrap();

    let yaw = preview.content().unwrap().yaw();
    let uploaded = surface.ledger().snapshot().meshes_uploaded;
    let handle = preview.loop_handle().unwrap();

    preview.resize(800, 400);

    let scene = preview.scene().unwrap();
    assert_relative_eq!(scene.camera.aspect, 2.0);
    assert_eq!(scene.content.kinds(), vec![PrimitiveKind::Rod]);
    assert_eq!(scene.content.yaw(), yaw);
    assert!(handle.is_live());

    let ledger = surface.ledger().snapshot();
    assert_eq!(ledger.meshes_uploaded, uploaded);
    assert_eq!(ledger.resizes, 1);
    assert_eq!((ledger.backing_size.width, ledger.backing_size.height), (800, 400));
}

#[test]
fn content_keeps_turning_and_tilts_gently() {
    let (_surface, mut preview) = attach(400, 300);
    preview.set_stage(Stage::RawLump).unwrap();
    let start = Instant::now();
    let mut yaw = preview.content().unwrap().yaw();

    for i in 1..=900u64 {
        let status = preview.frame(start + Duration::from_millis(16 * i)).unwrap();
        assert_eq!(status, FrameStatus::Rendered);

        let content = preview.content().unwrap();
        assert!(content.yaw() > yaw, "yaw stalled at frame {i}");
        assert!(content.tilt().abs() <= 0.1 + 1e-6, "tilt {} at frame {i}", content.tilt());
        yaw = content.yaw();
    }
    assert_relative_eq!(yaw, 900.0 * 0.005, epsilon = 1e-3);
}

#[test]
fn decorated_ring_scenario() {
    let (surface, mut preview) = attach(400, 400);
    let handle = preview.loop_handle().unwrap();
    preview.set_stage(Stage::DecoratedRing).unwrap();

    let content = preview.content().unwrap();
    assert_eq!(content.len(), 13);

    let stones: Vec<_> = content
        .iter()
        .filter(|p| p.kind == PrimitiveKind::Stone)
        .collect();
    assert_eq!(stones.len(), STONE_COUNT);

    for (i, stone) in stones.iter().enumerate() {
        let position = stone.transform.position;
        let expected_angle = (i as f32 * 30.0).to_radians();
        assert_relative_eq!(position.length(), STONE_ORBIT, epsilon = 1e-5);
        assert_relative_eq!(position.z, 0.0);
        assert_relative_eq!(position.x, expected_angle.cos() * 1.75, epsilon = 1e-5);
        assert_relative_eq!(position.y, expected_angle.sin() * 1.75, epsilon = 1e-5);
        assert!(!stone.casts_shadow);

        // The group rotation moves stones but keeps them on their orbit.
        let world = content.world_matrix(stone).transform_point3(Vec3::ZERO);
        assert_relative_eq!(world.length(), STONE_ORBIT, epsilon = 1e-5);
    }

    assert_eq!(preview.frame(Instant::now()).unwrap(), FrameStatus::Rendered);
    assert_eq!(surface.ledger().snapshot().last_draw_count, 13);

    let report = preview.detach().unwrap();
    assert!(!handle.is_live());
    assert_eq!(report.primitives_released, 13);
    assert_eq!(surface.ledger().snapshot().meshes_released, 13);
    assert_eq!(preview.frame(Instant::now()).unwrap(), FrameStatus::Stopped);
}

#[test]
fn reattaching_after_detach_starts_fresh() {
    let (first, mut preview) = attach(300, 300);
    preview.set_stage(Stage::PlainRing).unwrap();
    preview.detach();

    let second = HeadlessSurface::new(300, 300);
    preview.attach(&second).unwrap();
    assert_eq!(preview.stage(), None);
    assert!(preview.content().unwrap().is_empty());
    assert_eq!(first.ledger().snapshot().live_meshes(), 0);
    assert_eq!(second.ledger().snapshot().connections, 1);
}
