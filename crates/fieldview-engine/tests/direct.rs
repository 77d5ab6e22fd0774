mod common;

use common::*;
use fieldview_engine::canvas::{Canvas, CanvasSize, OffscreenCanvas};
use fieldview_engine::render::{
    BufferRegion, ContractError, FrameOrchestrator, FrameSources, RenderPath, RendererState,
    ShaderProgram, shared_bytes,
};
use fieldview_engine::snapshot::{FIXTURE_THRESHOLD, Snapshot};

const WIDTH: usize = 640;
const HEIGHT: usize = 512;

fn direct_sources(bytes: Vec<u8>) -> FrameSources {
    FrameSources::direct(BufferRegion::whole(shared_bytes(bytes)).unwrap())
}

#[test]
fn full_intensity_lights_every_pixel() {
    let Some(gpu) = gpu() else { return };

    let sources = direct_sources(vec![255u8; WIDTH * HEIGHT]);
    let mut orchestrator =
        offscreen_orchestrator(&gpu, CanvasSize::default(), sources).unwrap();
    orchestrator.render_direct().unwrap();

    let frame = orchestrator.canvas().read_pixels().unwrap();
    let expected = Snapshot::filled(CanvasSize::default(), WHITE);
    assert_eq!(frame.diff(&expected, 0.0).unwrap().differing_pixels, 0);
    assert_eq!(orchestrator.state(), RendererState::Renderable);
}

#[test]
fn one_byte_short_is_rejected() {
    let Some(gpu) = gpu() else { return };

    let sources = direct_sources(vec![0u8; WIDTH * HEIGHT - 1]);
    let err = offscreen_orchestrator(&gpu, CanvasSize::default(), sources)
        .err()
        .unwrap();
    assert_eq!(
        err.downcast_ref::<ContractError>(),
        Some(&ContractError::DirectSizeMismatch {
            len: WIDTH * HEIGHT - 1,
            width: 640,
            height: 512,
        })
    );
    assert!(err.to_string().contains("327679"));
}

#[test]
fn bytes_map_to_grey_levels() {
    let Some(gpu) = gpu() else { return };

    let bytes: Vec<u8> = (0..WIDTH * HEIGHT).map(|i| (i % WIDTH % 256) as u8).collect();
    let mut orchestrator =
        offscreen_orchestrator(&gpu, CanvasSize::default(), direct_sources(bytes)).unwrap();
    orchestrator.render_direct().unwrap();

    let frame = orchestrator.canvas().read_pixels().unwrap();
    for x in [0u32, 10, 128, 255, 300] {
        let level = (x % 256) as u8;
        let [r, g, b, a] = frame.pixel(x, 7).unwrap();
        assert!(r.abs_diff(level) <= 1, "x={x}: {r} vs {level}");
        assert_eq!((r, r, 255), (g, b, a));
    }
}

#[test]
fn srgb_target_stores_bytes_verbatim() {
    let Some(gpu) = gpu() else { return };

    let canvas = OffscreenCanvas::with_format(
        &gpu,
        CanvasSize::default(),
        wgpu::TextureFormat::Rgba8UnormSrgb,
    )
    .unwrap();
    assert_eq!(canvas.storage_format(), wgpu::TextureFormat::Rgba8UnormSrgb);
    assert!(!canvas.format().is_srgb());

    let shader = ShaderProgram::builtin(gpu.device());
    let sources = direct_sources(vec![128u8; WIDTH * HEIGHT]);
    let mut orchestrator = FrameOrchestrator::new(&gpu, canvas, &shader, sources).unwrap();
    orchestrator.render_direct().unwrap();

    let frame = orchestrator.canvas().read_pixels().unwrap();
    assert_eq!(frame.pixel(0, 0), Some([128, 128, 128, 255]));
    assert_eq!(frame.pixel(639, 511), Some([128, 128, 128, 255]));
}

#[test]
fn region_at_offset_into_larger_backing() {
    let Some(gpu) = gpu() else { return };

    let header = 1024;
    let mut bytes = vec![0u8; header + WIDTH * HEIGHT];
    bytes[header..].fill(255);
    let region = BufferRegion::new(shared_bytes(bytes), header, WIDTH * HEIGHT).unwrap();

    let mut orchestrator =
        offscreen_orchestrator(&gpu, CanvasSize::default(), FrameSources::direct(region))
            .unwrap();
    orchestrator.render_direct().unwrap();

    let frame = orchestrator.canvas().read_pixels().unwrap();
    let expected = Snapshot::filled(CanvasSize::default(), WHITE);
    assert!(frame.diff(&expected, FIXTURE_THRESHOLD).unwrap().matches_fixture());
}

#[test]
fn smaller_canvas_takes_its_own_pixel_count() {
    let Some(gpu) = gpu() else { return };

    let size = CanvasSize::new(320, 200);
    let mut orchestrator =
        offscreen_orchestrator(&gpu, size, direct_sources(vec![0u8; 320 * 200])).unwrap();
    orchestrator.render_direct().unwrap();
    let frame = orchestrator.canvas().read_pixels().unwrap();
    assert_eq!(frame.pixel(319, 199), Some(BLACK));

    let err = offscreen_orchestrator(&gpu, size, direct_sources(vec![0u8; WIDTH * HEIGHT]))
        .err()
        .unwrap();
    assert!(matches!(
        err.downcast_ref::<ContractError>(),
        Some(ContractError::DirectSizeMismatch { .. })
    ));
}

#[test]
fn both_paths_share_one_canvas() {
    let Some(gpu) = gpu() else { return };

    let field_region = BufferRegion::whole(shared_bytes(vec![0u8; 116])).unwrap();
    let direct_region = BufferRegion::whole(shared_bytes(vec![255u8; WIDTH * HEIGHT])).unwrap();
    let mut orchestrator = offscreen_orchestrator(
        &gpu,
        CanvasSize::default(),
        FrameSources::both(field_region, direct_region),
    )
    .unwrap();
    assert!(orchestrator.has_path(RenderPath::FieldData));
    assert!(orchestrator.has_path(RenderPath::Direct));

    orchestrator.render_direct().unwrap();
    assert_eq!(orchestrator.canvas().read_pixels().unwrap().pixel(5, 5), Some(WHITE));

    // Each frame clears first, so the direct frame does not bleed through.
    orchestrator.render_field_data().unwrap();
    assert_eq!(
        orchestrator.canvas().read_pixels().unwrap().pixel(5, 5),
        Some(TRANSPARENT)
    );
}

#[test]
fn invalid_direct_source_rejects_whole_orchestrator() {
    let Some(gpu) = gpu() else { return };

    let field_region = BufferRegion::whole(shared_bytes(vec![0u8; 116])).unwrap();
    let direct_region = BufferRegion::whole(shared_bytes(vec![0u8; 10])).unwrap();
    let result = offscreen_orchestrator(
        &gpu,
        CanvasSize::default(),
        FrameSources::both(field_region, direct_region),
    );
    assert!(result.is_err());
}

#[test]
fn no_sources_is_an_error() {
    let Some(gpu) = gpu() else { return };

    assert!(offscreen_orchestrator(&gpu, CanvasSize::default(), FrameSources::default()).is_err());
}
