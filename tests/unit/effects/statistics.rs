use super::*;
use crate::engine::cancel::NeverCancel;
use crate::engine::invocation::{RenderArgs, RenderInvocation};
use crate::engine::session::{Engine, EngineOpts};
use crate::foundation::core::RenderScale;
use crate::pixel::format::ColorModel;
use crate::view::any::{AnyImageView, AnyImageViewMut};

fn render_f32_rgba(
    effect: &ImageStatisticsEffect,
    src: &[f32],
    width: u32,
    height: u32,
    args: RenderArgs,
) -> (StatisticsSetup, Vec<f32>) {
    let engine = Engine::new(EngineOpts::default()).unwrap();
    let mut dst = vec![-1.0f32; src.len()];
    let src_view = AnyImageView::packed(src, ColorModel::Rgba, width, height).unwrap();
    let dst_view = AnyImageViewMut::packed(&mut dst, ColorModel::Rgba, width, height).unwrap();
    let report = engine
        .render(
            effect,
            RenderInvocation::new(args, dst_view).with_source(src_view),
            &NeverCancel,
        )
        .unwrap();
    assert!(report.outcome.is_completed());
    (report.setup, dst)
}

fn gradient_4x4() -> Vec<f32> {
    let mut data = Vec::with_capacity(4 * 4 * 4);
    for y in 0..4 {
        for x in 0..4 {
            data.extend_from_slice(&[x as f32 / 4.0, y as f32 / 4.0, 0.5, 1.0]);
        }
    }
    data
}

#[test]
fn average_is_broadcast_to_every_pixel() {
    let effect = ImageStatisticsEffect {
        region: None,
        output: StatisticsOutput::Average,
    };
    let (setup, dst) = render_f32_rgba(
        &effect,
        &gradient_4x4(),
        4,
        4,
        RenderArgs::new(Rect::from_size(4, 4)),
    );
    assert_eq!(setup.statistics.pixels, 16);
    assert_eq!(setup.statistics.average, Color::new(0.375, 0.375, 0.5, 1.0));
    for px in dst.chunks_exact(4) {
        assert_eq!(px, &[0.375, 0.375, 0.5, 1.0]);
    }
}

#[test]
fn channel_min_combines_channels_of_different_pixels() {
    let src = [
        0.5f32, 0.2, 0.9, 1.0, //
        0.1, 0.8, 0.3, 1.0, //
        0.7, 0.6, 0.05, 0.5, //
        0.4, 0.4, 0.4, 0.9,
    ];
    let effect = ImageStatisticsEffect {
        region: None,
        output: StatisticsOutput::ChannelMin,
    };
    let (_, dst) = render_f32_rgba(&effect, &src, 2, 2, RenderArgs::new(Rect::from_size(2, 2)));
    for px in dst.chunks_exact(4) {
        assert_eq!(px, &[0.1, 0.2, 0.05, 0.5]);
    }
}

#[test]
fn region_follows_render_scale() {
    let effect = ImageStatisticsEffect {
        region: Some(Rect::new(0, 0, 4, 2).unwrap()),
        output: StatisticsOutput::ChannelMax,
    };
    let args = RenderArgs::new(Rect::from_size(4, 4))
        .with_render_scale(RenderScale::new(0.5, 0.5).unwrap());
    let (setup, dst) = render_f32_rgba(&effect, &gradient_4x4(), 4, 4, args);
    assert_eq!(setup.region, Rect::new(0, 0, 2, 1).unwrap());
    assert_eq!(setup.statistics.pixels, 2);
    assert_eq!(&dst[..4], &[0.25, 0.0, 0.5, 1.0]);
}

#[test]
fn render_window_limits_written_pixels() {
    let effect = ImageStatisticsEffect {
        region: None,
        output: StatisticsOutput::LuminosityMax,
    };
    let (_, dst) = render_f32_rgba(
        &effect,
        &gradient_4x4(),
        4,
        4,
        RenderArgs::new(Rect::new(0, 3, 4, 4).unwrap()),
    );
    assert!(dst[..12 * 4].iter().all(|&v| v == -1.0));
    for px in dst[12 * 4..].chunks_exact(4) {
        assert_eq!(px, &[0.75, 0.75, 0.5, 1.0]);
    }
}

#[test]
fn source_output_converts_encodings() {
    let engine = Engine::new(EngineOpts::default()).unwrap();
    let src = [0u16, 65535, 32896];
    let mut dst = [0u8; 3];
    let invocation = RenderInvocation::new(
        RenderArgs::new(Rect::from_size(3, 1)),
        AnyImageViewMut::packed(&mut dst, ColorModel::Gray, 3, 1).unwrap(),
    )
    .with_source(AnyImageView::packed(&src, ColorModel::Gray, 3, 1).unwrap());
    let effect = ImageStatisticsEffect {
        region: None,
        output: StatisticsOutput::Source,
    };
    engine.render(&effect, invocation, &NeverCancel).unwrap();
    assert_eq!(dst, [0, 255, 128]);
}

#[test]
fn missing_source_is_rejected() {
    let engine = Engine::new(EngineOpts::default()).unwrap();
    let mut dst = [0u8; 4];
    let invocation = RenderInvocation::new(
        RenderArgs::new(Rect::from_size(1, 1)),
        AnyImageViewMut::packed(&mut dst, ColorModel::Rgba, 1, 1).unwrap(),
    );
    let err = engine
        .render(&ImageStatisticsEffect::default(), invocation, &NeverCancel)
        .unwrap_err();
    assert!(matches!(err, TileFxError::Validation(_)), "{err}");
}

#[test]
fn effect_parameters_deserialize() {
    let effect: ImageStatisticsEffect = serde_json::from_str(
        r#"{"region": {"x1": 0, "y1": 0, "x2": 8, "y2": 8}, "output": "luminosity_min"}"#,
    )
    .unwrap();
    assert_eq!(effect.output, StatisticsOutput::LuminosityMin);
    assert_eq!(effect.region, Some(Rect::from_size(8, 8)));
}
