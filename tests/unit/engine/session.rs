use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::*;
use crate::engine::cancel::NeverCancel;
use crate::pixel::channel::Channel;
use crate::pixel::format::{ChannelEncoding, ColorModel, FormatSupport};
use crate::pixel::types::{Gray, Rgba};
use crate::view::any::{AnyImageView, AnyImageViewMut};

/// Writes the source pixel brightened by `setup` into the destination.
struct Brighten {
    amount: f32,
    support: FormatSupport,
    concurrency: Concurrency,
    setup_ran: AtomicBool,
    threads: Mutex<Vec<std::thread::ThreadId>>,
}

impl Brighten {
    fn new(amount: f32) -> Self {
        Self {
            amount,
            support: FormatSupport::all(),
            concurrency: Concurrency::Parallel,
            setup_ran: AtomicBool::new(false),
            threads: Mutex::new(Vec::new()),
        }
    }
}

impl Effect for Brighten {
    type Setup = f32;

    fn supported_formats(&self) -> FormatSupport {
        self.support
    }

    fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    fn setup<S: Pixel>(
        &self,
        _ctx: &SetupContext<'_>,
        _src: Option<&ImageView<'_, S>>,
    ) -> TileFxResult<f32> {
        self.setup_ran.store(true, Ordering::SeqCst);
        Ok(self.amount)
    }

    fn process_tile<S: Pixel, D: Pixel>(
        &self,
        setup: &f32,
        src: Option<&ImageView<'_, S>>,
        tile: &mut TileMut<'_, D>,
    ) -> TileFxResult<()> {
        self.threads.lock().unwrap().push(std::thread::current().id());
        let src = src.ok_or_else(|| TileFxError::validation("needs source"))?;
        let x1 = tile.rect().x1;
        for (y, row) in tile.rows_mut() {
            for (x, dst) in (x1..).zip(row.chunks_exact_mut(D::CHANNELS)) {
                let mut px = D::convert(src.pixel(x, y).unwrap_or_default());
                for c in px.channels_mut() {
                    *c = <D::Channel as Channel>::demote(c.promote() + setup);
                }
                px.write(dst);
            }
        }
        Ok(())
    }
}

#[test]
fn default_opts_are_parallel_with_auto_tiling() {
    let opts = EngineOpts::default();
    assert!(opts.parallel);
    assert_eq!(opts.threads, None);
    assert_eq!(opts.granularity, TileGranularity::Auto);
    assert_eq!(opts.row_poll_threshold, DEFAULT_ROW_POLL_THRESHOLD);
    assert!(!opts.parallel_statistics);
}

#[test]
fn opts_load_from_partial_json() {
    let opts =
        EngineOpts::from_json_str(r#"{"threads": 2, "granularity": {"rows": 8}}"#).unwrap();
    assert_eq!(opts.threads, Some(2));
    assert_eq!(opts.granularity, TileGranularity::Rows(8));
    assert!(opts.parallel);

    assert!(matches!(
        EngineOpts::from_json_str(r#"{"thread": 2}"#),
        Err(TileFxError::Serde(_))
    ));
    assert!(matches!(
        EngineOpts::from_json_str(r#"{"threads": 0}"#),
        Err(TileFxError::Validation(_))
    ));
}

#[test]
fn engine_rejects_zero_threads() {
    let opts = EngineOpts {
        threads: Some(0),
        ..EngineOpts::default()
    };
    assert!(Engine::new(opts).is_err());
}

#[test]
fn worker_count_follows_options() {
    let serial = Engine::new(EngineOpts {
        parallel: false,
        threads: Some(8),
        ..EngineOpts::default()
    })
    .unwrap();
    assert_eq!(serial.worker_count(), 1);

    let dedicated = Engine::new(EngineOpts {
        threads: Some(3),
        ..EngineOpts::default()
    })
    .unwrap();
    assert_eq!(dedicated.worker_count(), 3);
}

#[test]
fn render_region_clips_the_window() {
    let engine = Engine::new(EngineOpts::default()).unwrap();
    let mut data = vec![0u8; 4 * 4];
    let dst = ImageViewMut::<Gray<u8>>::packed(&mut data, 4, 4).unwrap();
    let outcome = engine
        .render_region(
            dst,
            Rect::new(2, 2, 10, 10).unwrap(),
            Concurrency::Parallel,
            |tile: &mut TileMut<'_, Gray<u8>>| {
                tile.fill(Gray::new(1));
                Ok(())
            },
            &NeverCancel,
        )
        .unwrap();
    assert_eq!(outcome, RenderOutcome::Completed { tiles: 2 });
    assert_eq!(data, vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 1, 1]);
}

#[test]
fn empty_window_completes_without_tiles() {
    let engine = Engine::new(EngineOpts::default()).unwrap();
    let mut data = vec![7u8; 4];
    let dst = ImageViewMut::<Gray<u8>>::packed(&mut data, 2, 2).unwrap();
    let outcome = engine
        .render_region(
            dst,
            Rect::new(5, 5, 9, 9).unwrap(),
            Concurrency::Parallel,
            |_: &mut TileMut<'_, Gray<u8>>| panic!("no tile expected"),
            &NeverCancel,
        )
        .unwrap();
    assert_eq!(outcome, RenderOutcome::Completed { tiles: 0 });
    assert_eq!(data, vec![7; 4]);
}

#[test]
fn render_converts_between_source_and_destination_depths() {
    let engine = Engine::new(EngineOpts {
        threads: Some(2),
        ..EngineOpts::default()
    })
    .unwrap();
    let src_data = vec![0u8, 51, 102, 255];
    let mut dst_data = vec![0.0f32; 4];
    let src = AnyImageView::packed(&src_data, ColorModel::Gray, 2, 2).unwrap();
    let dst = AnyImageViewMut::packed(&mut dst_data, ColorModel::Gray, 2, 2).unwrap();
    let invocation =
        RenderInvocation::new(RenderArgs::new(Rect::from_size(2, 2)), dst).with_source(src);

    let effect = Brighten::new(0.0);
    let report = engine.render(&effect, invocation, &NeverCancel).unwrap();
    assert!(report.outcome.is_completed());
    assert_eq!(report.setup, 0.0);
    assert_eq!(dst_data, vec![0.0, 0.2, 0.4, 1.0]);
}

#[test]
fn unsupported_formats_fail_before_setup() {
    let engine = Engine::new(EngineOpts::default()).unwrap();
    let src_data = vec![0u16; 4];
    let mut dst_data = vec![9u16; 4];
    let src = AnyImageView::packed(&src_data, ColorModel::Rgba, 1, 1).unwrap();
    let dst = AnyImageViewMut::packed(&mut dst_data, ColorModel::Rgba, 1, 1).unwrap();
    let invocation =
        RenderInvocation::new(RenderArgs::new(Rect::from_size(1, 1)), dst).with_source(src);

    let mut effect = Brighten::new(0.5);
    effect.support = FormatSupport::only(&[ChannelEncoding::U8], &ColorModel::ALL);
    let err = engine.render(&effect, invocation, &NeverCancel).unwrap_err();
    assert!(matches!(err, TileFxError::FormatUnsupported(_)), "{err}");
    assert!(!effect.setup_ran.load(Ordering::SeqCst));
    assert_eq!(dst_data, vec![9; 4]);
}

#[test]
fn serial_effects_run_on_the_calling_thread() {
    let engine = Engine::new(EngineOpts {
        threads: Some(4),
        ..EngineOpts::default()
    })
    .unwrap();
    let src_data = vec![0u8; 8 * 100 * 4];
    let mut dst_data = vec![0u8; 8 * 100 * 4];
    let src = AnyImageView::packed(&src_data, ColorModel::Rgba, 8, 100).unwrap();
    let dst = AnyImageViewMut::packed(&mut dst_data, ColorModel::Rgba, 8, 100).unwrap();
    let invocation =
        RenderInvocation::new(RenderArgs::new(Rect::from_size(8, 100)), dst).with_source(src);

    let mut effect = Brighten::new(1.0);
    effect.concurrency = Concurrency::Serial;
    let report = engine.render(&effect, invocation, &NeverCancel).unwrap();
    // One worker means one 100-row tile, executed row by row.
    assert_eq!(report.outcome, RenderOutcome::Completed { tiles: 1 });

    let me = std::thread::current().id();
    let threads = effect.threads.lock().unwrap();
    assert_eq!(threads.len(), 100);
    assert!(threads.iter().all(|&t| t == me));
    assert!(dst_data.iter().all(|&v| v == 255));
}

#[test]
fn parallel_statistics_merge_in_tile_order() {
    let (w, h) = (16u32, 300u32);
    let data: Vec<u8> = (0..w * h * 4).map(|i| (i * 7 % 251) as u8).collect();
    let view = ImageView::<Rgba<u8>>::packed(&data, w, h).unwrap();

    let sequential = Engine::new(EngineOpts::default()).unwrap();
    let parallel = Engine::new(EngineOpts {
        threads: Some(3),
        parallel_statistics: true,
        ..EngineOpts::default()
    })
    .unwrap();

    let a = sequential.accumulate(&view, view.bounds()).unwrap();
    let b = parallel.accumulate(&view, view.bounds()).unwrap();
    assert_eq!(a.pixels(), b.pixels());
    assert_eq!(a.channel_min(), b.channel_min());
    assert_eq!(a.channel_max(), b.channel_max());
    assert_eq!(a.luminosity_min(), b.luminosity_min());
    assert_eq!(a.luminosity_max(), b.luminosity_max());
    for (x, y) in a.mean().iter().zip(b.mean()) {
        assert!((x - y).abs() < 1e-12);
    }

    let again = parallel.accumulate(&view, view.bounds()).unwrap();
    assert_eq!(again, b);
}
