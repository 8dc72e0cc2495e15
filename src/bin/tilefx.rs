use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "tilefx", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Engine options JSON file (overridden by --threads / --tile-rows).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads for a dedicated pool.
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Fixed rows per tile instead of automatic tiling.
    #[arg(long, global = true)]
    tile_rows: Option<u32>,

    /// Log engine decisions at debug level.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print statistics of an image as JSON.
    Stats(StatsArgs),
    /// Write the selected statistic (or the converted source) as a new image.
    Apply(ApplyArgs),
}

#[derive(Parser, Debug)]
struct StatsArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Analyzed region as `x1,y1,x2,y2` (default: whole image).
    #[arg(long, value_parser = parse_rect)]
    region: Option<tilefx::Rect>,
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output image; the format follows the extension.
    #[arg(long)]
    out: PathBuf,

    /// Value written into every output pixel.
    #[arg(long, value_enum, default_value_t = OutputArg::Average)]
    output: OutputArg,

    /// Analyzed region as `x1,y1,x2,y2` (default: whole image).
    #[arg(long, value_parser = parse_rect)]
    region: Option<tilefx::Rect>,

    /// Channel depth of the output (default: same as input).
    #[arg(long, value_enum)]
    depth: Option<DepthArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputArg {
    Source,
    Average,
    ChannelMin,
    ChannelMax,
    LuminosityMin,
    LuminosityMax,
}

impl From<OutputArg> for tilefx::StatisticsOutput {
    fn from(v: OutputArg) -> Self {
        match v {
            OutputArg::Source => tilefx::StatisticsOutput::Source,
            OutputArg::Average => tilefx::StatisticsOutput::Average,
            OutputArg::ChannelMin => tilefx::StatisticsOutput::ChannelMin,
            OutputArg::ChannelMax => tilefx::StatisticsOutput::ChannelMax,
            OutputArg::LuminosityMin => tilefx::StatisticsOutput::LuminosityMin,
            OutputArg::LuminosityMax => tilefx::StatisticsOutput::LuminosityMax,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DepthArg {
    U8,
    U16,
    F32,
}

impl From<DepthArg> for tilefx::ChannelEncoding {
    fn from(v: DepthArg) -> Self {
        match v {
            DepthArg::U8 => tilefx::ChannelEncoding::U8,
            DepthArg::U16 => tilefx::ChannelEncoding::U16,
            DepthArg::F32 => tilefx::ChannelEncoding::F32,
        }
    }
}

fn parse_rect(s: &str) -> Result<tilefx::Rect, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<i32>().map_err(|e| format!("'{p}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    let [x1, y1, x2, y2] = parts[..] else {
        return Err(format!("expected x1,y1,x2,y2, got '{s}'"));
    };
    tilefx::Rect::new(x1, y1, x2, y2).map_err(|e| e.to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let engine = tilefx::Engine::new(engine_opts(&cli)?)?;
    match cli.cmd {
        Command::Stats(args) => cmd_stats(&engine, args),
        Command::Apply(args) => cmd_apply(&engine, args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn engine_opts(cli: &Cli) -> anyhow::Result<tilefx::EngineOpts> {
    let mut opts = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("read engine config '{}'", path.display()))?;
            tilefx::EngineOpts::from_json_str(&json)?
        }
        None => tilefx::EngineOpts::default(),
    };
    if cli.threads.is_some() {
        opts.threads = cli.threads;
    }
    if let Some(rows) = cli.tile_rows {
        opts.granularity = tilefx::TileGranularity::Rows(rows);
    }
    Ok(opts)
}

fn cmd_stats(engine: &tilefx::Engine, args: StatsArgs) -> anyhow::Result<()> {
    let frame = tilefx::Frame::open(&args.in_path)?;
    let src = frame.view()?;
    let region = args.region.unwrap_or_else(|| src.bounds());

    let stats = tilefx::dispatch_source(
        &src,
        tilefx::FormatSupport::all(),
        StatsVisitor { engine, region },
    )?;
    let json = serde_json::to_string_pretty(&stats).context("serialize statistics")?;
    println!("{json}");
    Ok(())
}

struct StatsVisitor<'e> {
    engine: &'e tilefx::Engine,
    region: tilefx::Rect,
}

impl tilefx::SourceVisitor for StatsVisitor<'_> {
    type Output = tilefx::ImageStatistics;

    fn visit<S: tilefx::Pixel>(
        self,
        src: tilefx::ImageView<'_, S>,
    ) -> tilefx::TileFxResult<tilefx::ImageStatistics> {
        Ok(self.engine.accumulate(&src, self.region)?.statistics())
    }
}

fn cmd_apply(engine: &tilefx::Engine, args: ApplyArgs) -> anyhow::Result<()> {
    let input = tilefx::Frame::open(&args.in_path)?;
    let in_format = input.format();
    let out_format = tilefx::PixelFormat::of(
        args.depth.map_or(in_format.encoding, Into::into),
        in_format.model,
    );
    let mut output = tilefx::Frame::blank(input.width(), input.height(), out_format);

    let effect = tilefx::ImageStatisticsEffect {
        region: args.region,
        output: args.output.into(),
    };
    let src = input.view()?;
    let dst = output.view_mut()?;
    let invocation = tilefx::RenderInvocation::new(tilefx::RenderArgs::new(src.bounds()), dst)
        .with_source(src);
    let report = engine.render(&effect, invocation, &tilefx::NeverCancel)?;
    tracing::debug!(outcome = ?report.outcome, pixels = report.setup.statistics.pixels, "render finished");

    output.save(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
