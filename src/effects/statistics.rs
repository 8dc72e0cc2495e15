use crate::engine::accumulate::ImageStatistics;
use crate::engine::invocation::{Effect, SetupContext};
use crate::foundation::core::Rect;
use crate::foundation::error::{TileFxError, TileFxResult};
use crate::pixel::types::{Color, Pixel};
use crate::view::image::{ImageView, TileMut};

/// What the statistics effect writes into its output clip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticsOutput {
    /// Copy the source unchanged (converting the channel encoding).
    Source,
    /// Broadcast the two-stage mean.
    #[default]
    Average,
    /// Broadcast the per-channel minimum.
    ChannelMin,
    /// Broadcast the per-channel maximum.
    ChannelMax,
    /// Broadcast the darkest pixel.
    LuminosityMin,
    /// Broadcast the brightest pixel.
    LuminosityMax,
}

/// Computes statistics over a region of the source clip and publishes them.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageStatisticsEffect {
    /// Analyzed region in canonical (full-scale) coordinates. `None` analyzes the whole source.
    pub region: Option<Rect>,
    /// Value written to the destination.
    pub output: StatisticsOutput,
}

/// Setup result of [`ImageStatisticsEffect`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatisticsSetup {
    /// Statistics of the analyzed region.
    pub statistics: ImageStatistics,
    /// Pixel rect that was analyzed after render-scale mapping and clipping.
    pub region: Rect,
    fill: Option<Color>,
}

impl Effect for ImageStatisticsEffect {
    type Setup = StatisticsSetup;

    fn setup<S: Pixel>(
        &self,
        ctx: &SetupContext<'_>,
        src: Option<&ImageView<'_, S>>,
    ) -> TileFxResult<StatisticsSetup> {
        let src = src.ok_or_else(|| TileFxError::validation("image statistics needs a source clip"))?;
        let region = self
            .region
            .map_or(src.bounds(), |r| r.scaled(ctx.args().render_scale))
            .intersect(src.bounds());

        let statistics = ctx.statistics(src, region)?.statistics();
        tracing::debug!(region = %region, pixels = statistics.pixels, "computed image statistics");

        let fill = match self.output {
            StatisticsOutput::Source => None,
            StatisticsOutput::Average => Some(statistics.average),
            StatisticsOutput::ChannelMin => Some(statistics.channel_min),
            StatisticsOutput::ChannelMax => Some(statistics.channel_max),
            StatisticsOutput::LuminosityMin => Some(statistics.luminosity_min),
            StatisticsOutput::LuminosityMax => Some(statistics.luminosity_max),
        };
        Ok(StatisticsSetup {
            statistics,
            region,
            fill,
        })
    }

    fn process_tile<S: Pixel, D: Pixel>(
        &self,
        setup: &StatisticsSetup,
        src: Option<&ImageView<'_, S>>,
        tile: &mut TileMut<'_, D>,
    ) -> TileFxResult<()> {
        if let Some(color) = setup.fill {
            tile.fill(D::from_color(color));
            return Ok(());
        }

        let src = src.ok_or_else(|| TileFxError::validation("source output needs a source clip"))?;
        let x1 = tile.rect().x1;
        for (y, row) in tile.rows_mut() {
            for (x, dst) in (x1..).zip(row.chunks_exact_mut(D::CHANNELS)) {
                let px = src.pixel(x, y).map(D::convert::<S>).unwrap_or_default();
                px.write(dst);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/statistics.rs"]
mod tests;
