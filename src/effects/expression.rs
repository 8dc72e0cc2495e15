use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use anyhow::Context;

use crate::engine::executor::Concurrency;
use crate::engine::invocation::{Effect, SetupContext};
use crate::foundation::core::RenderScale;
use crate::foundation::error::TileFxResult;
use crate::pixel::types::{Color, Pixel};
use crate::view::image::{ImageView, TileMut};

/// Where the expression code comes from.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionSource {
    /// Code given directly as a parameter.
    Inline(String),
    /// Code read from a file when the generator is built.
    File(PathBuf),
}

impl ExpressionSource {
    /// Resolve the expression code. A file that cannot be read is an error.
    pub fn load(&self) -> TileFxResult<String> {
        match self {
            ExpressionSource::Inline(code) => Ok(code.clone()),
            ExpressionSource::File(path) => {
                let code = std::fs::read_to_string(path)
                    .with_context(|| format!("read expression file '{}'", path.display()))?;
                Ok(code)
            }
        }
    }
}

/// Compiled expression evaluator supplied by the expression-language collaborator.
pub trait ExpressionEngine: Send {
    /// Independent evaluator for another tile, or `None` when the evaluator is not reentrant.
    /// Reentrant evaluators let tiles run concurrently, each on its own fork; the others force
    /// serial tile execution.
    fn fork(&self) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }

    /// Evaluate the color at canonical coordinates `(u, v)` and `time`.
    fn eval(&mut self, u: f64, v: f64, time: f64) -> TileFxResult<Color>;
}

/// Generator effect that fills the output clip from an [`ExpressionEngine`].
///
/// Pixel `(x, y)` is evaluated at `(x / scale.x + offset.0, y / scale.y + offset.1)`.
pub struct ExpressionGenerator<E> {
    engine: Mutex<E>,
    reentrant: bool,
    /// Offset added to canonical coordinates before evaluation.
    pub texture_offset: (f64, f64),
}

impl<E: ExpressionEngine> ExpressionGenerator<E> {
    /// Load the code from `source` and compile it with `compile`.
    pub fn new(
        source: &ExpressionSource,
        compile: impl FnOnce(&str) -> TileFxResult<E>,
    ) -> TileFxResult<Self> {
        let code = source.load()?;
        Ok(Self::from_engine(compile(&code)?))
    }

    /// Wrap an already compiled evaluator.
    pub fn from_engine(engine: E) -> Self {
        let reentrant = engine.fork().is_some();
        Self {
            engine: Mutex::new(engine),
            reentrant,
            texture_offset: (0.0, 0.0),
        }
    }

    /// Set the texture offset.
    pub fn with_texture_offset(mut self, x: f64, y: f64) -> Self {
        self.texture_offset = (x, y);
        self
    }
}

/// Setup result of [`ExpressionGenerator`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeneratorSetup {
    /// Frame time passed to the evaluator.
    pub time: f64,
    /// Render scale used to map pixels to canonical coordinates.
    pub render_scale: RenderScale,
}

impl<E: ExpressionEngine> Effect for ExpressionGenerator<E> {
    type Setup = GeneratorSetup;

    fn concurrency(&self) -> Concurrency {
        if self.reentrant {
            Concurrency::Parallel
        } else {
            Concurrency::Serial
        }
    }

    fn setup<S: Pixel>(
        &self,
        ctx: &SetupContext<'_>,
        _src: Option<&ImageView<'_, S>>,
    ) -> TileFxResult<GeneratorSetup> {
        Ok(GeneratorSetup {
            time: ctx.args().time,
            render_scale: ctx.args().render_scale,
        })
    }

    fn process_tile<S: Pixel, D: Pixel>(
        &self,
        setup: &GeneratorSetup,
        _src: Option<&ImageView<'_, S>>,
        tile: &mut TileMut<'_, D>,
    ) -> TileFxResult<()> {
        let (ox, oy) = self.texture_offset;
        let scale = setup.render_scale;
        let x1 = tile.rect().x1;
        let mut eval_tile = |engine: &mut E| -> TileFxResult<()> {
            for (y, row) in tile.rows_mut() {
                let v = f64::from(y) / scale.y + oy;
                for (x, dst) in (x1..).zip(row.chunks_exact_mut(D::CHANNELS)) {
                    let u = f64::from(x) / scale.x + ox;
                    D::from_color(engine.eval(u, v, setup.time)?).write(dst);
                }
            }
            Ok(())
        };

        // A poisoned lock only means an earlier tile panicked.
        let mut prototype = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        if self.reentrant
            && let Some(mut fork) = prototype.fork()
        {
            drop(prototype);
            return eval_tile(&mut fork);
        }
        eval_tile(&mut prototype)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/expression.rs"]
mod tests;
