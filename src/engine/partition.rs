use crate::foundation::core::Rect;
use crate::foundation::math::div_ceil_u32;

/// Regions up to this many rows are tiled one scanline per tile.
pub const SCANLINE_TILING_MAX_HEIGHT: u32 = 64;

/// One unit of parallel work: a full-width band of rows of the render window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    /// Position in the partition, top to bottom.
    pub index: usize,
    /// Covered pixels.
    pub rect: Rect,
}

/// How many rows each tile spans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileGranularity {
    /// One row per tile for short regions, otherwise `ceil(height / workers)` rows.
    #[default]
    Auto,
    /// Fixed row count per tile (0 is treated as 1).
    Rows(u32),
}

impl TileGranularity {
    fn rows_per_tile(self, height: u32, workers: usize) -> u32 {
        match self {
            TileGranularity::Rows(n) => n.max(1),
            TileGranularity::Auto => {
                let workers = u32::try_from(workers.max(1)).unwrap_or(u32::MAX);
                if height <= SCANLINE_TILING_MAX_HEIGHT || height <= workers {
                    1
                } else {
                    div_ceil_u32(height, workers)
                }
            }
        }
    }
}

/// Split `region` into disjoint, full-width row tiles whose union is exactly `region`.
///
/// Tiles never split along x. An empty region yields no tiles.
pub fn partition(region: Rect, workers: usize, granularity: TileGranularity) -> Vec<Tile> {
    if region.is_empty() {
        return Vec::new();
    }
    let rows = granularity.rows_per_tile(region.height(), workers);
    let step = i64::from(rows);

    let mut tiles = Vec::with_capacity(div_ceil_u32(region.height(), rows) as usize);
    let mut y = i64::from(region.y1);
    let end = i64::from(region.y2);
    while y < end {
        let y2 = (y + step).min(end);
        tiles.push(Tile {
            index: tiles.len(),
            rect: Rect {
                x1: region.x1,
                y1: y as i32,
                x2: region.x2,
                y2: y2 as i32,
            },
        });
        y = y2;
    }
    tiles
}

#[cfg(test)]
#[path = "../../tests/unit/engine/partition.rs"]
mod tests;
