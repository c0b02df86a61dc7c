//! Inverse-distance interpolation of sparse samples onto a classified grid.

use crate::interpolation::grid::{GridConfig, HeatGrid, HeatSample};
use crate::interpolation::steps::{Band, GridSteps};
use log::debug;
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::RTree;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Where the per-cell work runs. Both backends produce identical grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    Serial,
    /// Rows are interpolated on the rayon thread pool.
    #[default]
    Parallel,
}

/// Renders heat samples into a [`HeatGrid`].
///
/// Every sample within `radius` cells of a cell contributes with weight
/// `1 / distance`; the cell value is the weighted mean. A sample lying exactly
/// on a cell overrides the weighting and the cell takes the mean of such
/// samples. Cells no sample reaches stay empty. Samples with non-finite values
/// are ignored.
///
/// # Examples
///
/// ```
/// use aviwx::{Band, GridConfig, GridSteps, HeatMap, HeatSample};
///
/// let steps = GridSteps::from_thresholds([80.0, 100.0, 110.0, 120.0, 130.0, 140.0]).unwrap();
/// let grid = HeatMap::render(&[HeatSample::new(5, 5, 90.0)], &GridConfig::new(10, 10, 2), &steps);
///
/// assert_eq!(grid.band_at(5, 5), Some(Band::Red));
/// assert_eq!(grid.band_at(0, 0), None);
/// ```
pub struct HeatMap;

impl HeatMap {
    pub fn render(samples: &[HeatSample], config: &GridConfig, steps: &GridSteps) -> HeatGrid {
        Self::render_with(samples, config, steps, Backend::default())
    }

    pub fn render_with(
        samples: &[HeatSample],
        config: &GridConfig,
        steps: &GridSteps,
        backend: Backend,
    ) -> HeatGrid {
        let samples: Vec<&HeatSample> = samples
            .iter()
            .filter(|sample| sample.value.is_finite())
            .collect();

        if samples.is_empty() || config.radius <= 0 || config.width == 0 || config.height == 0 {
            return HeatGrid::empty(config.width, config.height);
        }

        let tree = RTree::bulk_load(
            samples
                .iter()
                .enumerate()
                .map(|(index, sample)| {
                    IndexedPoint::new([f64::from(sample.x), f64::from(sample.y)], index)
                })
                .collect(),
        );
        let max_distance_2 = f64::from(config.radius) * f64::from(config.radius);

        let classify_row = |y: usize, row: &mut [Option<Band>]| {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = interpolate_cell(&tree, &samples, x as f64, y as f64, max_distance_2)
                    .map(|value| steps.classify(value));
            }
        };

        let mut cells = vec![None; config.width * config.height];
        match backend {
            Backend::Serial => cells
                .chunks_mut(config.width)
                .enumerate()
                .for_each(|(y, row)| classify_row(y, row)),
            Backend::Parallel => cells
                .par_chunks_mut(config.width)
                .enumerate()
                .for_each(|(y, row)| classify_row(y, row)),
        }

        let grid = HeatGrid::from_cells(config.width, config.height, cells);
        debug!(
            "Rendered {}x{} heat map from {} samples, {} cells filled",
            config.width,
            config.height,
            samples.len(),
            grid.filled()
        );
        grid
    }
}

/// Weighted mean of the samples reaching (x, y), `None` if there are none.
///
/// Contributions are summed in sample order so the result does not depend on
/// R-tree traversal order.
fn interpolate_cell(
    tree: &RTree<IndexedPoint>,
    samples: &[&HeatSample],
    x: f64,
    y: f64,
    max_distance_2: f64,
) -> Option<f64> {
    let mut hits: Vec<(usize, f64)> = tree
        .locate_within_distance([x, y], max_distance_2)
        .map(|point| {
            let [px, py] = *point.geom();
            let (dx, dy) = (px - x, py - y);
            (point.data, dx * dx + dy * dy)
        })
        .collect();
    if hits.is_empty() {
        return None;
    }
    hits.sort_unstable_by_key(|(index, _)| *index);

    let (exact_sum, exact_count) = hits
        .iter()
        .filter(|(_, distance_2)| *distance_2 == 0.0)
        .fold((0.0, 0usize), |(sum, count), (index, _)| {
            (sum + samples[*index].value, count + 1)
        });
    if exact_count > 0 {
        return Some(exact_sum / exact_count as f64);
    }

    let (weighted, total_weight) =
        hits.iter()
            .fold((0.0, 0.0), |(weighted, total), (index, distance_2)| {
                let weight = 1.0 / distance_2.sqrt();
                (weighted + weight * samples[*index].value, total + weight)
            });
    Some(weighted / total_weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_80_to_100() -> GridSteps {
        GridSteps::from_thresholds([80.0, 100.0, 110.0, 120.0, 130.0, 140.0]).unwrap()
    }

    fn within(x: usize, y: usize, cx: i32, cy: i32, radius: i32) -> bool {
        let dx = x as i32 - cx;
        let dy = y as i32 - cy;
        dx * dx + dy * dy <= radius * radius
    }

    #[test]
    fn test_single_sample_bands_cells_within_radius() {
        let config = GridConfig::new(10, 10, 2);
        let grid = HeatMap::render(&[HeatSample::new(5, 5, 90.0)], &config, &red_80_to_100());

        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 10);
        for y in 0..10 {
            for x in 0..10 {
                let expected = within(x, y, 5, 5, 2).then_some(Band::Red);
                assert_eq!(grid.band_at(x, y), expected, "cell ({x}, {y})");
            }
        }
        // the disc of radius 2 on a lattice has 13 cells
        assert_eq!(grid.filled(), 13);
    }

    #[test]
    fn test_empty_samples_give_blank_grid_of_configured_size() {
        let grid = HeatMap::render(&[], &GridConfig::new(7, 3, 5), &red_80_to_100());
        assert_eq!(grid, HeatGrid::empty(7, 3));
    }

    #[test]
    fn test_non_positive_radius_gives_blank_grid() {
        let samples = [HeatSample::new(1, 1, 90.0)];
        for radius in [0, -3] {
            let grid = HeatMap::render(&samples, &GridConfig::new(4, 4, radius), &red_80_to_100());
            assert!(grid.is_blank());
            assert_eq!(grid.cells().len(), 16);
        }
    }

    #[test]
    fn test_closer_sample_dominates() {
        // cell x=1 is 1 away from the first sample and 5 away from the
        // second: (1*50 + 0.2*125) / 1.2 = 62.5
        let samples = [HeatSample::new(0, 0, 50.0), HeatSample::new(6, 0, 125.0)];
        let grid = HeatMap::render(&samples, &GridConfig::new(7, 1, 6), &red_80_to_100());
        assert_eq!(grid.band_at(0, 0), Some(Band::Purple));
        assert_eq!(grid.band_at(1, 0), Some(Band::Purple));
        assert_eq!(grid.band_at(6, 0), Some(Band::Green));
        // (0.2*50 + 1*125) / 1.2 = 112.5
        assert_eq!(grid.band_at(5, 0), Some(Band::Yellow));
    }

    #[test]
    fn test_exact_hit_overrides_neighbours() {
        let samples = [HeatSample::new(2, 0, 135.0), HeatSample::new(3, 0, 10.0)];
        let grid = HeatMap::render(&samples, &GridConfig::new(5, 1, 3), &red_80_to_100());
        assert_eq!(grid.band_at(2, 0), Some(Band::Blue));
        assert_eq!(grid.band_at(3, 0), Some(Band::Purple));
    }

    #[test]
    fn test_samples_outside_grid_still_contribute() {
        let samples = [HeatSample::new(-1, 0, 90.0)];
        let grid = HeatMap::render(&samples, &GridConfig::new(3, 1, 2), &red_80_to_100());
        assert_eq!(grid.band_at(0, 0), Some(Band::Red));
        assert_eq!(grid.band_at(1, 0), Some(Band::Red));
        assert_eq!(grid.band_at(2, 0), None);
    }

    #[test]
    fn test_non_finite_samples_are_ignored() {
        let samples = [HeatSample::new(1, 1, f64::NAN)];
        let grid = HeatMap::render(&samples, &GridConfig::new(3, 3, 2), &red_80_to_100());
        assert!(grid.is_blank());
    }

    #[test]
    fn test_serial_and_parallel_backends_agree() {
        let samples: Vec<HeatSample> = (0..40)
            .map(|i| HeatSample::new((i * 7) % 64, (i * 13) % 48, f64::from((i * 37) % 150)))
            .collect();
        let config = GridConfig::new(64, 48, 9);
        let steps = red_80_to_100();

        let serial = HeatMap::render_with(&samples, &config, &steps, Backend::Serial);
        let parallel = HeatMap::render_with(&samples, &config, &steps, Backend::Parallel);
        assert_eq!(serial, parallel);
        assert!(!serial.is_blank());
    }
}
