use std::ops::Range;

use crate::error::CollocError;
use ndarray::{s, Array2};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0088;

const DEFAULT_WINDOW: usize = 10;

/// Latitudes and longitudes of every pixel of a swath, in degrees.
#[derive(Clone, Debug)]
pub struct GeoGrid {
    lats: Array2<f64>,
    lons: Array2<f64>,
}

impl GeoGrid {
    pub fn new(lats: Array2<f64>, lons: Array2<f64>) -> Result<Self, CollocError> {
        if lats.dim() != lons.dim() {
            return Err(CollocError::Format(format!(
                "latitude grid {:?} and longitude grid {:?} differ in shape",
                lats.dim(),
                lons.dim()
            )));
        }

        Ok(GeoGrid { lats, lons })
    }

    /// `(rows, columns)`
    pub fn dim(&self) -> (usize, usize) {
        self.lats.dim()
    }

    pub fn latitudes(&self) -> &Array2<f64> {
        &self.lats
    }

    pub fn longitudes(&self) -> &Array2<f64> {
        &self.lons
    }

    /// The pixel in the given block closest to `(lat, lon)`.
    ///
    /// The search ranks pixels by squared difference in degrees, and only the winner gets its
    /// great-circle distance computed. NaN pixels are skipped. Ties go to the first pixel in
    /// row-major order.
    fn search(
        &self,
        lat: f64,
        lon: f64,
        rows: Range<usize>,
        cols: Range<usize>,
    ) -> Option<Collocation> {
        let lats = self.lats.slice(s![rows.clone(), cols.clone()]);
        let lons = self.lons.slice(s![rows.clone(), cols.clone()]);
        let (row0, col0) = (rows.start, cols.start);

        let mut best: Option<((usize, usize), f64)> = None;
        for (((i, j), &plat), &plon) in lats.indexed_iter().zip(lons.iter()) {
            let d = (plat - lat).powi(2) + (plon - lon).powi(2);
            if d.is_nan() {
                continue;
            }

            match best {
                Some((_, best_d)) if best_d <= d => {}
                _ => best = Some(((i, j), d)),
            }
        }

        best.map(|((i, j), _)| {
            let (row, col) = (row0 + i, col0 + j);
            let (plat, plon) = (self.lats[[row, col]], self.lons[[row, col]]);
            Collocation {
                row,
                col,
                distance_km: great_circle_km(lat, lon, plat, plon),
            }
        })
    }
}

/// A pixel matched to a query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collocation {
    pub row: usize,
    pub col: usize,
    pub distance_km: f64,
}

/// Nearest pixel lookups against a [`GeoGrid`].
///
/// Remembers the last successful match and, when asked to, first searches a small window around
/// it. Queries along a satellite track move slowly across the grid, so that window almost always
/// holds the answer.
#[derive(Clone, Debug)]
pub struct CollocationIndex {
    grid: GeoGrid,
    window: usize,
    last: Option<(usize, usize)>,
}

impl CollocationIndex {
    pub fn new(grid: GeoGrid) -> Self {
        CollocationIndex {
            grid,
            window: DEFAULT_WINDOW,
            last: None,
        }
    }

    /// Set the half width, in pixels, of the window searched around the last match.
    pub fn set_window(&mut self, half_width: i64) -> Result<(), CollocError> {
        if half_width < 0 {
            return Err(CollocError::Range(format!(
                "negative window half width: {}",
                half_width
            )));
        }

        self.window = half_width as usize;
        Ok(())
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn grid(&self) -> &GeoGrid {
        &self.grid
    }

    pub fn into_grid(self) -> GeoGrid {
        self.grid
    }

    /// The last successful match, if any.
    pub fn last_match(&self) -> Option<(usize, usize)> {
        self.last
    }

    /// Forget the last match.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// The closest pixel of the whole grid, however far away it is.
    ///
    /// `None` only if the grid is empty or entirely NaN.
    pub fn closest(&self, lat: f64, lon: f64) -> Option<Collocation> {
        let (rows, cols) = self.grid.dim();
        self.grid.search(lat, lon, 0..rows, 0..cols)
    }

    /// The pixel matching `(lat, lon)`, if one lies closer than `max_distance_km`.
    ///
    /// With `use_cache` the window around the previous match is tried before the full grid.
    /// Successful matches become the new window center; misses leave it unchanged.
    pub fn nearest(
        &mut self,
        lat: f64,
        lon: f64,
        max_distance_km: f64,
        use_cache: bool,
    ) -> Option<Collocation> {
        if use_cache {
            if let Some(found) = self.windowed(lat, lon) {
                if found.distance_km < max_distance_km {
                    self.last = Some((found.row, found.col));
                    return Some(found);
                }
            }
        }

        let found = self
            .closest(lat, lon)
            .filter(|c| c.distance_km < max_distance_km)?;
        self.last = Some((found.row, found.col));

        Some(found)
    }

    fn windowed(&self, lat: f64, lon: f64) -> Option<Collocation> {
        let (r, c) = self.last?;
        let (rows, cols) = self.grid.dim();

        let row_range = r.saturating_sub(self.window)..(r + self.window + 1).min(rows);
        let col_range = c.saturating_sub(self.window)..(c + self.window + 1).min(cols);

        self.grid.search(lat, lon, row_range, col_range)
    }
}

/// Great-circle distance between two points given in degrees, using the haversine formula.
pub fn great_circle_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 0.01 degree regular grid with its corner at (lat0, lon0).
    fn regular_grid(rows: usize, cols: usize, lat0: f64, lon0: f64) -> GeoGrid {
        let lats = Array2::from_shape_fn((rows, cols), |(i, _)| lat0 + 0.01 * i as f64);
        let lons = Array2::from_shape_fn((rows, cols), |(_, j)| lon0 + 0.01 * j as f64);
        GeoGrid::new(lats, lons).unwrap()
    }

    #[test]
    fn test_mismatched_shapes() {
        let lats = Array2::zeros((3, 4));
        let lons = Array2::zeros((4, 3));
        assert!(matches!(GeoGrid::new(lats, lons), Err(CollocError::Format(_))));
    }

    #[test]
    fn test_exact_match() {
        let mut index = CollocationIndex::new(regular_grid(50, 40, 10.0, 20.0));
        let (lat, lon) = (
            index.grid().latitudes()[[17, 23]],
            index.grid().longitudes()[[17, 23]],
        );

        let found = index.nearest(lat, lon, 1.0, false).unwrap();
        assert_eq!(found, Collocation { row: 17, col: 23, distance_km: 0.0 });
        assert_eq!(index.last_match(), Some((17, 23)));
    }

    #[test]
    fn test_no_match_beyond_threshold() {
        let mut index = CollocationIndex::new(regular_grid(10, 10, 10.0, 20.0));
        assert!(index.nearest(-40.0, 100.0, 5.0, true).is_none());
        assert_eq!(index.last_match(), None);

        // The closest pixel is still available, it is just far away.
        let closest = index.closest(-40.0, 100.0).unwrap();
        assert_eq!((closest.row, closest.col), (0, 9));
        assert!(closest.distance_km > 5.0);
    }

    #[test]
    fn test_miss_keeps_previous_match() {
        let mut index = CollocationIndex::new(regular_grid(30, 30, 0.0, 0.0));
        index.nearest(0.05, 0.05, 1.0, true).unwrap();
        assert!(index.nearest(45.0, 45.0, 1.0, true).is_none());
        assert_eq!(index.last_match(), Some((5, 5)));
    }

    #[test]
    fn test_cache_does_not_change_results_along_track() {
        let grid = regular_grid(200, 60, -5.0, 30.0);
        let mut cached = CollocationIndex::new(grid.clone());
        let mut uncached = CollocationIndex::new(grid);

        for k in 0..150 {
            let lat = -5.0 + 0.0123 * k as f64;
            let lon = 30.0 + 0.25 + 0.0007 * k as f64;

            let a = cached.nearest(lat, lon, 2.0, true).unwrap();
            let b = uncached.nearest(lat, lon, 2.0, false).unwrap();
            assert_eq!((a.row, a.col), (b.row, b.col));
            assert!((a.distance_km - b.distance_km).abs() < 1e-12);
        }
    }

    #[test]
    fn test_window_falls_back_to_full_grid() {
        let mut index = CollocationIndex::new(regular_grid(100, 100, 0.0, 0.0));
        index.set_window(2).unwrap();

        index.nearest(0.10, 0.10, 1.0, true).unwrap();
        assert_eq!(index.last_match(), Some((10, 10)));

        // Far outside the window around (10, 10).
        let found = index.nearest(0.80, 0.70, 1.0, true).unwrap();
        assert_eq!((found.row, found.col), (80, 70));
        assert_eq!(index.last_match(), Some((80, 70)));
    }

    #[test]
    fn test_window_at_grid_edge() {
        let mut index = CollocationIndex::new(regular_grid(20, 20, 0.0, 0.0));
        index.nearest(0.0, 0.0, 1.0, true).unwrap();
        let found = index.nearest(0.01, 0.0, 2.0, true).unwrap();
        assert_eq!((found.row, found.col), (1, 0));
    }

    #[test]
    fn test_negative_window_rejected() {
        let mut index = CollocationIndex::new(regular_grid(2, 2, 0.0, 0.0));
        assert!(matches!(index.set_window(-1), Err(CollocError::Range(_))));
        assert_eq!(index.window(), DEFAULT_WINDOW);
    }

    #[test]
    fn test_nan_pixels_skipped() {
        let mut lats = Array2::from_elem((2, 2), 0.0);
        let lons = Array2::from_shape_fn((2, 2), |(_, j)| j as f64);
        lats[[0, 0]] = f64::NAN;
        let index = CollocationIndex::new(GeoGrid::new(lats, lons).unwrap());

        let found = index.closest(0.0, 0.0).unwrap();
        assert_eq!((found.row, found.col), (1, 0));
    }

    #[test]
    fn test_great_circle_one_degree_of_latitude() {
        let d = great_circle_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.01);
        assert_eq!(great_circle_km(45.0, 7.0, 45.0, 7.0), 0.0);
    }
}
