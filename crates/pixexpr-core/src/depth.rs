//! Standard video range points per bit depth.
//!
//! Integer depths 8..=16 derive from the 8-bit values shifted left by
//! `depth - 8`; depth 32 uses fixed normalized constants.
//!
//! | name         | 8 bit | 10 bit | 32 bit  |
//! |--------------|-------|--------|---------|
//! | `range_half` | 128   | 512    | 0.5     |
//! | `range_max`  | 255   | 1023   | 1.0     |
//! | `range_size` | 256   | 1024   | 1.0     |
//! | `ymin`       | 16    | 64     | 16/255  |
//! | `ymax`       | 235   | 940    | 235/255 |
//! | `cmin`       | 16    | 64     | 16/255  |
//! | `cmax`       | 240   | 960    | 240/255 |

use crate::scale::FLOAT_DEPTH;

pub const MIN_INT_DEPTH: u32 = 8;
pub const MAX_INT_DEPTH: u32 = 16;

const INT_DEPTHS: usize = (MAX_INT_DEPTH - MIN_INT_DEPTH + 1) as usize;

/// Range points for a single bit depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangePoints {
    pub range_half: f64,
    pub range_max: f64,
    pub range_size: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub cmin: f64,
    pub cmax: f64,
}

impl RangePoints {
    /// Points for an integer depth in `8..=16`.
    pub fn integer(depth: u32) -> Self {
        let shift = depth - MIN_INT_DEPTH;
        Self {
            range_half: f64::from(128u32 << shift),
            range_max: f64::from((1u32 << depth) - 1),
            range_size: f64::from(1u32 << depth),
            ymin: f64::from(16u32 << shift),
            ymax: f64::from(235u32 << shift),
            cmin: f64::from(16u32 << shift),
            cmax: f64::from(240u32 << shift),
        }
    }

    /// Normalized float-domain points.
    pub fn float() -> Self {
        Self {
            range_half: 0.5,
            range_max: 1.0,
            range_size: 1.0,
            ymin: 16.0 / 255.0,
            ymax: 235.0 / 255.0,
            cmin: 16.0 / 255.0,
            cmax: 240.0 / 255.0,
        }
    }
}

/// Precomputed [`RangePoints`] for every supported depth.
#[derive(Debug, Clone)]
pub struct RangeTable {
    integer: [RangePoints; INT_DEPTHS],
    float: RangePoints,
}

impl RangeTable {
    pub fn new() -> Self {
        Self {
            integer: std::array::from_fn(|i| RangePoints::integer(MIN_INT_DEPTH + i as u32)),
            float: RangePoints::float(),
        }
    }

    /// Points for `depth`, which must be 8..=16 or 32.
    ///
    /// # Panics
    /// Panics on any other depth.
    #[inline]
    pub fn points(&self, depth: u32) -> &RangePoints {
        if depth == FLOAT_DEPTH {
            &self.float
        } else {
            &self.integer[depth.wrapping_sub(MIN_INT_DEPTH) as usize]
        }
    }
}

impl Default for RangeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_bit_points() {
        let table = RangeTable::new();
        let p = table.points(10);
        assert_eq!(p.range_max, 1023.0);
        assert_eq!(p.range_half, 512.0);
        assert_eq!(p.range_size, 1024.0);
        assert_eq!(p.ymin, 64.0);
        assert_eq!(p.ymax, 940.0);
        assert_eq!(p.cmin, 64.0);
        assert_eq!(p.cmax, 960.0);
    }

    #[test]
    fn test_sixteen_and_eight_bit_points() {
        let table = RangeTable::new();
        assert_eq!(table.points(8).cmax, 240.0);
        assert_eq!(table.points(16).range_max, 65535.0);
        assert_eq!(table.points(16).range_half, 32768.0);
    }

    #[test]
    fn test_float_points() {
        let table = RangeTable::new();
        let p = table.points(32);
        assert_eq!(p.range_half, 0.5);
        assert_eq!(p.range_max, 1.0);
        assert!((p.cmax - 240.0 / 255.0).abs() < 1e-12);
        assert!((p.ymax - 235.0 / 255.0).abs() < 1e-12);
    }
}
