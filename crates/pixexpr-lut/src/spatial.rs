//! Coordinate-driven planes.
//!
//! A spatial LUT ignores sample values: `x` and `y` are the column and row
//! of each sample, optionally normalized by [`SpatialMode`]. Since the result
//! only depends on the plane size it is computed once and copied per frame.

use pixexpr_core::{EvaluationContext, SymbolEntry};

use crate::config::SpatialMode;
use crate::error::LutError;
use crate::plane::{Plane, Sample, check_depth};

/// Map `(column, row)` to the `x`, `y` inputs for a plane of the given size.
pub fn coordinates(
    mode: SpatialMode,
    width: usize,
    height: usize,
) -> impl Fn(usize, usize) -> (f64, f64) + Sync {
    let dx = mode.divisor(width);
    let dy = mode.divisor(height);
    move |col, row| {
        let x = col as f64;
        let y = row as f64;
        (dx.map_or(x, |d| x / d), dy.map_or(y, |d| y / d))
    }
}

/// Precomputed coordinate plane.
#[derive(Debug, Clone)]
pub struct SpatialLut<T> {
    mode: SpatialMode,
    plane: Plane<T>,
}

impl<T: Sample> SpatialLut<T> {
    pub fn build(
        tokens: &[SymbolEntry],
        width: usize,
        height: usize,
        bits: u32,
        mode: SpatialMode,
    ) -> Result<Self, LutError> {
        check_depth::<T>(bits)?;
        let mut ctx = EvaluationContext::compile(tokens);
        let coords = coordinates(mode, width, height);
        let plane = Plane::from_fn(width, height, |col, row| {
            let (x, y) = coords(col, row);
            T::evaluate(&mut ctx, bits, [x, y, 0.0, 0.0])
        });

        tracing::debug!("built {width}x{height} spatial lut ({})", mode.label());
        Ok(Self { mode, plane })
    }

    pub fn mode(&self) -> SpatialMode {
        self.mode
    }

    pub fn plane(&self) -> &Plane<T> {
        &self.plane
    }

    /// Overwrite `dst` with the precomputed plane.
    pub fn apply(&self, dst: &mut Plane<T>) -> Result<(), LutError> {
        self.plane.check_same_size(dst)?;
        dst.data_mut().copy_from_slice(self.plane.data());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixexpr_core::{Parser, VarKind};

    fn tokens(source: &str) -> Vec<SymbolEntry> {
        Parser::for_inputs(&[VarKind::X, VarKind::Y])
            .parse(source)
            .unwrap_or_else(|e| panic!("`{source}` should parse: {e}"))
    }

    #[test]
    fn test_absolute_coordinates() {
        let lut = SpatialLut::<u8>::build(&tokens("x y 16 * +"), 4, 3, 8, SpatialMode::Absolute)
            .unwrap();
        assert_eq!(lut.plane().row(0), &[0, 1, 2, 3]);
        assert_eq!(lut.plane().row(2), &[32, 33, 34, 35]);
    }

    #[test]
    fn test_relative_inclusive_reaches_both_borders() {
        let lut =
            SpatialLut::<u8>::build(&tokens("x 255 *"), 5, 1, 8, SpatialMode::RelativeInclusive)
                .unwrap();
        assert_eq!(lut.plane().row(0), &[0, 64, 128, 191, 255]);
    }

    #[test]
    fn test_relative_exclusive_stays_below_one() {
        let lut =
            SpatialLut::<u8>::build(&tokens("x 255 *"), 4, 1, 8, SpatialMode::RelativeExclusive)
                .unwrap();
        assert_eq!(lut.plane().row(0), &[0, 64, 128, 191]);
    }

    #[test]
    fn test_single_column_falls_back_to_width() {
        let coords = coordinates(SpatialMode::RelativeInclusive, 1, 2);
        assert_eq!(coords(0, 1), (0.0, 1.0));
    }

    #[test]
    fn test_float_gradient() {
        let lut = SpatialLut::<f32>::build(&tokens("x"), 3, 1, 32, SpatialMode::RelativeInclusive)
            .unwrap();
        assert_eq!(lut.plane().data(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_apply_checks_size() {
        let lut = SpatialLut::<u16>::build(&tokens("y"), 2, 2, 10, SpatialMode::Absolute).unwrap();
        let mut dst = Plane::<u16>::new(2, 2);
        lut.apply(&mut dst).unwrap();
        assert_eq!(dst.data(), &[0, 0, 1, 1]);
        let mut wrong = Plane::<u16>::new(3, 2);
        assert!(lut.apply(&mut wrong).is_err());
    }
}
