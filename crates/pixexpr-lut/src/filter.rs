//! Per-plane LUT filter.
//!
//! Turns a [`LutConfig`] into one program per plane and applies it:
//!
//! ```text
//!   LutConfig ──parse──> tokens ──┬─ table      SingleLut / MultiLut / SpatialLut
//!                                 └─ realtime   ContextPool
//!
//!   process(plane, dst, sources)
//!     Process  -> run the plane's program (x = dst in place, y.. = sources)
//!     Copy(n)  -> copy clip n (in place: dst is clip 0, sources are 1..)
//!     Fill(v)  -> fill with v scaled from `paramscale`
//!     Ignore   -> leave dst untouched
//! ```
//!
//! Planes that fall back to the shared `expr` share one compiled program.

use std::sync::Arc;

use pixexpr_core::{Parser, SymbolEntry, VarKind, scale_param};

use crate::config::{LutConfig, PLANE_COUNT, PlaneOperator, RealtimeConfig, SpatialMode};
use crate::error::LutError;
use crate::plane::{Plane, Sample, check_depth};
use crate::realtime::{self, ContextPool};
use crate::spatial::{SpatialLut, coordinates};
use crate::table::{MAX_TABLE_INPUTS, MultiLut, SingleLut};

/// Which family of lookup the filter performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutKind {
    /// One input, `x`.
    Single,
    /// Two to four inputs, `x` through `a`.
    Multi(usize),
    /// Coordinates instead of samples; `sizes` are the plane dimensions.
    Spatial {
        sizes: [(usize, usize); PLANE_COUNT],
    },
}

impl LutKind {
    /// Input variables the expressions may use.
    pub fn variables(&self) -> &'static [VarKind] {
        match self {
            Self::Single => &[VarKind::X],
            Self::Multi(2) | Self::Spatial { .. } => &[VarKind::X, VarKind::Y],
            Self::Multi(3) => &[VarKind::X, VarKind::Y, VarKind::Z],
            Self::Multi(_) => &VarKind::INPUTS,
        }
    }

    /// Source planes `process` needs besides the destination.
    pub fn sources_needed(&self) -> usize {
        match self {
            Self::Multi(n) => n - 1,
            Self::Single | Self::Spatial { .. } => 0,
        }
    }

    /// Clips the filter reads. `Copy` operators are lowered to this count.
    pub fn clips(&self) -> usize {
        match self {
            Self::Multi(n) => *n,
            Self::Single | Self::Spatial { .. } => 1,
        }
    }

    /// Whether `dst` already holds the first clip when processing.
    pub fn is_in_place(&self) -> bool {
        !matches!(self, Self::Spatial { .. })
    }

    fn realtime_by_default(&self) -> bool {
        matches!(self, Self::Multi(4))
    }
}

#[derive(Debug)]
enum PlaneProgram<T> {
    None,
    Single(Arc<SingleLut<T>>),
    Multi(Arc<MultiLut<T>>),
    Spatial(Arc<SpatialLut<T>>),
    Realtime(Arc<ContextPool>),
}

impl<T> Clone for PlaneProgram<T> {
    fn clone(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Single(lut) => Self::Single(Arc::clone(lut)),
            Self::Multi(lut) => Self::Multi(Arc::clone(lut)),
            Self::Spatial(lut) => Self::Spatial(Arc::clone(lut)),
            Self::Realtime(pool) => Self::Realtime(Arc::clone(pool)),
        }
    }
}

/// A configured LUT filter for samples of type `T`.
#[derive(Debug)]
pub struct LutFilter<T> {
    kind: LutKind,
    bits: u32,
    realtime: bool,
    spatial_mode: SpatialMode,
    operators: [PlaneOperator; PLANE_COUNT],
    fills: [T; PLANE_COUNT],
    programs: [PlaneProgram<T>; PLANE_COUNT],
    workers: RealtimeConfig,
}

impl<T: Sample> LutFilter<T> {
    /// Parse and compile every processed plane of `config`.
    pub fn new(config: &LutConfig, kind: LutKind, bits: u32) -> Result<Self, LutError> {
        check_depth::<T>(bits)?;
        if let LutKind::Multi(n) = kind {
            if !(2..=MAX_TABLE_INPUTS).contains(&n) {
                return Err(LutError::InputCount(n));
            }
        }

        let realtime = match kind {
            LutKind::Single => config.realtime.unwrap_or(false) || T::TABLE_LEN == 0,
            LutKind::Multi(_) => {
                config.realtime.unwrap_or(kind.realtime_by_default()) || bits != 8
            }
            LutKind::Spatial { .. } => config.realtime.unwrap_or(false),
        };
        if config.realtime == Some(false) && realtime {
            tracing::warn!("{bits}-bit {kind:?} lut cannot be tabled; evaluating in realtime");
        }

        let mut operators = config.operators().map(|op| op.limit_clips(kind.clips()));
        let parser = Parser::for_inputs(kind.variables());
        let mut programs: [PlaneProgram<T>; PLANE_COUNT] = Default::default();
        let mut shared: Option<PlaneProgram<T>> = None;
        let share = !matches!(kind, LutKind::Spatial { .. });

        for plane in 0..PLANE_COUNT {
            if operators[plane] != PlaneOperator::Process {
                continue;
            }
            let Some(expr) = config.plane_expr(plane) else {
                tracing::warn!("plane {plane} has no expression; leaving it untouched");
                operators[plane] = PlaneOperator::Ignore;
                continue;
            };

            let uses_shared = share && config.uses_shared_expr(plane);
            if uses_shared {
                if let Some(program) = &shared {
                    programs[plane] = program.clone();
                    continue;
                }
            }

            let tokens = parser
                .parse(expr)
                .map_err(|source| {
                    tracing::warn!("plane {plane}: rejected expression `{expr}`: {source}");
                    LutError::Parse { plane, source }
                })?;
            tracing::info!(
                "plane {plane}: {} lut for `{expr}` at {bits} bits",
                if realtime { "realtime" } else { "table" }
            );
            let program = build_program::<T>(tokens, kind, plane, bits, realtime, config)?;
            if uses_shared {
                shared = Some(program.clone());
            }
            programs[plane] = program;
        }

        let fills = operators.map(|op| match op {
            PlaneOperator::Fill(value) => {
                T::from_param(scale_param(value, config.paramscale, bits, config.rgb, false))
            }
            _ => T::zeroed(),
        });

        Ok(Self {
            kind,
            bits,
            realtime,
            spatial_mode: config.spatial_mode(),
            operators,
            fills,
            programs,
            workers: RealtimeConfig::default(),
        })
    }

    /// Parse `json` as a [`LutConfig`] and build the filter.
    pub fn from_json(json: &str, kind: LutKind, bits: u32) -> Result<Self, LutError> {
        Self::new(&LutConfig::from_json(json)?, kind, bits)
    }

    pub fn with_workers(mut self, workers: RealtimeConfig) -> Self {
        self.workers = workers;
        self
    }

    pub fn kind(&self) -> LutKind {
        self.kind
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn is_realtime(&self) -> bool {
        self.realtime
    }

    /// Effective operator for `plane`, after overrides and fallbacks.
    pub fn operator(&self, plane: usize) -> Option<PlaneOperator> {
        self.operators.get(plane).copied()
    }

    /// Whether two planes run the same compiled program.
    pub fn shares_program(&self, a: usize, b: usize) -> bool {
        match (self.programs.get(a), self.programs.get(b)) {
            (Some(PlaneProgram::Single(x)), Some(PlaneProgram::Single(y))) => Arc::ptr_eq(x, y),
            (Some(PlaneProgram::Multi(x)), Some(PlaneProgram::Multi(y))) => Arc::ptr_eq(x, y),
            (Some(PlaneProgram::Realtime(x)), Some(PlaneProgram::Realtime(y))) => {
                Arc::ptr_eq(x, y)
            }
            _ => false,
        }
    }

    /// Apply the filter to one plane.
    ///
    /// For in-place kinds `dst` holds the first clip and receives the
    /// result, and `sources` are the remaining clips (`y`, `z`, `a`). A
    /// spatial filter ignores `dst`'s contents; its `sources` start at the
    /// first clip and are only read by `Copy`.
    pub fn process(
        &self,
        plane: usize,
        dst: &mut Plane<T>,
        sources: &[&Plane<T>],
    ) -> Result<(), LutError> {
        let operator = self.operator(plane).ok_or(LutError::PlaneIndex(plane))?;
        match operator {
            PlaneOperator::Ignore => Ok(()),
            PlaneOperator::Fill(_) => {
                dst.fill(self.fills[plane]);
                Ok(())
            }
            PlaneOperator::Copy(clip) => {
                let index = match (self.kind.is_in_place(), clip) {
                    (true, 0) => return Ok(()),
                    (true, n) => n - 1,
                    (false, n) => n,
                };
                let source = sources.get(index).ok_or(LutError::MissingSource {
                    needed: index + 1,
                    found: sources.len(),
                })?;
                dst.check_same_size(source)?;
                dst.data_mut().copy_from_slice(source.data());
                Ok(())
            }
            PlaneOperator::Process => self.run(plane, dst, sources),
        }
    }

    fn run(&self, plane: usize, dst: &mut Plane<T>, sources: &[&Plane<T>]) -> Result<(), LutError> {
        let needed = self.kind.sources_needed();
        if sources.len() < needed {
            return Err(LutError::MissingSource {
                needed,
                found: sources.len(),
            });
        }
        let sources = &sources[..needed];

        match &self.programs[plane] {
            PlaneProgram::None => Ok(()),
            PlaneProgram::Single(lut) => {
                lut.apply(dst);
                Ok(())
            }
            PlaneProgram::Multi(lut) => lut.apply(dst, sources),
            PlaneProgram::Spatial(lut) => lut.apply(dst),
            PlaneProgram::Realtime(pool) => match self.kind {
                LutKind::Spatial { .. } => {
                    let coords = coordinates(self.spatial_mode, dst.width(), dst.height());
                    realtime::process_spatial(pool, self.bits, dst, &self.workers, coords)
                }
                LutKind::Single | LutKind::Multi(_) => {
                    realtime::process(pool, self.bits, dst, sources, &self.workers)
                }
            },
        }
    }
}

impl<T> Default for PlaneProgram<T> {
    fn default() -> Self {
        Self::None
    }
}

fn build_program<T: Sample>(
    tokens: Vec<SymbolEntry>,
    kind: LutKind,
    plane: usize,
    bits: u32,
    realtime: bool,
    config: &LutConfig,
) -> Result<PlaneProgram<T>, LutError> {
    if realtime {
        return Ok(PlaneProgram::Realtime(Arc::new(ContextPool::new(tokens))));
    }
    Ok(match kind {
        LutKind::Single => PlaneProgram::Single(Arc::new(SingleLut::build(&tokens, bits)?)),
        LutKind::Multi(n) => PlaneProgram::Multi(Arc::new(MultiLut::build(&tokens, n, bits)?)),
        LutKind::Spatial { sizes } => {
            let (width, height) = sizes[plane];
            PlaneProgram::Spatial(Arc::new(SpatialLut::build(
                &tokens,
                width,
                height,
                bits,
                config.spatial_mode(),
            )?))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_threaded<T: Sample>(filter: LutFilter<T>) -> LutFilter<T> {
        filter.with_workers(RealtimeConfig::single_threaded())
    }

    #[test]
    fn test_single_byte_filter_tv_to_pc() {
        let filter = LutFilter::<u8>::new(
            &LutConfig::with_expr("x ymin - range_max * ymax ymin - /"),
            LutKind::Single,
            8,
        )
        .unwrap();
        assert!(!filter.is_realtime());

        let mut plane = Plane::from_vec(3, 1, vec![16u8, 235, 126]).unwrap();
        filter.process(0, &mut plane, &[]).unwrap();
        assert_eq!(plane.data(), &[0, 255, 128]);
    }

    #[test]
    fn test_shared_expression_is_compiled_once() {
        let config = LutConfig::from_json(
            r#"{ "expr": "x 1 +", "vExpr": "x 2 +", "U": 3, "V": 3, "A": 3 }"#,
        )
        .unwrap();
        let filter = LutFilter::<u8>::new(&config, LutKind::Single, 8).unwrap();
        assert!(filter.shares_program(0, 1));
        assert!(filter.shares_program(0, 3));
        assert!(!filter.shares_program(0, 2));

        let mut plane = Plane::from_vec(1, 1, vec![10u8]).unwrap();
        filter.process(2, &mut plane, &[]).unwrap();
        assert_eq!(plane.data(), &[12]);
    }

    #[test]
    fn test_float_single_filter_is_realtime() {
        let config = LutConfig::with_expr("x 2 /");
        let filter = single_threaded(LutFilter::<f32>::new(&config, LutKind::Single, 32).unwrap());
        assert!(filter.is_realtime());
        let mut plane = Plane::from_vec(2, 1, vec![1.0f32, 0.5]).unwrap();
        filter.process(0, &mut plane, &[]).unwrap();
        assert_eq!(plane.data(), &[0.5, 0.25]);
    }

    #[test]
    fn test_four_input_defaults_to_realtime() {
        let config = LutConfig::with_expr("x y + z + a +");
        let filter = single_threaded(LutFilter::<u8>::new(&config, LutKind::Multi(4), 8).unwrap());
        assert!(filter.is_realtime());

        let mut x = Plane::from_vec(1, 1, vec![1u8]).unwrap();
        let y = Plane::from_vec(1, 1, vec![2u8]).unwrap();
        let z = Plane::from_vec(1, 1, vec![3u8]).unwrap();
        let a = Plane::from_vec(1, 1, vec![4u8]).unwrap();
        filter.process(0, &mut x, &[&y, &z, &a]).unwrap();
        assert_eq!(x.data(), &[10]);
    }

    #[test]
    fn test_deep_multi_input_forces_realtime() {
        let config = LutConfig::from_json(r#"{ "expr": "x y -", "realtime": false }"#).unwrap();
        let filter = single_threaded(LutFilter::<u16>::new(&config, LutKind::Multi(2), 10).unwrap());
        assert!(filter.is_realtime());

        let mut x = Plane::from_vec(1, 1, vec![900u16]).unwrap();
        let y = Plane::from_vec(1, 1, vec![100u16]).unwrap();
        filter.process(0, &mut x, &[&y]).unwrap();
        assert_eq!(x.data(), &[800]);
        assert!(matches!(
            filter.process(0, &mut x, &[]),
            Err(LutError::MissingSource { needed: 1, found: 0 })
        ));
    }

    #[test]
    fn test_plane_operators() {
        let config = LutConfig::from_json(
            r#"{ "expr": "x", "U": "copy", "V": -128, "A": "none", "paramscale": "i8" }"#,
        )
        .unwrap();
        let filter = LutFilter::<u16>::new(&config, LutKind::Single, 10).unwrap();

        let mut u = Plane::from_vec(2, 1, vec![7u16, 9]).unwrap();
        filter.process(1, &mut u, &[]).unwrap();
        assert_eq!(u.data(), &[7, 9], "copying the first clip in place keeps dst");

        let mut v = Plane::<u16>::new(2, 1);
        filter.process(2, &mut v, &[]).unwrap();
        assert_eq!(v.data(), &[512, 512], "fill value scales from 8 to 10 bits");

        let mut a = Plane::from_vec(2, 1, vec![3u16, 4]).unwrap();
        filter.process(3, &mut a, &[]).unwrap();
        assert_eq!(a.data(), &[3, 4]);

        assert!(matches!(
            filter.process(4, &mut a, &[]),
            Err(LutError::PlaneIndex(4))
        ));
    }

    #[test]
    fn test_missing_expression_leaves_plane_untouched() {
        let config = LutConfig::from_json(r#"{ "yExpr": "x 1 +", "U": 3 }"#).unwrap();
        let filter = LutFilter::<u8>::new(&config, LutKind::Single, 8).unwrap();
        assert_eq!(filter.operator(1), Some(PlaneOperator::Ignore));

        let mut plane = Plane::from_vec(2, 1, vec![77u8, 99]).unwrap();
        filter.process(1, &mut plane, &[]).unwrap();
        assert_eq!(plane.data(), &[77, 99]);
    }

    #[test]
    fn test_copy_from_later_clips() {
        let config =
            LutConfig::from_json(r#"{ "expr": "x y max", "U": "copy second", "V": 6, "A": 2 }"#)
                .unwrap();
        let filter = LutFilter::<u8>::new(&config, LutKind::Multi(2), 8).unwrap();
        assert_eq!(
            filter.operator(2),
            Some(PlaneOperator::Copy(1)),
            "fourth clip lowers to the last of two"
        );

        let second = Plane::from_vec(2, 1, vec![5u8, 6]).unwrap();
        let mut u = Plane::from_vec(2, 1, vec![1u8, 2]).unwrap();
        filter.process(1, &mut u, &[&second]).unwrap();
        assert_eq!(u.data(), &[5, 6]);

        let mut v = Plane::from_vec(2, 1, vec![1u8, 2]).unwrap();
        filter.process(2, &mut v, &[&second]).unwrap();
        assert_eq!(v.data(), &[5, 6]);

        let mut a = Plane::from_vec(2, 1, vec![1u8, 2]).unwrap();
        filter.process(3, &mut a, &[&second]).unwrap();
        assert_eq!(a.data(), &[1, 2], "first clip is dst itself");

        assert!(matches!(
            filter.process(1, &mut u, &[]),
            Err(LutError::MissingSource { needed: 1, found: 0 })
        ));
    }

    #[test]
    fn test_spatial_copy_reads_first_clip() {
        let config = LutConfig::from_json(r#"{ "expr": "x", "U": "copy" }"#).unwrap();
        let kind = LutKind::Spatial {
            sizes: [(2, 1); PLANE_COUNT],
        };
        let filter = LutFilter::<u8>::new(&config, kind, 8).unwrap();
        let clip = Plane::from_vec(2, 1, vec![40u8, 50]).unwrap();
        let mut u = Plane::<u8>::new(2, 1);
        filter.process(1, &mut u, &[&clip]).unwrap();
        assert_eq!(u.data(), &[40, 50]);
    }

    #[test]
    fn test_rgb_fill_stretches_to_clip_depth() {
        let yuv = LutConfig::from_json(r#"{ "expr": "x", "U": -128 }"#).unwrap();
        let rgb = LutConfig {
            rgb: true,
            ..yuv.clone()
        };
        let mut plane = Plane::<u16>::new(1, 1);

        LutFilter::<u16>::new(&yuv, LutKind::Single, 10)
            .unwrap()
            .process(1, &mut plane, &[])
            .unwrap();
        assert_eq!(plane.data(), &[512], "shifted by two bits");

        LutFilter::<u16>::new(&rgb, LutKind::Single, 10)
            .unwrap()
            .process(1, &mut plane, &[])
            .unwrap();
        assert_eq!(plane.data(), &[513], "128 / 255 * 1023, truncated");
    }

    #[test]
    fn test_parse_errors_name_the_plane() {
        let config = LutConfig::from_json(r#"{ "expr": "x", "uExpr": "x y +", "U": 3 }"#).unwrap();
        let err = LutFilter::<u8>::new(&config, LutKind::Single, 8).unwrap_err();
        assert!(matches!(err, LutError::Parse { plane: 1, .. }));
    }

    #[test]
    fn test_invalid_kinds_and_depths() {
        let config = LutConfig::with_expr("x");
        assert!(matches!(
            LutFilter::<u8>::new(&config, LutKind::Multi(5), 8),
            Err(LutError::InputCount(5))
        ));
        assert!(matches!(
            LutFilter::<u8>::new(&config, LutKind::Single, 16),
            Err(LutError::UnsupportedBitDepth { .. })
        ));
    }

    #[test]
    fn test_spatial_filter_per_plane_sizes() {
        let config = LutConfig::from_json(r#"{ "expr": "x", "U": 3, "mode": "absolute" }"#).unwrap();
        let kind = LutKind::Spatial {
            sizes: [(4, 2), (2, 1), (2, 1), (4, 2)],
        };
        let filter = LutFilter::<u8>::new(&config, kind, 8).unwrap();

        let mut luma = Plane::<u8>::new(4, 2);
        filter.process(0, &mut luma, &[]).unwrap();
        assert_eq!(luma.row(1), &[0, 1, 2, 3]);

        let mut chroma = Plane::<u8>::new(2, 1);
        filter.process(1, &mut chroma, &[]).unwrap();
        assert_eq!(chroma.data(), &[0, 1]);
        assert!(filter.process(1, &mut luma, &[]).is_err());
    }

    #[test]
    fn test_realtime_spatial_matches_table() {
        let config = LutConfig::from_json(r#"{ "expr": "x y + 128 *", "realtime": true }"#).unwrap();
        let kind = LutKind::Spatial {
            sizes: [(5, 3); PLANE_COUNT],
        };
        let realtime = single_threaded(LutFilter::<u8>::new(&config, kind, 8).unwrap());
        assert!(realtime.is_realtime());
        let table = LutFilter::<u8>::new(
            &LutConfig {
                realtime: Some(false),
                ..config
            },
            kind,
            8,
        )
        .unwrap();

        let mut a = Plane::<u8>::new(5, 3);
        let mut b = Plane::<u8>::new(5, 3);
        realtime.process(0, &mut a, &[]).unwrap();
        table.process(0, &mut b, &[]).unwrap();
        assert_eq!(a, b);
    }
}
