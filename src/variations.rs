//! Variable-value resolution against an item-variation store.
//!
//! COLRv1 variable paints carry `(base, varIdx)` pairs. At draw time the
//! pair is resolved against the font's item-variation store at the current
//! normalized design-space location, with a fixed-point conversion factor
//! determined by the field's on-disk type.

use crate::error::PaintError;

/// Variation index meaning "no variation applies".
pub const NO_VARIATION_INDEX: u32 = 0xFFFF_FFFF;

/// A possibly-variable numeric value.
///
/// Non-variable fonts (and the non-`Var` paint formats) use
/// [`VarValue::constant`], which resolves to `base` regardless of location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarValue {
    pub base: f32,
    pub var_idx: u32,
}

impl VarValue {
    pub const fn constant(base: f32) -> VarValue {
        VarValue {
            base,
            var_idx: NO_VARIATION_INDEX,
        }
    }

    pub const fn variable(base: f32, var_idx: u32) -> VarValue {
        VarValue { base, var_idx }
    }
}

impl From<f32> for VarValue {
    fn from(base: f32) -> VarValue {
        VarValue::constant(base)
    }
}

/// On-disk representation of a variable field, which scales its deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaFormat {
    /// 2.14 fixed point: alphas, scale factors, angles, stop offsets.
    F2Dot14,
    /// 16.16 fixed point: transform matrix coefficients.
    Fixed,
    /// Plain design units: coordinates and radii.
    Integer,
}

impl DeltaFormat {
    fn factor(self) -> f32 {
        match self {
            DeltaFormat::F2Dot14 => 1.0 / (1 << 14) as f32,
            DeltaFormat::Fixed => 1.0 / (1 << 16) as f32,
            DeltaFormat::Integer => 1.0,
        }
    }
}

/// Per-axis region of applicability, a triangular tent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisTent {
    pub start: f32,
    pub peak: f32,
    pub end: f32,
}

impl AxisTent {
    pub fn new(start: f32, peak: f32, end: f32) -> AxisTent {
        AxisTent { start, peak, end }
    }
}

/// A variation region: one tent per axis, in fvar order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariationRegion {
    pub axes: Vec<AxisTent>,
}

impl VariationRegion {
    /// The scalar this region contributes at `coords`, in `[0, 1]`.
    fn scalar(&self, coords: &[f32]) -> f32 {
        let mut scalar = 1.0;
        for (axis, tent) in self.axes.iter().enumerate() {
            let coord = coords.get(axis).copied().unwrap_or(0.0);
            let AxisTent { start, peak, end } = *tent;
            // A zero peak or an inconsistent tent does not participate.
            if peak == 0.0 || start > peak || peak > end {
                continue;
            }
            if start < 0.0 && end > 0.0 {
                continue;
            }
            if coord == peak {
                continue;
            }
            if coord <= start || end <= coord {
                return 0.0;
            }
            if coord < peak {
                scalar *= (coord - start) / (peak - start);
            } else {
                scalar *= (end - coord) / (end - peak);
            }
        }
        scalar
    }
}

/// One delta subtable: rows of deltas over a subset of the store's regions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeltaSet {
    pub region_indices: Vec<u16>,
    /// `deltas[row][i]` pairs with `region_indices[i]`.
    pub deltas: Vec<Vec<f32>>,
}

/// A decoded item-variation store.
///
/// A variation index `varIdx` addresses subtable `varIdx >> 16`, row
/// `varIdx & 0xFFFF`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemVariationStore {
    pub regions: Vec<VariationRegion>,
    pub subtables: Vec<DeltaSet>,
}

/// Evaluates variable values at a normalized design-space location.
///
/// The instancer caches per-region scalars for the current location; setting
/// a new location invalidates the cache. Callers that push a temporary
/// location (the `Location` paint) must restore the previous one on every
/// exit path.
pub struct Instancer<'a> {
    store: Option<&'a ItemVariationStore>,
    coords: Vec<f32>,
    scalars: Vec<Option<f32>>,
}

impl<'a> Instancer<'a> {
    pub fn new(store: Option<&'a ItemVariationStore>, axis_count: usize) -> Instancer<'a> {
        let regions = store.map_or(0, |s| s.regions.len());
        Instancer {
            store,
            coords: vec![0.0; axis_count],
            scalars: vec![None; regions],
        }
    }

    /// The current normalized location, one coordinate per fvar axis.
    pub fn coords(&self) -> &[f32] {
        &self.coords
    }

    /// Replaces the normalized location and drops the scalar cache.
    ///
    /// Missing trailing coordinates are treated as 0; extras are ignored.
    pub fn set_coords(&mut self, coords: &[f32]) {
        let axis_count = self.coords.len();
        self.coords.clear();
        self.coords.extend(coords.iter().copied().take(axis_count));
        self.coords.resize(axis_count, 0.0);
        self.scalars.fill(None);
    }

    fn region_scalar(&mut self, store: &ItemVariationStore, region: usize) -> f32 {
        if let Some(Some(scalar)) = self.scalars.get(region) {
            return *scalar;
        }
        let scalar = store
            .regions
            .get(region)
            .map(|r| r.scalar(&self.coords))
            .unwrap_or(0.0);
        if let Some(slot) = self.scalars.get_mut(region) {
            *slot = Some(scalar);
        }
        scalar
    }

    /// The interpolated delta for `var_idx` at the current location.
    pub fn delta(&mut self, var_idx: u32) -> Result<f32, PaintError> {
        let Some(store) = self.store else {
            return Err(PaintError::MissingVariationStore(var_idx));
        };
        let outer = (var_idx >> 16) as usize;
        let inner = (var_idx & 0xFFFF) as usize;
        let subtable = store
            .subtables
            .get(outer)
            .ok_or(PaintError::BadVariationIndex(var_idx))?;
        let row = subtable
            .deltas
            .get(inner)
            .ok_or(PaintError::BadVariationIndex(var_idx))?;
        let mut delta = 0.0;
        for (i, region) in subtable.region_indices.iter().enumerate() {
            let value = row.get(i).copied().unwrap_or(0.0);
            if value != 0.0 {
                delta += value * self.region_scalar(store, *region as usize);
            }
        }
        Ok(delta)
    }

    /// Resolves a `(base, varIdx)` pair, scaling the delta by the field's
    /// on-disk format.
    pub fn resolve(&mut self, value: VarValue, format: DeltaFormat) -> Result<f32, PaintError> {
        if value.var_idx == NO_VARIATION_INDEX {
            return Ok(value.base);
        }
        Ok(value.base + self.delta(value.var_idx)? * format.factor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_matches;

    fn wght_store() -> ItemVariationStore {
        // One axis, one region peaking at wght = 1.0, one row of deltas.
        ItemVariationStore {
            regions: vec![VariationRegion {
                axes: vec![AxisTent::new(0.0, 1.0, 1.0)],
            }],
            subtables: vec![DeltaSet {
                region_indices: vec![0],
                deltas: vec![vec![-8192.0], vec![100.0]],
            }],
        }
    }

    #[test]
    fn constant_value_ignores_location() {
        let store = wght_store();
        let mut instancer = Instancer::new(Some(&store), 1);
        instancer.set_coords(&[1.0]);
        let resolved = instancer
            .resolve(VarValue::constant(0.75), DeltaFormat::F2Dot14)
            .unwrap();
        assert_eq!(resolved, 0.75);
    }

    #[test]
    fn constant_value_needs_no_store() {
        let mut instancer = Instancer::new(None, 0);
        let resolved = instancer
            .resolve(VarValue::constant(2.0), DeltaFormat::Fixed)
            .unwrap();
        assert_eq!(resolved, 2.0);
    }

    #[test]
    fn variable_value_without_store_errors() {
        let mut instancer = Instancer::new(None, 1);
        assert_matches!(
            instancer.resolve(VarValue::variable(1.0, 0), DeltaFormat::F2Dot14),
            Err(PaintError::MissingVariationStore(0))
        );
    }

    #[test]
    fn f2dot14_delta_scaling() {
        let store = wght_store();
        let mut instancer = Instancer::new(Some(&store), 1);
        instancer.set_coords(&[1.0]);
        // -8192 in raw F2Dot14 units is -0.5.
        let resolved = instancer
            .resolve(VarValue::variable(1.0, 0), DeltaFormat::F2Dot14)
            .unwrap();
        assert_eq!(resolved, 0.5);
    }

    #[test]
    fn scalar_interpolates_inside_tent() {
        let store = wght_store();
        let mut instancer = Instancer::new(Some(&store), 1);
        instancer.set_coords(&[0.5]);
        let resolved = instancer
            .resolve(VarValue::variable(0.0, 1), DeltaFormat::Integer)
            .unwrap();
        assert_eq!(resolved, 50.0);
    }

    #[test]
    fn scalar_is_zero_outside_tent() {
        let store = ItemVariationStore {
            regions: vec![VariationRegion {
                axes: vec![AxisTent::new(0.5, 1.0, 1.0)],
            }],
            ..wght_store()
        };
        let mut instancer = Instancer::new(Some(&store), 1);
        instancer.set_coords(&[0.25]);
        let resolved = instancer
            .resolve(VarValue::variable(3.0, 1), DeltaFormat::Integer)
            .unwrap();
        assert_eq!(resolved, 3.0);
    }

    #[test]
    fn bad_indices_error() {
        let store = wght_store();
        let mut instancer = Instancer::new(Some(&store), 1);
        assert_matches!(
            instancer.resolve(VarValue::variable(0.0, 0x0001_0000), DeltaFormat::Integer),
            Err(PaintError::BadVariationIndex(0x0001_0000))
        );
        assert_matches!(
            instancer.resolve(VarValue::variable(0.0, 0x0000_0002), DeltaFormat::Integer),
            Err(PaintError::BadVariationIndex(2))
        );
    }

    #[test]
    fn set_coords_pads_and_truncates() {
        let store = wght_store();
        let mut instancer = Instancer::new(Some(&store), 1);
        instancer.set_coords(&[]);
        assert_eq!(instancer.coords(), &[0.0]);
        instancer.set_coords(&[1.0, 0.5]);
        assert_eq!(instancer.coords(), &[1.0]);
    }
}
