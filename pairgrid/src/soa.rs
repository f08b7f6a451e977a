//! Columnar (structure-of-arrays) particle storage
//!
//! Every cell carries a side-car `SoaBuffer`; Verlet containers additionally
//! keep one global buffer into which all cells are concatenated. Functors
//! declare which scalar columns they gather and scatter through
//! [`crate::functor::Functor::needed_attributes`] and
//! [`crate::functor::Functor::computed_attributes`].

use strum_macros::EnumIter;

use crate::particle::{Ownership, Particle};
use crate::utils::AlignedF64Vec;

/// Scalar particle attributes with a dedicated SoA column
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Attribute {
    PosX,
    PosY,
    PosZ,
    ForceX,
    ForceY,
    ForceZ,
}

/// Read one scalar attribute from a particle
#[inline]
pub fn attribute_of<P: Particle>(p: &P, attr: Attribute) -> f64 {
    match attr {
        Attribute::PosX => p.r()[0],
        Attribute::PosY => p.r()[1],
        Attribute::PosZ => p.r()[2],
        Attribute::ForceX => p.f()[0],
        Attribute::ForceY => p.f()[1],
        Attribute::ForceZ => p.f()[2],
    }
}

/// Write one scalar attribute back into a particle
#[inline]
pub fn set_attribute<P: Particle>(p: &mut P, attr: Attribute, value: f64) {
    let mut r = p.r();
    let mut f = p.f();
    match attr {
        Attribute::PosX => {
            r[0] = value;
            p.set_r(r);
        }
        Attribute::PosY => {
            r[1] = value;
            p.set_r(r);
        }
        Attribute::PosZ => {
            r[2] = value;
            p.set_r(r);
        }
        Attribute::ForceX => {
            f[0] = value;
            p.set_f(f);
        }
        Attribute::ForceY => {
            f[1] = value;
            p.set_f(f);
        }
        Attribute::ForceZ => {
            f[2] = value;
            p.set_f(f);
        }
    }
}

/// One aligned column per scalar attribute, plus id and ownership columns
/// that are always carried along.
#[derive(Default)]
pub struct SoaBuffer {
    pos_x: AlignedF64Vec,
    pos_y: AlignedF64Vec,
    pos_z: AlignedF64Vec,
    force_x: AlignedF64Vec,
    force_y: AlignedF64Vec,
    force_z: AlignedF64Vec,
    id: Vec<u64>,
    ownership: Vec<Ownership>,
}

/// Borrowed column set for kernels: positions shared, forces exclusive.
pub struct SoaViewMut<'a> {
    pub pos: [&'a [f64]; 3],
    pub force: [&'a mut [f64]; 3],
    pub id: &'a [u64],
    pub ownership: &'a [Ownership],
}

impl SoaBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Resize all columns, keeping existing rows
    pub fn resize(&mut self, len: usize) {
        self.pos_x.resize(len);
        self.pos_y.resize(len);
        self.pos_z.resize(len);
        self.force_x.resize(len);
        self.force_y.resize(len);
        self.force_z.resize(len);
        self.id.resize(len, 0);
        self.ownership.resize(len, Ownership::Dummy);
    }

    pub fn clear(&mut self) {
        self.resize(0);
    }

    pub fn scalar(&self, attr: Attribute, row: usize) -> f64 {
        self.column(attr)[row]
    }

    pub fn set_scalar(&mut self, attr: Attribute, row: usize, value: f64) {
        self.column_mut(attr)[row] = value;
    }

    pub fn column(&self, attr: Attribute) -> &[f64] {
        match attr {
            Attribute::PosX => self.pos_x.as_slice(),
            Attribute::PosY => self.pos_y.as_slice(),
            Attribute::PosZ => self.pos_z.as_slice(),
            Attribute::ForceX => self.force_x.as_slice(),
            Attribute::ForceY => self.force_y.as_slice(),
            Attribute::ForceZ => self.force_z.as_slice(),
        }
    }

    pub fn column_mut(&mut self, attr: Attribute) -> &mut [f64] {
        match attr {
            Attribute::PosX => self.pos_x.as_mut_slice(),
            Attribute::PosY => self.pos_y.as_mut_slice(),
            Attribute::PosZ => self.pos_z.as_mut_slice(),
            Attribute::ForceX => self.force_x.as_mut_slice(),
            Attribute::ForceY => self.force_y.as_mut_slice(),
            Attribute::ForceZ => self.force_z.as_mut_slice(),
        }
    }

    pub fn set_id(&mut self, row: usize, id: u64) {
        self.id[row] = id;
    }

    pub fn set_ownership(&mut self, row: usize, ownership: Ownership) {
        self.ownership[row] = ownership;
    }

    pub fn ids(&self) -> &[u64] {
        &self.id
    }

    pub fn ownerships(&self) -> &[Ownership] {
        &self.ownership
    }

    pub fn position(&self, row: usize) -> [f64; 3] {
        [self.pos_x[row], self.pos_y[row], self.pos_z[row]]
    }

    /// Split into shared position and exclusive force columns
    pub fn view_mut(&mut self) -> SoaViewMut<'_> {
        SoaViewMut {
            pos: [
                self.pos_x.as_slice(),
                self.pos_y.as_slice(),
                self.pos_z.as_slice(),
            ],
            force: [
                self.force_x.as_mut_slice(),
                self.force_y.as_mut_slice(),
                self.force_z.as_mut_slice(),
            ],
            id: &self.id,
            ownership: &self.ownership,
        }
    }
}
