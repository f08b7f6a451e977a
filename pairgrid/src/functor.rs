//! The pair functor interface and per-thread accumulator storage

use std::cell::UnsafeCell;

use crate::particle::Particle;
use crate::soa::{attribute_of, set_attribute, Attribute, SoaBuffer};

/// All scalar columns (gather set of a typical force functor)
pub const POSITION_AND_FORCE_ATTRIBUTES: &[Attribute] = &[
    Attribute::PosX,
    Attribute::PosY,
    Attribute::PosZ,
    Attribute::ForceX,
    Attribute::ForceY,
    Attribute::ForceZ,
];

/// Force columns (scatter set of a typical force functor)
pub const FORCE_ATTRIBUTES: &[Attribute] = &[
    Attribute::ForceX,
    Attribute::ForceY,
    Attribute::ForceZ,
];

/// A symmetric pairwise interaction kernel.
///
/// The engine never looks inside a functor; it drives these entry points in
/// AoS or SoA layout, with or without Newton-3 reciprocity. A functor
/// declaring `!allows_newton3()` is never invoked with `newton3 = true` (and
/// vice versa); the selector enforces this.
///
/// Functors carrying global accumulators must make them thread-safe
/// ([`ThreadAccumulators`] is the intended vehicle): traversals call `aos`
/// and the SoA entry points from many threads at once.
pub trait Functor<P: Particle>: Send + Sync {
    /// Interaction cutoff this functor was parameterized with
    fn cutoff(&self) -> f64;

    /// Update `F_i` (and `F_j` if `newton3`) for one particle pair.
    /// Must include its own cutoff check.
    fn aos(&self, i: &mut P, j: &mut P, newton3: bool);

    /// All pairs within one SoA buffer
    fn soa(&self, _soa: &mut SoaBuffer, _newton3: bool) {
        unimplemented!("single-buffer SoA entry point not provided by this functor")
    }

    /// All cross pairs between two SoA buffers. Writes forces of `soa1`
    /// (and of `soa2` if `newton3`).
    fn soa_pair(&self, _soa1: &mut SoaBuffer, _soa2: &mut SoaBuffer, _newton3: bool) {
        unimplemented!("two-buffer SoA entry point not provided by this functor")
    }

    /// Rows `[i_from, i_to)` of a Verlet list over a global SoA buffer
    fn soa_verlet(
        &self,
        _soa: &mut SoaBuffer,
        _neighbor_lists: &[Vec<usize>],
        _i_from: usize,
        _i_to: usize,
        _newton3: bool,
    ) {
        unimplemented!("Verlet SoA entry point not provided by this functor")
    }

    /// Columns gathered by the default loader
    fn needed_attributes(&self) -> &'static [Attribute] {
        POSITION_AND_FORCE_ATTRIBUTES
    }

    /// Columns scattered back by the default extractor
    fn computed_attributes(&self) -> &'static [Attribute] {
        FORCE_ATTRIBUTES
    }

    /// Gather the declared columns of `particles` into `soa` starting at `offset`
    fn soa_loader(&self, particles: &[P], soa: &mut SoaBuffer, offset: usize) {
        soa.resize(offset + particles.len());
        for (i, p) in particles.iter().enumerate() {
            let row = offset + i;
            soa.set_id(row, p.id());
            soa.set_ownership(row, p.ownership());
            for &attr in self.needed_attributes() {
                soa.set_scalar(attr, row, attribute_of(p, attr));
            }
        }
    }

    /// Scatter the declared columns of `soa` back into `particles`
    fn soa_extractor(&self, particles: &mut [P], soa: &SoaBuffer, offset: usize) {
        for (i, p) in particles.iter_mut().enumerate() {
            let row = offset + i;
            for &attr in self.computed_attributes() {
                set_attribute(p, attr, soa.scalar(attr, row));
            }
        }
    }

    /// Called once at the start of each traversal
    fn init_traversal(&self) {}

    /// Called once at the end of each traversal. In non-N3 mode global
    /// accumulators must be halved here, since the engine has visited every
    /// pair twice.
    fn end_traversal(&self, _newton3: bool) {}

    fn allows_newton3(&self) -> bool;

    fn allows_non_newton3(&self) -> bool;

    fn is_relevant_for_tuning(&self) -> bool {
        true
    }
}

#[repr(align(64))]
struct Slot<T>(UnsafeCell<T>);

/// One accumulator bucket per worker thread, each padded to a cache line.
///
/// Shared mutation goes through [`ThreadAccumulators::with_mut`], which
/// resolves the caller's rayon worker index to a dedicated slot; callers
/// outside the pool share the single spare slot. Reduction and reset require
/// `&mut self` and are therefore race-free by construction.
pub struct ThreadAccumulators<T> {
    slots: Box<[Slot<T>]>,
}

// Slots are only dereferenced through a per-thread index, see with_mut.
unsafe impl<T: Send> Sync for ThreadAccumulators<T> {}

impl<T: Default> ThreadAccumulators<T> {
    pub fn new() -> Self {
        let slots = (0..rayon::current_num_threads() + 1)
            .map(|_| Slot(UnsafeCell::new(T::default())))
            .collect::<Vec<_>>();
        Self {
            slots: slots.into_boxed_slice(),
        }
    }

    /// Run `f` on the calling thread's bucket
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let index = rayon::current_thread_index().unwrap_or(self.slots.len() - 1);
        // No other thread resolves to this slot while we hold it
        let bucket = unsafe { &mut *self.slots[index].0.get() };
        f(bucket)
    }

    /// Reset every bucket. Caller must be outside any traversal that writes
    /// the buckets (init/end hooks run on the sequential driver).
    pub fn reset(&self) {
        for slot in self.slots.iter() {
            // Invariant: no concurrent with_mut callers while resetting
            unsafe { *slot.0.get() = T::default() };
        }
    }

    /// Fold all buckets into a single value. Same caller invariant as
    /// [`ThreadAccumulators::reset`].
    pub fn reduce<R>(&self, init: R, mut f: impl FnMut(R, &T) -> R) -> R {
        let mut acc = init;
        for slot in self.slots.iter() {
            acc = f(acc, unsafe { &*slot.0.get() });
        }
        acc
    }

    /// Consume the accumulators, yielding every bucket
    pub fn into_inner(self) -> Vec<T> {
        self.slots
            .into_vec()
            .into_iter()
            .map(|slot| slot.0.into_inner())
            .collect()
    }
}

impl<T: Default> Default for ThreadAccumulators<T> {
    fn default() -> Self {
        Self::new()
    }
}
