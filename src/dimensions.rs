//! Axis-aligned 3D dimension primitives.
//!
//! A `Dimensions` triple is a plain value type: no coordinates, no identity,
//! just height/width/length. Everything the packing engine needs to reason
//! about geometric fit is built on top of it.

use std::fmt;

/// Height/width/length of a cuboid, in whatever integer unit the catalog uses.
///
/// All three components are always positive; `Dimensions` cannot represent
/// a degenerate or negative extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub height: u32,
    pub width: u32,
    pub length: u32,
}

impl Dimensions {
    pub fn new(height: u32, width: u32, length: u32) -> Self {
        Self {
            height,
            width,
            length,
        }
    }

    /// Volume as a 64-bit product; three u32s can't overflow an i64.
    #[inline]
    pub fn volume(&self) -> i64 {
        self.height as i64 * self.width as i64 * self.length as i64
    }

    /// All unique permutations of (height, width, length), canonical order.
    ///
    /// 6 when all axes differ, 3 when exactly two match, 1 when all three
    /// match. Duplicates are removed by first occurrence, not resorted.
    pub fn rotations(&self) -> Vec<Dimensions> {
        let (h, w, l) = (self.height, self.width, self.length);
        let perms = [
            Dimensions::new(h, w, l),
            Dimensions::new(h, l, w),
            Dimensions::new(w, h, l),
            Dimensions::new(w, l, h),
            Dimensions::new(l, h, w),
            Dimensions::new(l, w, h),
        ];

        let mut unique = Vec::with_capacity(6);
        for p in perms {
            if !unique.contains(&p) {
                unique.push(p);
            }
        }
        unique
    }

    /// Rotations considered for placement: all of them if rotation is
    /// allowed, otherwise just the original orientation.
    pub fn rotations_gate(&self, allow_rotation: bool) -> Vec<Dimensions> {
        if allow_rotation {
            self.rotations()
        } else {
            vec![*self]
        }
    }

    /// Axis-wise fit with no reordering of axes.
    #[inline]
    pub fn fits_in(&self, space: &Dimensions) -> bool {
        self.height <= space.height && self.width <= space.width && self.length <= space.length
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.length)
    }
}
