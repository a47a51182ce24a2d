//! Data models for the packing engine.
//!
//! This module defines the fundamental types the engine operates on:
//! - `BoxType` / `BoxCatalog`: the immutable, ordered catalog of box types
//! - `Item`: a product to be packed, carrying its position in the order
//! - `FreeSpace`: a residual cuboid inside an open box
//! - `PackedBox` / `OrderResult`: the engine's output shape
//!
//! None of these types know about coordinates, weight, or HTTP — they are
//! plain value types consumed by `optimizer`.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::dimensions::Dimensions;

/// Validation error for catalog or item data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyId(String),
    DuplicateCatalogId(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyId(msg) => write!(f, "empty id: {msg}"),
            ValidationError::DuplicateCatalogId(id) => {
                write!(f, "duplicate catalog id: {id}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// A box type available in the catalog.
///
/// # Fields
/// * `id` - Stable, unique identifier within the catalog
/// * `dimensions` - Interior dimensions of the box
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoxType {
    pub id: String,
    pub dimensions: Dimensions,
}

impl BoxType {
    pub fn new(id: impl Into<String>, dimensions: Dimensions) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::EmptyId("box type id".to_string()));
        }
        Ok(Self { id, dimensions })
    }

    #[inline]
    pub fn volume(&self) -> i64 {
        self.dimensions.volume()
    }
}

/// An immutable, ordered catalog of box types, shared read-only across
/// concurrently-running order packings.
#[derive(Clone, Debug)]
pub struct BoxCatalog {
    box_types: Vec<BoxType>,
}

impl BoxCatalog {
    /// Builds a catalog, rejecting duplicate ids.
    pub fn new(box_types: Vec<BoxType>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::with_capacity(box_types.len());
        for bt in &box_types {
            if !seen.insert(bt.id.as_str()) {
                return Err(ValidationError::DuplicateCatalogId(bt.id.clone()));
            }
        }
        Ok(Self { box_types })
    }

    pub fn box_types(&self) -> &[BoxType] {
        &self.box_types
    }

    /// The reference catalog used throughout the engine's own test suite:
    /// `"Caixa 1"` 30x40x80, `"Caixa 2"` 50x50x40, `"Caixa 3"` 50x80x60.
    pub fn reference() -> Self {
        Self::new(vec![
            BoxType::new("Caixa 1", Dimensions::new(30, 40, 80)).unwrap(),
            BoxType::new("Caixa 2", Dimensions::new(50, 50, 40)).unwrap(),
            BoxType::new("Caixa 3", Dimensions::new(50, 80, 60)).unwrap(),
        ])
        .unwrap()
    }
}

/// A product to be packed, tagged with its position in the order as
/// received. `input_index` is what the result shaper uses to restore
/// input order within each box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub product_id: String,
    pub dimensions: Dimensions,
    pub input_index: usize,
}

impl Item {
    pub fn new(
        product_id: impl Into<String>,
        dimensions: Dimensions,
        input_index: usize,
    ) -> Result<Self, ValidationError> {
        let product_id = product_id.into();
        if product_id.is_empty() {
            return Err(ValidationError::EmptyId("product id".to_string()));
        }
        Ok(Self {
            product_id,
            dimensions,
            input_index,
        })
    }

    #[inline]
    pub fn volume(&self) -> i64 {
        self.dimensions.volume()
    }
}

/// A residual rectangular sub-region inside an open box. FreeSpace never
/// tracks its own origin: the guillotine split (see `optimizer`) is
/// constructed so residuals are disjoint by origin-agnostic arithmetic
/// alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeSpace {
    pub dimensions: Dimensions,
}

impl FreeSpace {
    pub fn new(dimensions: Dimensions) -> Self {
        Self { dimensions }
    }

    #[inline]
    pub fn volume(&self) -> i64 {
        self.dimensions.volume()
    }
}

/// A single placement record within a box: which product, at what
/// position in the original order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub product_id: String,
    pub input_index: usize,
}

/// A box that has been opened and may still have room for more items.
///
/// Owns its free-space list exclusively; no cross-box sharing.
#[derive(Clone, Debug)]
pub struct PackedBox {
    pub box_type: BoxType,
    pub placements: Vec<Placement>,
    pub free_spaces: Vec<FreeSpace>,
}

impl PackedBox {
    /// Opens a new box with one free space spanning its whole interior.
    pub fn open(box_type: BoxType) -> Self {
        let dims = box_type.dimensions;
        Self {
            box_type,
            placements: Vec::new(),
            free_spaces: vec![FreeSpace::new(dims)],
        }
    }
}

/// The final, ordered list of products placed in one opened box, as
/// emitted by the result shaper: products sorted ascending by
/// `input_index`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PackedBoxResult {
    pub box_type_id: String,
    pub products: Vec<String>,
}

/// The result of packing a single order: opened boxes in the order they
/// were opened.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize)]
pub struct OrderResult {
    pub boxes: Vec<PackedBoxResult>,
}
