//! Deterministic 3D bin-packing engine.
//!
//! Pure and side-effect-free: no I/O, no logging, no transport coupling.
//! Given one order's items and the shared box catalog, `pack_order`
//! produces a reproducible assignment of items to opened boxes. Every
//! choice point — item sort tie-break, catalog sort tie-break, rotation
//! enumeration order, placement tie-break, free-space reordering — is
//! pinned so identical inputs always yield identical output.

use crate::model::{
    BoxCatalog, BoxType, FreeSpace, Item, OrderResult, PackedBox, PackedBoxResult, Placement,
};

/// The engine's closed error taxonomy. `UnpackableItem` is a normal,
/// surfaceable outcome; `InternalInvariant` signals a logic bug and should
/// be unreachable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackingError {
    UnpackableItem {
        product_id: String,
        rotation_considered: bool,
    },
    InternalInvariant(String),
}

impl std::fmt::Display for PackingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackingError::UnpackableItem {
                product_id,
                rotation_considered,
            } => write!(
                f,
                "product '{product_id}' does not fit in any catalog box (rotation considered: {rotation_considered})"
            ),
            PackingError::InternalInvariant(msg) => write!(f, "internal invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for PackingError {}

/// Attempts to place `item` into `box_`, mutating its free-space list on
/// success. Scans every (free-space, rotation) pair, keeps the one with
/// the least waste, first-encountered wins ties.
pub fn try_place(box_: &mut PackedBox, item: &Item, allow_rotation: bool) -> bool {
    let mut best: Option<(usize, crate::dimensions::Dimensions, i64)> = None;

    for (space_idx, space) in box_.free_spaces.iter().enumerate() {
        for rot in item.dimensions.rotations_gate(allow_rotation) {
            if !rot.fits_in(&space.dimensions) {
                continue;
            }
            let waste = space.volume() - rot.volume();
            let better = match &best {
                None => true,
                Some((_, _, best_waste)) => waste < *best_waste,
            };
            if better {
                best = Some((space_idx, rot, waste));
            }
        }
    }

    let Some((space_idx, rot, _)) = best else {
        return false;
    };

    let space = box_.free_spaces.remove(space_idx);
    for residual in guillotine_split(&space, &rot) {
        box_.free_spaces.push(residual);
    }
    box_.free_spaces
        .sort_by_key(|s| std::cmp::Reverse(s.volume()));

    box_.placements.push(Placement {
        product_id: item.product_id.clone(),
        input_index: item.input_index,
    });
    true
}

/// Splits a consumed free space into up to three disjoint residuals:
/// right slice, front slice, top slice, in that fixed order.
fn guillotine_split(
    space: &FreeSpace,
    rot: &crate::dimensions::Dimensions,
) -> Vec<FreeSpace> {
    use crate::dimensions::Dimensions;

    let mut residuals = Vec::with_capacity(3);
    let s = space.dimensions;

    if s.width > rot.width {
        residuals.push(FreeSpace::new(Dimensions::new(s.height, s.width - rot.width, s.length)));
    }
    if s.length > rot.length {
        residuals.push(FreeSpace::new(Dimensions::new(
            s.height,
            rot.width,
            s.length - rot.length,
        )));
    }
    if s.height > rot.height {
        residuals.push(FreeSpace::new(Dimensions::new(
            s.height - rot.height,
            rot.width,
            rot.length,
        )));
    }
    residuals
}

/// Picks the catalog box to open for an item that didn't fit any
/// already-opened box: the first box in ascending-volume order that
/// admits the item in some orientation permitted by `allow_rotation`.
/// A box that admits the item in its original orientation is found
/// before any box that needs a rotation gets a chance, simply because
/// it is checked first in the same ascending-volume walk — there is no
/// separate whole-catalog pass over non-rotated fits first.
fn select_box_for_new_item<'a>(
    catalog_sorted: &'a [BoxType],
    item: &Item,
    allow_rotation: bool,
) -> Result<&'a BoxType, PackingError> {
    catalog_sorted
        .iter()
        .find(|bt| {
            item.dimensions
                .rotations_gate(allow_rotation)
                .iter()
                .any(|rot| rot.fits_in(&bt.dimensions))
        })
        .ok_or_else(|| PackingError::UnpackableItem {
            product_id: item.product_id.clone(),
            rotation_considered: allow_rotation,
        })
}

/// Packs one order's items into the fewest boxes the heuristic can find.
///
/// Sorts items by volume descending (ties by ascending product_id,
/// First-Fit-Decreasing) and catalog boxes by volume ascending (ties by
/// ascending id). For each item, tries every already-opened box in
/// open-order before opening a new one.
pub fn pack_order(
    mut items: Vec<Item>,
    catalog: &BoxCatalog,
    allow_rotation: bool,
) -> Result<OrderResult, PackingError> {
    if items.is_empty() {
        return Ok(OrderResult::default());
    }

    items.sort_by(|a, b| {
        b.volume()
            .cmp(&a.volume())
            .then_with(|| a.product_id.cmp(&b.product_id))
    });

    let mut catalog_sorted: Vec<BoxType> = catalog.box_types().to_vec();
    catalog_sorted.sort_by(|a, b| a.volume().cmp(&b.volume()).then_with(|| a.id.cmp(&b.id)));

    let mut opened: Vec<PackedBox> = Vec::new();

    for item in items {
        let placed_in_existing = opened
            .iter_mut()
            .any(|box_| try_place(box_, &item, allow_rotation));

        if placed_in_existing {
            continue;
        }

        let chosen = select_box_for_new_item(&catalog_sorted, &item, allow_rotation)?.clone();
        let mut new_box = PackedBox::open(chosen);
        if !try_place(&mut new_box, &item, allow_rotation) {
            return Err(PackingError::InternalInvariant(format!(
                "box '{}' was selected as admitting product '{}' but placement failed",
                new_box.box_type.id, item.product_id
            )));
        }
        opened.push(new_box);
    }

    Ok(shape_result(opened))
}

/// Emits opened boxes in the order they were opened; within each box,
/// products sorted ascending by `input_index`.
fn shape_result(opened: Vec<PackedBox>) -> OrderResult {
    let boxes = opened
        .into_iter()
        .map(|box_| {
            let mut placements = box_.placements;
            placements.sort_by_key(|p| p.input_index);
            PackedBoxResult {
                box_type_id: box_.box_type.id,
                products: placements.into_iter().map(|p| p.product_id).collect(),
            }
        })
        .collect();
    OrderResult { boxes }
}
