use super::{KeyComponent, Side, resolve};
use std::cmp::Ordering;

///
/// ShapeComponent
///
/// Symbolic key component used at build time: the value is unknown, only
/// its role in the range is.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ShapeComponent {
    Absent,
    Fixed,
    Bound(Side),
}

impl KeyComponent for ShapeComponent {
    fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    fn key_eq(&self, other: &Self) -> bool {
        matches!((self, other), (Self::Fixed, Self::Fixed))
    }

    fn key_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bound(Side::Start), Self::Bound(Side::End)) => Some(Ordering::Less),
            (Self::Bound(Side::End), Self::Bound(Side::Start)) => Some(Ordering::Greater),
            _ => None,
        }
    }
}

///
/// SliceShape
///
/// Which sides of a range a slice method bounds on one clustering column.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SliceShape {
    pub lower: bool,
    pub upper: bool,
}

impl SliceShape {
    pub const LOWER: Self = Self {
        lower: true,
        upper: false,
    };
    pub const UPPER: Self = Self {
        lower: false,
        upper: true,
    };
    pub const BOTH: Self = Self {
        lower: true,
        upper: true,
    };
}

/// Shapes the range algorithm accepts when the varying component sits at
/// key `position` (0 is the partition key, so it never yields a shape).
#[must_use]
pub fn legal_slice_shapes(position: usize) -> Vec<SliceShape> {
    let mut shapes = Vec::new();
    if position == 0 {
        return shapes;
    }

    for si in 0..=position {
        for ei in 0..=position {
            let start = symbolic(si, position, Side::Start);
            let end = symbolic(ei, position, Side::End);

            let Ok(range) = resolve(&start, &end) else {
                continue;
            };
            if range.fixed.len() != position {
                continue;
            }

            let shape = SliceShape {
                lower: range.last_start.is_some(),
                upper: range.last_end.is_some(),
            };
            if (shape.lower || shape.upper) && !shapes.contains(&shape) {
                shapes.push(shape);
            }
        }
    }

    shapes.sort();
    shapes
}

// components up to `last` present; the one at `position` is the bound
fn symbolic(last: usize, position: usize, side: Side) -> Vec<ShapeComponent> {
    (0..=position)
        .map(|i| match i {
            i if i > last => ShapeComponent::Absent,
            i if i == position => ShapeComponent::Bound(side),
            _ => ShapeComponent::Fixed,
        })
        .collect()
}
