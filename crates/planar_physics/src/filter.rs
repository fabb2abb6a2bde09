//! Collision filtering
//!
//! Fixtures carry a category/mask/group filter. Two fixtures collide if:
//! - they share a non-zero group: collide iff that group is positive, else
//! - (A.category & B.mask) != 0, AND (B.category & A.mask) != 0
//!
//! The filter is packed into the engine collider's `user_data` and evaluated
//! by the contact dispatcher's pair-filter hook.

use bitflags::bitflags;
use serde::{Serialize, Deserialize};

bitflags! {
    /// Collision category bits
    ///
    /// A fixture belongs to the categories in its `category` and accepts
    /// contacts from the categories in its `mask`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionLayer: u16 {
        /// Default category for new fixtures
        const DEFAULT = 1 << 0;
        /// All categories
        const ALL = 0xFFFF;
    }
}

/// Category/mask/group filter of one fixture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterData {
    /// Categories this fixture belongs to
    pub category: CollisionLayer,
    /// Categories this fixture collides with
    pub mask: CollisionLayer,
    /// Group index; same non-zero group overrides category/mask
    pub group: i16,
}

impl Default for FilterData {
    fn default() -> Self {
        Self {
            category: CollisionLayer::DEFAULT,
            mask: CollisionLayer::ALL,
            group: 0,
        }
    }
}

/// Marks a collider `user_data` value as carrying a packed filter
const FILTER_PRESENT: u128 = 1 << 48;

impl FilterData {
    /// Create a filter from raw category and mask bits
    pub fn new(category: u16, mask: u16, group: i16) -> Self {
        Self {
            category: CollisionLayer::from_bits_retain(category),
            mask: CollisionLayer::from_bits_retain(mask),
            group,
        }
    }

    /// Check if this filter allows contact with another filter
    pub fn should_collide(&self, other: &Self) -> bool {
        if self.group == other.group && self.group != 0 {
            return self.group > 0;
        }
        self.category.intersects(other.mask) && other.category.intersects(self.mask)
    }

    /// Apply a partial update, keeping fields the update leaves unset
    pub fn updated(self, update: &FilterUpdate) -> Self {
        Self {
            category: update
                .category
                .map(CollisionLayer::from_bits_retain)
                .unwrap_or(self.category),
            mask: update
                .mask
                .map(CollisionLayer::from_bits_retain)
                .unwrap_or(self.mask),
            group: update.group.unwrap_or(self.group),
        }
    }

    /// Pack into a collider `user_data` value
    pub(crate) fn to_user_data(self) -> u128 {
        FILTER_PRESENT
            | self.category.bits() as u128
            | (self.mask.bits() as u128) << 16
            | (self.group as u16 as u128) << 32
    }

    /// Unpack from a collider `user_data` value
    ///
    /// Colliders created outside the binding carry no filter and read as the
    /// default filter.
    pub(crate) fn from_user_data(data: u128) -> Self {
        if data & FILTER_PRESENT == 0 {
            return Self::default();
        }
        Self {
            category: CollisionLayer::from_bits_retain(data as u16),
            mask: CollisionLayer::from_bits_retain((data >> 16) as u16),
            group: (data >> 32) as u16 as i16,
        }
    }
}

/// A partial filter change; `None` fields keep their current value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    pub category: Option<u16>,
    pub mask: Option<u16>,
    pub group: Option<i16>,
}

impl FilterUpdate {
    /// Change only the category bits
    pub fn category(category: u16) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    /// Also change the mask bits
    pub fn with_mask(mut self, mask: u16) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Also change the group index
    pub fn with_group(mut self, group: i16) -> Self {
        self.group = Some(group);
        self
    }

    /// True if the update changes nothing
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.mask.is_none() && self.group.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_collide() {
        let a = FilterData::default();
        let b = FilterData::default();
        assert!(a.should_collide(&b));
    }

    #[test]
    fn test_category_mask_must_agree_both_ways() {
        let player = FilterData::new(0x0002, 0xFFFF & !0x0002, 0);
        let other_player = FilterData::new(0x0002, 0xFFFF & !0x0002, 0);
        let wall = FilterData::new(0x0004, 0xFFFF, 0);

        assert!(!player.should_collide(&other_player));
        assert!(player.should_collide(&wall));
        assert!(wall.should_collide(&player));

        // One-sided acceptance is not enough
        let picky = FilterData::new(0x0008, 0x0004, 0);
        assert!(!picky.should_collide(&player));
        assert!(picky.should_collide(&wall));
    }

    #[test]
    fn test_positive_group_overrides_mask() {
        let a = FilterData::new(0x0001, 0x0000, 3);
        let b = FilterData::new(0x0001, 0x0000, 3);
        assert!(a.should_collide(&b));
    }

    #[test]
    fn test_negative_group_never_collides() {
        let a = FilterData::new(0x0001, 0xFFFF, -2);
        let b = FilterData::new(0x0001, 0xFFFF, -2);
        assert!(!a.should_collide(&b));

        // Different groups fall back to category/mask
        let c = FilterData::new(0x0001, 0xFFFF, -3);
        assert!(a.should_collide(&c));
    }

    #[test]
    fn test_update_changes_only_given_fields() {
        let before = FilterData::new(0x0003, 0x00F0, -4);
        let after = before.updated(&FilterUpdate::category(5));

        assert_eq!(after.category.bits(), 5);
        assert_eq!(after.mask, before.mask);
        assert_eq!(after.group, before.group);

        let after = before.updated(&FilterUpdate::default().with_group(7));
        assert_eq!(after.category, before.category);
        assert_eq!(after.group, 7);
    }

    #[test]
    fn test_user_data_packing_keeps_negative_group() {
        let filter = FilterData::new(0x8001, 0x7FFE, -32768);
        assert_eq!(FilterData::from_user_data(filter.to_user_data()), filter);

        let filter = FilterData::new(0, 0, 12);
        assert_eq!(FilterData::from_user_data(filter.to_user_data()), filter);
    }

    #[test]
    fn test_unmarked_user_data_reads_as_default() {
        assert_eq!(FilterData::from_user_data(0), FilterData::default());
        assert_eq!(FilterData::from_user_data(0xFFFF), FilterData::default());
    }

    #[test]
    fn test_empty_update() {
        assert!(FilterUpdate::default().is_empty());
        assert!(!FilterUpdate::category(1).with_mask(2).is_empty());
    }
}
