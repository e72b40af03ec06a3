//! Specialized collection types

use slotmap::new_key_type;

pub use slotmap::{SlotMap, SecondaryMap};

new_key_type! {
    /// Stable arena handle for a scene entity (and the transform it owns)
    pub struct EntityId;
}

/// Remove the first occurrence of `value` with swap-and-pop
///
/// Order of the remaining elements is not preserved. Returns whether the
/// value was present.
pub fn swap_remove_item<T: PartialEq>(items: &mut Vec<T>, value: &T) -> bool {
    if let Some(index) = items.iter().position(|item| item == value) {
        items.swap_remove(index);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_remove_item_moves_last_into_hole() {
        let mut items = vec![1, 2, 3, 4];
        assert!(swap_remove_item(&mut items, &2));
        assert_eq!(items, vec![1, 4, 3]);
        assert!(!swap_remove_item(&mut items, &9));
    }
}
