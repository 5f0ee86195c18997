mod indexed_item;
mod item;

pub use indexed_item::IndexedItem;
pub use item::{Item, ItemInput};
