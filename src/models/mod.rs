pub mod item;
pub mod user;

pub use item::{Category, CategoryFilter, Item, ItemFilter, ItemInput, NewItem};
pub use user::{NewUser, User};
