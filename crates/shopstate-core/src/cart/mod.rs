//! Shopping cart module.
//!
//! Contains the cart engine, its line type, and line identity derivation.

mod cart;
pub mod key;
mod line;

pub use cart::{Cart, CartState};
pub use key::{attributes, canonical_attribute_string, line_id, Attributes};
pub use line::{CartLine, LineUpdate, NewLine};
