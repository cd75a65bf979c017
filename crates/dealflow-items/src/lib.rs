//! Dealflow Items
//!
//! The uniform record shape flowing between data-aware steps. Any step output
//! (arrays, objects, result envelopes, primitives, null) can be normalized
//! into a list of [`WorkflowItem`]s, and that list is never empty: a missing
//! result becomes a single item with an empty `json` map so that field
//! lookups downstream simply find nothing.
//!
//! The [`value`] module holds the loose, JavaScript-compatible coercions the
//! editor's string-typed configuration relies on (`parseFloat`, `String(v)`,
//! locale-style comparison, date parsing).

mod item;
mod upstream;
pub mod value;

pub use item::{WorkflowItem, get_field_value, normalize_to_items};
pub use upstream::{NODE_ITEMS_KEY, NODE_OUTPUTS_KEY, UpstreamData, get_input_branches, get_input_items};
