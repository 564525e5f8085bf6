//! HTML parsing and serialization
//!
//! - `dom`: arena tree built from html5ever's parse output
//! - `serializer`: writes an edited tree back out
//! - `utils`: element classification constants

pub mod dom;
pub mod serializer;
pub mod utils;

pub use dom::{html_to_tree, Attr, NodeData, NodeId, Tree};
pub use serializer::{serialize_document, serialize_inner};
pub use utils::{is_skip_element, SKIP_ELEMENTS};
