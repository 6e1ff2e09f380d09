//! The virtual document: canonical text, line index, and edit translation.

mod line;
mod virtual_doc;

pub use line::Line;
pub use virtual_doc::{Fill, VirtualDocument};
