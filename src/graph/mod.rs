//! Graph entities and their serialised output form.

pub mod arena;
pub mod models;
pub mod node;

pub use arena::NodeArena;
pub use models::{GraphLink, GraphNode, ImportName, ImportStatement, LinkLabel};
pub use node::{Node, NodeType, Position};
