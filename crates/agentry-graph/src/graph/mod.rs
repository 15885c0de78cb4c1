//! Workflow graph structures.
//!
//! This module provides the in-memory model the editor mutates:
//! - [`WorkflowGraph`]: nodes and edges of one agent, with its invariants
//! - [`NodeInstance`], [`NodeId`], [`Position`]: nodes placed on the canvas
//! - [`Edge`], [`EdgeId`], [`PortRef`]: connections between ports
//! - [`NodeView`], [`PortView`]: read-only views for the rendering layer
//! - [`WorkflowMetadata`]: descriptive metadata stored with the workflow

mod edge;
mod id;
mod metadata;
mod node;
mod workflow;

pub use edge::{Edge, PortRef};
pub use id::{EdgeId, NodeId};
pub use metadata::WorkflowMetadata;
pub use node::{NodeInstance, NodeView, PortView, Position};
pub use workflow::{RemovedNode, WorkflowGraph};
