//! Rule-based workflow synthesis for flowsmith.
//!
//! Turns a [`GenerationRequest`] into a connected, importable
//! [`WorkflowDocument`] without any I/O:
//!
//! - **Catalog**: one static template per [`NodeKind`], looked up by
//!   service tag.
//! - **Selector**: picks an ordered node list, one trigger first, capped by
//!   [`Complexity`].
//! - **Parameter filler**: overlays values found in the description onto
//!   template skeletons.
//! - **Connection builder**: chains nodes, branches after conditionals.
//! - **Assembler**: names, ids and metadata via an injected
//!   [`UniquenessSource`].
//!
//! [`Synthesizer`] runs the whole pipeline and never fails for any input.

pub mod assemble;
pub mod catalog;
pub mod connect;
pub mod document;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod request;
pub mod selector;
pub mod uniqueness;

pub use assemble::{Assembler, sha256_hex, title_phrase};
pub use catalog::{
    Catalog, CatalogEntry, Category, NodeKind, NodeTemplate, Stage, is_respond_type,
    is_trigger_type,
};
pub use connect::{ConnectionMap, connect};
pub use document::{
    Connection, ConnectionTarget, GenerationSource, Node, NodeConnections, Violation,
    WorkflowDocument, WorkflowMeta, WorkflowSettings,
};
pub use error::{Result, SynthError};
pub use params::{Entities, FillContext, ParameterFiller};
pub use pipeline::Synthesizer;
pub use request::{Complexity, GenerationRequest, TriggerKind};
pub use selector::{NodeInstance, Selection, Selector};
pub use uniqueness::{FixedSource, SystemSource, UniquenessSource};
