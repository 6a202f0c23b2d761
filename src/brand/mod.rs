//! Staged concept-to-profile workflow.
//!
//! A user supplies a seed concept and a project name, then narrows them
//! through three stages (problem, audience, format). Each stage offers
//! generated options plus regenerate and free-text escapes; after the third
//! choice the stages are synthesized into a `BrandProfile`.

pub mod assembler;
pub mod engine;
pub mod feedback;
pub mod manager;
pub mod model;
pub mod outbox;
pub mod prompts;
pub mod render;
pub mod routes;
pub mod selection;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use feedback::{MemoryPublisher, Publisher, TracingPublisher};
pub use manager::BrandFlow;
pub use model::{BrandProfile, GeneratedBatch, StageOption};
pub use outbox::{CollectingOutbox, Outbound, Outbox};
pub use render::{Action, FlowEvent, InboundEvent, Menu};
pub use routes::flow_routes;
pub use session::{Session, SessionStatus, SessionStore};
pub use state::{Stage, StageState};
