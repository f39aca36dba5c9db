//! Hook system: registry, dispatcher, and payload definitions.

pub mod definitions;
pub mod dispatcher;
pub mod registry;

pub use definitions::{DispatchResult, HookFailure, HookPayload};
pub use dispatcher::HookDispatcher;
pub use registry::{ClosureHandler, HookHandler, HookRegistry};
