//! Contract deployment: templates, confirmation polling and the orchestrator.

pub mod confirmation;
pub mod orchestrator;
pub mod result;
pub mod templates;

pub use confirmation::{await_confirmation, Confirmation, ConfirmationPolicy};
pub use orchestrator::{DeploymentPolicy, Orchestrator};
pub use result::{ContractKind, DeployError, DeploymentResult};
pub use templates::{ClarityTemplates, ContractTemplates};
