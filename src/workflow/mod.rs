//! The generation pipeline: five generation phases, a bounded validation
//! loop, then publish and deploy.
//!
//! ```text
//! Setup → Components → Sections → Pages & Layout → SEO & Content
//!   → Validation ⇄ Auto-fix → GitHub Publish → Vercel Deploy
//! ```

mod orchestrator;
mod phase;
mod validation;

pub use orchestrator::{
    COMPLETED_MESSAGE, COMPONENTS_BAND, CONTENT_BAND, DEPLOY_BAND, Deployment, PAGES_BAND,
    PUBLISH_BAND, SECTIONS_BAND, SETUP_BAND, VALIDATION_BAND, WorkflowConfig, WorkflowOrchestrator,
};
pub use phase::{PhaseResult, PhaseRunner, PhaseSpec, ProgressBand};
pub use validation::{ValidationLoop, ValidationOutcome, ValidationState, after_fix, after_validation};
