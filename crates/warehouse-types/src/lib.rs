//! Shared domain types for the warehouse secondary-output service.
//!
//! These types mirror the wire shapes of the collaborating services (the
//! orchestration service's tasks and instances, the project datastore, and
//! the authentication service's token claims) and the event publisher seam
//! used by the server.

pub mod claims;
mod de;
pub mod events;
pub mod instance;
pub mod project;
pub mod task;

pub use claims::Claims;
pub use events::{DownloadEvent, EventPublisher, PublishError, SharedEventPublisher};
pub use instance::Instance;
pub use project::Project;
pub use task::{ArchiveConfig, ArchiveTask, DepConfig, OutputRequest, Task};

/// Access-control group identifier shared by projects, instances and tasks.
pub type GroupId = i64;
