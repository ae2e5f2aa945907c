//! HTTP clients for the services the warehouse aggregates.
//!
//! - [`AmarettiClient`]: the task/instance orchestration service
//! - [`AuthClient`]: the authentication service (token escalation)
//!
//! Both wrap a [`ServiceClient`], which carries the base URL, the timeout
//! applied to every call, and the error mapping. Credentials are passed per
//! call because the same client is used with the service token, the
//! caller's token, and escalated tokens.
//!
//! # Example
//!
//! ```no_run
//! use warehouse_client::{AmarettiClient, ServiceClient, TaskQuery};
//! use warehouse_types::Task;
//!
//! # async fn example() -> warehouse_client::Result<()> {
//! let amaretti = AmarettiClient::new(
//!     ServiceClient::builder()
//!         .base_url("http://localhost:8081/api/amaretti")
//!         .build()?,
//! );
//!
//! let task: Task = amaretti.get_task("5d9f...", "service-token").await?;
//! # Ok(())
//! # }
//! ```

pub mod amaretti;
pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use amaretti::AmarettiClient;
pub use auth::AuthClient;
pub use client::{ClientBuilder, ServiceClient};
pub use error::{Error, Result};
pub use types::{NewTask, TaskQuery};
