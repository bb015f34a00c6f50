//! An unofficial Rust client for the Qubole Data Service cluster API.
//!
//! Qubole is a commercial big-data-as-a-service platform. This library talks
//! to the QDS cluster endpoints: it builds the nested cluster configuration
//! document from whatever settings you supply, and runs one of the five
//! cluster lifecycle operations (create, fetch, start, terminate, delete).
//!
//! ```no_run
//! use qds::resource::{ClusterCommand, ClusterIdLabel};
//! use std::str::FromStr;
//!
//! # async fn example() -> qds::Result<()> {
//! let client = qds::Client::new("my-api-token")?;
//!
//! let cluster = ClusterIdLabel::from_str("analytics")?;
//! let outcome = client.dispatch(&ClusterCommand::Start(cluster)).await?;
//! assert!(outcome.changed);
//! println!("{}", outcome.cluster);
//! #
//! #   Ok(())
//! # }
//! ```
//!
//! Request and response schemas are owned by the remote service. We keep the
//! request document strongly typed, and leave anything we don't model in an
//! open `extra` map on [`resource::Cluster`].

#![warn(missing_docs)]

pub use client::{Client, DEFAULT_QDS_API_URL};
pub use errors::*;

mod client;
mod errors;
pub mod resource;
