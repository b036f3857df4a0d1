//! Core attachment logic for Madani.
//!
//! This crate contains storage tiers and the upload, serve and repair
//! resolvers with ZERO web or database dependencies. Persistence is reached
//! through the [`attachment::AttachmentRepository`] trait.
//!
//! # Modules
//!
//! - `storage` - Storage tiers, codecs and external object providers
//! - `attachment` - Attachment descriptors and resolvers
//! - `service_cell` - Lazily initialised process-wide clients

pub mod attachment;
pub mod service_cell;
pub mod storage;
