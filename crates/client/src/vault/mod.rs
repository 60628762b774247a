//! Per-user namespaces of encrypted, shareable files.
//!
//! Every file a user can reach hangs off a DAG rooted at their [`Access`]
//! capability for that filename:
//!
//! ```text
//! Access (owner)  ──────────────▶ FileMeta ──▶ FileBlock ──▶ … ──▶ (reserved)
//! Access (sharee) ──▶ Invitation ─────▲
//! ```
//!
//! Owners point straight at the file's metadata; sharees go through an
//! owner-controlled [`Invitation`](invite::Invitation) blob, which is what
//! makes revocation a single owner-side rewrite instead of a fan-out to
//! every sharee's private state.

mod access;
mod chain;
mod invite;
mod session;

pub use access::Access;
pub use chain::{FileBlock, FileMeta};
pub use invite::{Invitation, InviteList};
pub use session::{Client, Session};
