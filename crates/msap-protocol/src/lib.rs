//! MSAP Wire Protocol
//!
//! This crate provides types and utilities for the management service access
//! point (MSAP) of a mesh node. A host sends fixed-format request frames; the
//! node answers each with a confirm and may also emit unsolicited indications.
//!
//! # Protocol Overview
//!
//! Every frame carries a function code, an opaque sequence id and a length
//! prefixed payload. Frames are one of:
//!
//! - **Requests** (host → node): a `FUNC_*_REQ` code
//! - **Confirms** (node → host): the request code with [`CONFIRM_BIT`] set,
//!   echoing the request's sequence id
//! - **Indications** (node → host): a `FUNC_*_IND` code, sequence id 0
//!
//! Request payload lengths are validated exactly against the function code;
//! a mismatching frame is a framing error and gets no confirm.
//!
//! # Example
//!
//! ```rust,ignore
//! use msap_protocol::{Confirm, Frame, Request};
//!
//! // Build a request
//! let frame = Request::AttributeRead { id: ATTR_AUTOSTART }.to_frame(1);
//! let bytes = frame.encode()?;
//!
//! // Parse the confirm
//! let confirm = Confirm::decode(&Frame::decode(&received)?)?;
//! ```

mod confirms;
mod constants;
mod error;
mod frame;
mod indications;
mod requests;
mod types;

pub use confirms::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use indications::*;
pub use requests::*;
pub use types::*;
