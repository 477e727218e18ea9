//! MSAP Engine
//!
//! The node side of the management service access point: decode a request
//! frame, check the permission gate, run the operation against the injected
//! [`Platform`] and rewrite the frame in place into its confirm.
//!
//! # Flow
//!
//! ```text
//! transport ──frame──▶ Msap::accept ──Item──▶ Msap::handle ──▶ handler
//!                                                               │
//! transport ◀──bytes── Msap::pre_send ◀── confirm in Item ◀─────┘
//!     │
//!     └──sent──▶ Msap::post_send (reboot, item back to pool)
//! ```
//!
//! Asynchronous events become indications through `Msap::notify_*` and are
//! drained with [`Msap::next_indication`].
//!
//! # Example
//!
//! ```rust,ignore
//! use msap_core::{Msap, MsapConfig, Outcome};
//! use msap_core::sim::{SimulatedNode, SimulatedNodeConfig};
//!
//! let node = SimulatedNode::new("router-1", &SimulatedNodeConfig::router(1));
//! let mut msap = Msap::new(node, MsapConfig::default());
//!
//! if let Some(mut item) = msap.accept(frame) {
//!     if msap.handle(&mut item) == Outcome::Responded {
//!         msap.pre_send(&mut item);
//!         transport.send(&item.frame.encode()?)?;
//!     }
//!     msap.post_send(item);
//! }
//! ```

mod attributes;
mod config;
mod error;
mod handlers;
mod indication;
mod item;
mod msap;
mod permission;
mod platform;
pub mod sim;

pub use attributes::{
    lookup, registry, AttributeDescriptor, AttributeReader, AttributeWriter, ATTRIBUTE_COUNT,
};
pub use config::MsapConfig;
pub use error::{AppConfigError, ConfigError, StackError};
pub use indication::{app_config_received, scan_complete, stack_state};
pub use item::{Item, ItemKind, ItemPool, PostSend, PreSend};
pub use msap::{Msap, Outcome};
pub use permission::{Feature, LockBitmap, LockBits};
pub use platform::{
    Clock, DataPlane, NeighborInfo, NeighborKind, NetworkStack, Otap, OtapWrite, Persistence,
    Platform, SleepControl, StackResult, StackSettings, StackStatus,
};
