//! # Lockstep Flow
//!
//! The interactive flow protocol seam and the driver that operates it.
//!
//! A flow is a multi-step question/answer session hosted by an external
//! subsystem: init yields a first step, each answer submission yields the
//! next, and the session ends with a terminal result or a terminal abort.
//! This crate owns:
//!
//! - [`FlowProtocol`]: the trait the external subsystem is consumed through
//! - [`FlowDriver`]: turns an ordered list of answer sets into a terminal
//!   receipt or a classified failure, cleaning up broken runs as it goes

pub mod driver;
pub mod error;
pub mod protocol;

pub use driver::FlowDriver;
pub use error::{FlowError, FlowResult};
pub use protocol::{FlowContext, FlowHandle, FlowProtocol, FlowSubject, ProtocolError};
