//! The narrow interface every tool source in the gateway is built against.
//!
//! [`Service`] is a closed abstraction over the three tool-source kinds the
//! specification distinguishes (built-in, API wrapper, remote catalog proxy).
//! Registration happens at compile time: each service module calls
//! [`inventory::submit!`] with a [`ServiceFactory`], and [`inventory::iter`]
//! walks the collected factories once at process start. There is no runtime
//! reflection and no virtual-dispatch base class — just data plus one async
//! method.

pub mod tool;

pub use tool::{Credentials, Service, ServiceFactory, ServiceKind, ToolDescriptor, ToolError};
