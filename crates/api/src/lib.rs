//! HTTP API: routing, authentication middleware and error mapping for the
//! token lifecycle.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
pub mod policy;
