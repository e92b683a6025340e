//! Library crate for `super-lazy-clangd`: a minimal LSP server for C/C++
//! that answers code-intelligence queries via fixed-string search rather
//! than a real compiler front end.

pub mod cli;
pub mod documents;
pub mod error;
pub mod framing;
pub mod handlers;
pub mod inflight;
pub mod paths;
pub mod rpc;
pub mod search;
pub mod session;
pub mod uri;
