#![allow(unused_imports)]

pub(crate) mod test_server;
pub(crate) mod test_worker;

pub use test_server::*;
pub use test_worker::*;
