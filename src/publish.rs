pub(crate) mod config;
pub(crate) mod pointer;
pub(crate) mod publisher;
pub(crate) mod rotation;
