pub mod host;
pub mod remote;
