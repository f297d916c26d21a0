pub mod hooks;
pub mod host;
pub mod lifecycle;
pub mod remote;
