pub mod reconciler;
pub mod server;
