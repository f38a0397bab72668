pub mod app;
pub mod context;
pub mod processors;

#[cfg(feature = "devel")]
pub(crate) mod reload;
