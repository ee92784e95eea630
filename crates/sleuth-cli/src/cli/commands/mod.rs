pub mod dispatch;
pub(crate) mod run;
pub mod validate;

pub use dispatch::dispatch;
