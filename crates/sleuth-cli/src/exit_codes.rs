//! Process exit codes. Part of the public contract of the `sleuth` binary.

pub const SUCCESS: i32 = 0;
pub const RUN_FAILED: i32 = 1; // Transport, unavailable endpoint, validation exhausted
pub const CONFIG_ERROR: i32 = 2; // Bad configuration or case bundle
