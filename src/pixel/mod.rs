pub(crate) mod channel;
pub(crate) mod format;
pub(crate) mod types;
