pub(crate) mod accumulate;
pub(crate) mod cancel;
pub(crate) mod dispatch;
pub(crate) mod executor;
pub(crate) mod invocation;
pub(crate) mod partition;
pub(crate) mod session;
