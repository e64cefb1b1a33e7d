pub(crate) mod flex;
pub(crate) mod frame;
pub(crate) mod resize;
