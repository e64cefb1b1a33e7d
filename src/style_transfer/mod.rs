//! Style-transfer model wrapper over an external training runtime.

pub(crate) mod backend;
pub(crate) mod model;
pub(crate) mod options;
