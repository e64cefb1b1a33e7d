pub(crate) mod batch;
pub(crate) mod composite;
pub(crate) mod config;
pub(crate) mod edge;
pub(crate) mod geometry;
pub(crate) mod resample;
pub(crate) mod sampler;
pub(crate) mod synth;
