pub(crate) mod batch;
pub(crate) mod export;
pub(crate) mod factory;
pub(crate) mod simulator;
