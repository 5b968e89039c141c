pub(crate) mod bounds;
pub(crate) mod model;
pub(crate) mod presets;
