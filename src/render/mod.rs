pub(crate) mod occlusion;
pub(crate) mod overlay;
pub(crate) mod raster;
