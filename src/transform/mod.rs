pub(crate) mod affine;
pub(crate) mod path;
pub(crate) mod transformation;
pub(crate) mod warp;
