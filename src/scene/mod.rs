pub(crate) mod asset;
pub(crate) mod color;
pub(crate) mod project;
