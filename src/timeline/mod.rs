pub(crate) mod clock;
pub(crate) mod context;
pub(crate) mod scrub;
pub(crate) mod widget;
