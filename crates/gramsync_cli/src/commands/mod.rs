pub(crate) mod comment;
pub(crate) mod meta;
pub(crate) mod migrate;
pub(crate) mod posts;
pub(crate) mod shared;
pub(crate) mod sync;
