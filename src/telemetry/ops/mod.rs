pub mod sync;
pub mod reduce;
