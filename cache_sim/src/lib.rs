pub mod bin;
pub mod cache;
pub mod eval;
pub mod geometry;
pub mod matrix;
pub mod sim;
pub mod trace;
pub mod transpose;

#[cfg(feature = "stat")]
pub mod stat;
