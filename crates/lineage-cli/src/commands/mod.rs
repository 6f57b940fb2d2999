pub mod batch;
pub mod forest;
pub mod parse;
pub mod sample;
