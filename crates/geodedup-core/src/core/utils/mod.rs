pub mod assignment;
pub mod elements;
pub mod geometry;
