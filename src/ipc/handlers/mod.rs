pub mod cgpa;
pub mod core;
pub mod counter;
pub mod degree;
pub mod nad;
pub mod setup;
