pub mod cycle;
pub mod emit;
pub mod status;
pub mod versions;
