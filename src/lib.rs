pub mod logger;
pub mod sorting;
