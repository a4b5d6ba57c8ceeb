pub mod conservation;
pub mod limits;
pub mod report;
pub mod signature;
