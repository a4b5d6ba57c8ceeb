pub mod block;
pub mod errors;
pub mod verify;
