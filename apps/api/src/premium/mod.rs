pub mod codes;
pub mod gate;
pub mod handlers;
