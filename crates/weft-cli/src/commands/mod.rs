pub mod check;
pub mod expand;
pub mod render;
