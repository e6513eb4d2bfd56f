pub mod controls;
pub mod disc;
