pub mod level;
pub mod sim;
