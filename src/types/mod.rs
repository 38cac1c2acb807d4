pub mod station;
pub mod weather;
pub mod window;
