pub mod output;
pub mod render;
pub mod serve;
