pub mod dialects;
pub mod errors;
pub mod helpers;
pub mod parser;
