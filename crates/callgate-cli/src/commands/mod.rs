pub mod invoke;
pub mod parse;
pub mod registry_check;
pub mod resolve;
