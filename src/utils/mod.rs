pub mod json;
pub mod validate;
