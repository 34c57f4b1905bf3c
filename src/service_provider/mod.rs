pub mod contentful;
pub mod slack;
