pub mod documents;
pub mod index;
