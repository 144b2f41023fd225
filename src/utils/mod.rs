pub mod paged_file;
pub mod pages;
