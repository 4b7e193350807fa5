pub mod extractor;
pub mod hhmm;
pub mod jwt;
pub mod test_utils;
