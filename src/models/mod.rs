pub mod question;
pub mod taxonomy;
pub mod test;
pub mod test_result;
