pub mod health;
pub mod public;
pub mod question_routes;
pub mod result_routes;
pub mod taxonomy;
pub mod test_routes;
pub mod transfer;
