pub mod assembler_service;
pub mod bank_service;
pub mod export_service;
pub mod grading_service;
pub mod import_service;
pub mod result_service;
pub mod scoring_service;
pub mod test_service;
