pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    assembler_service::AssemblerService, bank_service::BankService, import_service::ImportService,
    result_service::ResultService, test_service::TestService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub bank_service: BankService,
    pub test_service: TestService,
    pub assembler_service: AssemblerService,
    pub result_service: ResultService,
    pub import_service: ImportService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let bank_service = BankService::new(pool.clone());
        let test_service = TestService::new(pool.clone());
        let assembler_service = AssemblerService::new(pool.clone());
        let result_service = ResultService::new(pool.clone());
        let import_service = ImportService::new(pool.clone());

        Self {
            pool,
            bank_service,
            test_service,
            assembler_service,
            result_service,
            import_service,
        }
    }
}
