mod cli;
mod demo;
mod server;

pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;
pub mod workflows;

use error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
