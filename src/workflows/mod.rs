pub mod allocation;
pub mod ledger;
