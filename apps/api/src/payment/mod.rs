pub mod checkout;
pub mod gateway;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod signature;
