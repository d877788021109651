pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod expenses;
pub mod health;
pub mod incomes;
pub mod profile;
pub mod reports;
pub mod transactions;
