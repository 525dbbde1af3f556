mod reports_client;

pub use reports_client::*;
