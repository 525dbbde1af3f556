pub mod test_client;

pub use signal_helpers::*;
pub use test_client::*;
