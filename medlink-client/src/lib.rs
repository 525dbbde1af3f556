mod config;
mod media;
mod reports;
mod session;
mod transport;

pub use config::*;
pub use media::*;
pub use reports::*;
pub use session::*;
pub use transport::*;
