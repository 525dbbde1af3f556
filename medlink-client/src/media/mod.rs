mod capture;
mod local_media;
mod remote_stream;

pub use capture::*;
pub use local_media::*;
pub use remote_stream::*;
