mod state;
mod sync;

#[cfg(feature = "tokio")]
mod tokio;

pub use state::ScannedRecord;
pub use sync::Scanner;

#[cfg(feature = "tokio")]
pub use self::tokio::AsyncScanner;
