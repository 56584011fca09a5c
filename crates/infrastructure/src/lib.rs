pub mod booking;
pub mod df;
pub mod gls;
pub mod http;
pub mod ims;
pub mod setup;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use booking::*;
pub use df::*;
pub use gls::*;
pub use http::*;
pub use ims::*;
pub use setup::*;
