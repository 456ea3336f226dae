mod certificate;
mod common;
mod context;
mod identity;
mod session;
mod signature;

pub use certificate::*;
pub use common::*;
pub use context::*;
pub use identity::*;
pub use session::*;
pub use signature::*;
