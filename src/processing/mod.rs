pub mod ingress;
pub mod preprocess;
pub mod retention;
pub mod storage;

pub use ingress::*;
pub use preprocess::*;
pub use retention::*;
pub use storage::*;
