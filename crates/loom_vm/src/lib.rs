pub mod error;
pub mod frame;
pub mod run;
pub mod vm;

pub use error::{VmError, VmResult};
pub use frame::Frame;
pub use run::{run_source, RunError, RunResult};
pub use vm::{Vm, GLOBALS_SIZE, MAX_FRAMES, STACK_SIZE};
