//! Output implementations

pub mod json;
pub mod multi;
pub mod queued;
pub mod text;

pub use json::{JsonOutput, JsonOutputFlags};
pub use multi::MultiOutput;
pub use queued::{QueueState, QueuedOutput};
pub use text::{TextOutput, TextOutputFlags};
