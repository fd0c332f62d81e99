// Classification — trait-based adapters over the two inference models plus
// the mode-dispatching orchestrator.
//
// The adapters own the ONNX sessions; the orchestrator owns the merge logic.
// Nothing outside this module touches ort directly.

pub mod binary;
pub mod orchestrator;
pub mod traits;
pub mod zero_shot;

pub use orchestrator::{ClassificationResult, Orchestrator, CATEGORIES};
