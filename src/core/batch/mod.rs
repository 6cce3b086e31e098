pub mod batch_models;
pub mod batch_processor;
pub mod orchestrator;

pub use batch_models::BatchSettings;
pub use batch_processor::SheetBatchProcessor;
pub use orchestrator::Orchestrator;
