pub mod error;
pub mod loaders;
pub mod pipeline;
pub mod quality;
pub mod report;
pub mod state;
pub mod time_parts;

pub use error::ExecutorError;
pub use loaders::{run_statement, SchemaManager, StageLoader, TransformLoader};
pub use pipeline::{connect, Pipeline};
pub use quality::{QualityChecker, QualityReport};
pub use report::{RunReport, StatementTiming};
pub use state::{RunState, RunStateMachine};
pub use time_parts::TimeParts;
