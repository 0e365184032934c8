//! Prelude module - common imports for pivot-report users
//!
//! ```rust
//! use pivot_report::prelude::*;
//! ```

pub use crate::{
    // Pipeline
    prepare,
    publish,
    run_report,
    CellAddress,
    // I/O types
    CsvReadOptions,
    CsvReader,
    CsvWriter,
    // Error types
    Error,
    MemorySink,
    PivotStrategy,
    ReportConfig,
    ReportOutcome,
    ReportSink,
    Result,
    RollupIndex,
    SinkCapabilities,
    // Data types
    Table,
    Value,
};
