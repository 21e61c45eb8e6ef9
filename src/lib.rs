//! Star-schema warehouse loader for song play logs.
//!
//! Three stages run serially on one connection: schema reset, bulk load of the
//! two staging tables, and the staging-to-warehouse transform.

pub mod cli;
pub mod config;
pub mod db {
    pub mod ddl;
    pub mod models;
}
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod services {
    pub mod bulk_load;
    pub mod report;
    pub mod schema_reset;
    pub mod transform;
}
pub mod utils;

pub use config::Config;
pub use error::{PipelineError, Stage};
