//! Drop and recreate the staging, fact and dimension tables.

use songplays_dwh::{cli, pipeline};

fn main() {
    cli::launch("create-tables", pipeline::build_schema);
}
