//! Load the staging tables from S3 and populate the star schema.

use songplays_dwh::{cli, pipeline};

fn main() {
    cli::launch("etl", pipeline::run_etl);
}
