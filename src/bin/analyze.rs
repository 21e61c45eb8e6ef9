//! Report row counts, schema and analytic answers for a loaded warehouse.

use songplays_dwh::{cli, pipeline};

fn main() {
    cli::launch("analyze", pipeline::analyze);
}
