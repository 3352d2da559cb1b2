pub mod bucket;
pub mod hit;

pub use bucket::{
    add_container, fragment_codes, positions, render_solution_bucket, render_source_bucket,
    setup_widget, teardown_widget,
};
pub use hit::{DropTarget, fragment_of, resolve_target};
