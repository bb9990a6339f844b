//! Small helpers shared by the staging, extraction and patching code.

pub mod fs;
pub mod path_validation;

pub use fs::{
    atomic_write, copy_dir, copy_path, ensure_dir, ensure_parent_dir, normalize_path,
    read_text_file, remove_path,
};
pub use path_validation::{is_within, resolve_under};
