//! XML navigation helpers on top of `roxmltree`.

mod utils;

pub use utils::{child_text, find_by_path, find_child, find_children, get_text};
