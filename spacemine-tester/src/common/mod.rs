pub mod loader;
pub mod util;

pub use loader::TesterLoader;
pub use util::{parse_drone_mask, split_csv};
