mod summary;

pub use summary::{render_household, render_step};
