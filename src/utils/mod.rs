pub mod preview;
pub mod timing;

pub use self::preview::{format_head, format_tail, print_preview};
pub use self::timing::measure_time;
