pub mod aggregate;
pub mod exec;
pub mod index;
pub mod magnitude;
pub mod output;

pub use aggregate::{Aggregate, PeriodStats};
pub use exec::exec;
pub use index::CommitIndex;
pub use magnitude::{hex, ColorRamp, MagnitudeModel, Normalization, DEFAULT_SCALE};
pub use output::{build_report, load_template, output_json, output_summary, render_html, write_html};
