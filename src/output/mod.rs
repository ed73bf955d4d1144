pub mod formatter;

pub use formatter::{
    build_response, format_report, format_tokens, group_thousands, should_use_colors,
    summary_line, AllocationBody, CheckWalletResponse, Labels, StatsBody,
};
