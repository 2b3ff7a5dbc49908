mod response;

pub use response::{print_result, to_json_result};
