pub mod fixed_parser;
pub mod variable_parser;
