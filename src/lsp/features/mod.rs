pub mod add_using;
pub mod auto_insert;
