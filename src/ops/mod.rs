pub mod stats;
pub mod todo_ops;
