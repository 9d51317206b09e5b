pub mod dynamo;
pub mod memory;
pub mod models;
pub mod repository;

pub use dynamo::{DynamoTodoRepository, DynamoTodoConfig};
pub use memory::MemoryTodoRepository;
pub use repository::{StoreError, TodoRepository};
