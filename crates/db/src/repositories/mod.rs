pub mod character_repo;
pub mod memory_repo;
