pub mod habit_service;
pub mod task_service;

mod habit_service_tests;
