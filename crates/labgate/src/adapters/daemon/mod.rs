pub mod usecase_container;

pub use usecase_container::{AdminUseCases, UseCaseContainer};
