pub mod approval_repository;
pub mod audit_repository;
pub mod enrollment_repository;
pub mod notification_repository;
pub mod principal_repository;
pub mod token_repository;
pub mod tracker_repository;
pub mod training_repository;

#[cfg(test)]
pub mod test_utils;

pub use approval_repository::ApprovalRepositoryImpl;
pub use audit_repository::AuditRepositoryImpl;
pub use enrollment_repository::EnrollmentRepositoryImpl;
pub use notification_repository::NotificationRepositoryImpl;
pub use principal_repository::PrincipalRepositoryImpl;
pub use token_repository::TokenRepositoryImpl;
pub use tracker_repository::TrackerRepositoryImpl;
pub use training_repository::TrainingRepositoryImpl;
