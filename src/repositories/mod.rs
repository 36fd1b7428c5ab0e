pub mod exercise_repo;
pub mod fasting_repo;
pub mod ownership;
pub mod template_repo;
pub mod user_repo;
pub mod water_repo;
pub mod workout_repo;

#[cfg(test)]
pub(crate) mod test_support;

pub use exercise_repo::ExerciseRepository;
pub use fasting_repo::FastingRepository;
pub use template_repo::TemplateRepository;
pub use user_repo::UserRepository;
pub use water_repo::WaterRepository;
pub use workout_repo::WorkoutRepository;
