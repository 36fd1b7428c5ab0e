pub mod exercises;
pub mod fasting;
pub mod health;
pub mod profile;
pub mod templates;
pub mod water;
pub mod workouts;
