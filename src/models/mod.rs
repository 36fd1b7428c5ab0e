pub mod exercise;
pub mod fasting;
pub mod from_row;
pub mod serde_helpers;
pub mod template;
pub mod user;
pub mod water;
pub mod workout_session;

pub use exercise::{CreateExercise, Exercise, ExerciseFilter, UpdateExercise};
pub use fasting::{EndFast, FastSession, FastStatus, FastType, RecordFast, StartFast};
pub use from_row::FromSqliteRow;
pub use template::{
    AddTemplateExercise, CreateTemplate, DuplicateTemplate, TemplateExercise, TemplateFilter,
    TemplateWithExercises, UpdateTemplate, UpdateTemplateExercise, WorkoutTemplate,
};
pub use user::{UpdateProfile, UpdateSettings, User};
pub use water::{LogWater, WaterLog, WaterQuery};
pub use workout_session::{
    AddSessionExercise, ExerciseSet, HistoryQuery, LogSet, SessionExercise, StartWorkout,
    StatsQuery, UpdateSessionExercise, UpdateSet, UpdateWorkout, WorkoutSession, WorkoutStats,
    WorkoutWithDetails,
};
