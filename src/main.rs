use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fitlog::auth::StaticTokenVerifier;
use fitlog::config::Config;
use fitlog::handlers::{exercises, fasting, profile, templates, water, workouts};
use fitlog::middleware::AuthState;
use fitlog::repositories::{
    ExerciseRepository, FastingRepository, TemplateRepository, UserRepository, WaterRepository,
    WorkoutRepository,
};
use fitlog::routes::{self, AppStates};
use fitlog::{db, migrations, version};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitlog=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing::info!(
        "fitlog {} connecting to database: {}",
        version::GIT_VERSION,
        config.database_url
    );

    let pool = db::create_pool(&config.database_url)?;
    migrations::run_migrations(&pool)?;

    // Create repositories
    let user_repo = UserRepository::new(pool.clone());
    let exercise_repo = ExerciseRepository::new(pool.clone());
    let template_repo = TemplateRepository::new(pool.clone());
    let workout_repo = WorkoutRepository::new(pool.clone());
    let fasting_repo = FastingRepository::new(pool.clone());
    let water_repo = WaterRepository::new(pool.clone());

    if config.seed_defaults {
        let exercises = exercise_repo.seed_defaults().await?;
        let fast_types = fasting_repo.seed_default_types().await?;
        tracing::info!(
            "Seeded {} exercises and {} fast types",
            exercises,
            fast_types
        );
    }

    let verifier = StaticTokenVerifier::new(config.auth_tokens.clone());
    if verifier.is_empty() {
        tracing::warn!("AUTH_TOKENS is empty; every authenticated route will return 401");
    }

    let auth_state = AuthState {
        verifier: Arc::new(verifier),
        user_repo: user_repo.clone(),
    };
    let states = AppStates {
        profile: profile::ProfileState { user_repo },
        exercises: exercises::ExercisesState { exercise_repo },
        templates: templates::TemplatesState { template_repo },
        workouts: workouts::WorkoutsState { workout_repo },
        fasting: fasting::FastingState { fasting_repo },
        water: water::WaterState { water_repo },
    };

    let app = routes::create_router(auth_state, states);

    let addr = config.server_addr();
    tracing::info!("Starting server at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
