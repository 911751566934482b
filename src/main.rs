use liftlog::{
    app,
    config::{AppConfig, LogConfig},
    AppState,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_new(&log.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        fmt.with_target(false).json().init();
    } else {
        fmt.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(&config.log);

    if !config.require_verified_login {
        tracing::warn!("unverified users may log in; set REQUIRE_VERIFIED_LOGIN=true to block them");
    }

    let state = AppState::init(&config).await?;
    app::serve(app::build_app(state), &config.server).await
}
