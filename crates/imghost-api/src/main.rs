use imghost_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router) = imghost_api::setup::initialize_app(config.clone()).await?;

    imghost_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
