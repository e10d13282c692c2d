mod app;
mod color;
mod data;
mod render;

use app::{IsothermApp, RunConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    IsothermApp::new(RunConfig::default()).run()
}
