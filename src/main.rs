mod app;
mod audio;
mod catalog;
mod config;
mod http;
mod mpris;
mod profile;
mod runtime;
mod session;
mod ui;

fn main() -> anyhow::Result<()> {
    runtime::run()
}
