mod app;
mod audio;
mod cache;
mod catalogue;
mod config;
mod engine;
mod feed;
mod player;
mod prefs;
mod publisher;
mod runtime;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
