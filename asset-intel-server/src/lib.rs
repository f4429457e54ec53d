mod http;
mod server;
mod settings;
mod worker;

pub use server::run;
pub use settings::Settings;
pub use worker::run_worker;
