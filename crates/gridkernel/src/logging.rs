/// Installs a sensible default `env_logger` subscriber if one isn't
/// already installed. Safe to call more than once; only the first call
/// takes effect.
pub fn init_default_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}
