pub const VERSION: &str = match option_env!("HOMEDASH_VERSION") {
    Some(val) => val,
    None => env!("CARGO_PKG_VERSION"),
};
