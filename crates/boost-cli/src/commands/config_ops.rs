use std::fs;
use std::process;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub fn config_export() {
    print!("{}", boost_core::config::default_toml());
}

pub fn config_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let c = die!(
        boost_core::config::parse_config_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: baseline={}, languages={}, boost.threshold={}, boost.alpha={}, boost.top_k={}",
        c.baseline,
        c.languages.len(),
        c.boost.threshold,
        c.boost.alpha,
        c.boost.top_k
    );
}
