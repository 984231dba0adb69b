#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    match pugvm::Expr::parse(data) {
        Ok(expr) => {
            let _ = expr.to_string();
        }
        Err(err) => {
            let _ = format!("{err:#}");
        }
    }
});
