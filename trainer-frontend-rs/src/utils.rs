pub fn set_panic_hook() {
    // Panics in the browser otherwise only show up as "unreachable executed".
    // https://github.com/rustwasm/console_error_panic_hook#readme
    #[cfg(all(target_arch = "wasm32", feature = "console_error_panic_hook"))]
    console_error_panic_hook::set_once();
}
